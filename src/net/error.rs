//! Socket tuning errors.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The kernel rejected the option, e.g. `setsockopt(TCP_KEEPIDLE)`.
    #[error("{call}({option}): {source}")]
    Syscall {
        call: &'static str,
        option: &'static str,
        #[source]
        source: io::Error,
    },

    /// The descriptor couldn't be inspected, e.g. it's already closed.
    #[error("descriptor access: {0}")]
    Access(#[source] io::Error),
}

impl Error {
    pub(crate) fn syscall(call: &'static str, option: &'static str, source: io::Error) -> Self {
        Self::Syscall {
            call,
            option,
            source,
        }
    }

    /// Kernel name of the option that failed, e.g. `TCP_KEEPIDLE`.
    pub fn option(&self) -> Option<&'static str> {
        match self {
            Self::Syscall { option, .. } => Some(option),
            Self::Access(_) => None,
        }
    }

    /// Underlying OS error code.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Syscall { source, .. } => source.raw_os_error(),
            Self::Access(source) => source.raw_os_error(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Syscall { source, .. } => source.kind(),
            Error::Access(source) => source.kind(),
        };

        match err {
            Error::Access(source) => source,
            err => io::Error::new(kind, err),
        }
    }
}
