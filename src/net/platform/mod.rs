//! Per-OS socket option tables.
//!
//! Each provider maps a [`TcpOption`] to the `(level, name)` pair its kernel
//! expects. Options the OS doesn't have are [`Capability::Unsupported`] and
//! setting them does nothing. Options every OS spells the same way are
//! [`Capability::Portable`] and go through `socket2` instead of the table.

pub mod darwin;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod unsupported;

pub use darwin::Darwin;
#[cfg(target_os = "linux")]
pub use linux::Linux;
pub use unsupported::Unsupported;

use std::fmt::Display;

use libc::c_int;

use super::TcpOption;

/// Provider for the running OS.
#[cfg(target_os = "linux")]
pub type Native = Linux;
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub type Native = Darwin;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios")))]
pub type Native = Unsupported;

/// Kernel spelling of one option. The value is always a C `int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sockopt {
    pub level: c_int,
    pub name: c_int,
    /// Header name, used in errors and the capability listing.
    pub label: &'static str,
}

impl Sockopt {
    pub const fn tcp(name: c_int, label: &'static str) -> Self {
        Self {
            level: libc::IPPROTO_TCP,
            name,
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Set through the table.
    Native(Sockopt),
    /// Same on every OS, handled by `socket2`.
    Portable,
    /// Not available, setting it is a no-op.
    Unsupported,
}

impl Capability {
    pub fn supported(&self) -> bool {
        !matches!(self, Capability::Unsupported)
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Native(opt) => write!(
                f,
                "{} (level={:#x}, name={:#x})",
                opt.label, opt.level, opt.name
            ),
            Capability::Portable => write!(f, "portable"),
            Capability::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// A platform capability provider.
pub trait Platform {
    /// OS family name.
    const NAME: &'static str;

    /// How this OS sets `option`.
    fn capability(option: TcpOption) -> Capability;
}

/// Options that don't need a table lookup.
pub(crate) fn portable(option: TcpOption) -> bool {
    matches!(
        option,
        TcpOption::Linger
            | TcpOption::ReadBuffer
            | TcpOption::WriteBuffer
            | TcpOption::NoDelay
            | TcpOption::KeepAlive
    )
}

/// Every option with its capability on `P`.
pub fn table<P: Platform>() -> Vec<(TcpOption, Capability)> {
    TcpOption::ALL
        .iter()
        .map(|option| (*option, P::capability(*option)))
        .collect()
}
