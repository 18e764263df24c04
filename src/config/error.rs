//! Configuration errors.

use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}, line {1}")]
    Syntax(String, usize),

    #[error("invalid address \"{0}\"")]
    Address(String),
}

impl Error {
    /// Point at the line of `source` the parser choked on.
    pub fn config(source: &str, err: toml::de::Error) -> Self {
        let message = err.message().trim().to_owned();

        match err.span() {
            Some(span) => {
                let line = source
                    .char_indices()
                    .take_while(|(i, _)| *i < span.start)
                    .filter(|(_, c)| *c == '\n')
                    .count()
                    + 1;
                Self::Syntax(message, line)
            }
            None => Self::Syntax(message, 0),
        }
    }
}
