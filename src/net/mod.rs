pub mod connection;
pub mod error;
pub mod options;
pub mod platform;
pub mod sockopt;
pub mod tweaks;

#[cfg(test)]
mod test;

pub use connection::{control, Connection};
pub use error::Error;
pub use options::{Options, Setting, TcpOption};
pub use platform::{Capability, Native, Platform};
pub use tweaks::*;
