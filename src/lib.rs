//! Portable TCP socket tuning.
//!
//! One API for linger, buffer sizes, keep-alive timers, TCP Fast Open,
//! quick-ACK, defer-accept and address/port reuse on operating systems
//! that spell these differently, or not at all.
//!
//! ```no_run
//! use std::net::TcpStream;
//! use std::time::Duration;
//!
//! use tcpopt::net::{self, Options};
//!
//! let conn = TcpStream::connect("127.0.0.1:6432")?;
//! net::set(
//!     &conn,
//!     &Options {
//!         nodelay: true,
//!         keepalive: true,
//!         keepalive_idle: Duration::from_secs(60),
//!         ..Default::default()
//!     },
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(not(unix))]
compile_error!("tcpopt only supports unix targets");

pub mod cli;
pub mod config;
pub mod net;
pub mod util;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use std::io::IsTerminal;

/// Setup the logger, so `info!`, `debug!`
/// and other macros actually output something.
///
/// Logs go to stderr, stdout is for command output.
/// Using try_init and ignoring errors to allow
/// for use in tests (setting up multiple times).
pub fn logger() {
    let format = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_file(false);
    #[cfg(not(debug_assertions))]
    let format = format.with_target(false);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init();
}
