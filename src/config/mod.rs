//! Configuration.

pub mod error;
pub mod overrides;

pub use error::Error;
pub use overrides::Overrides;

use std::fmt::Display;
use std::fs::read_to_string;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::net::Options;
use crate::util::human_duration;

static CONFIG: Lazy<ArcSwap<Config>> = Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// Current configuration.
pub fn config() -> Arc<Config> {
    CONFIG.load().clone()
}

/// Load the configuration file from disk.
pub fn load(path: &Path) -> Result<Config, Error> {
    let config = Config::load(path)?;
    CONFIG.store(Arc::new(config.clone()));
    Ok(config)
}

/// Override some settings.
pub fn overrides(overrides: Overrides) {
    let mut config = (*config()).clone();
    let Overrides {
        no_linger,
        nodelay,
        keepalive_idle,
    } = overrides;

    if let Some(no_linger) = no_linger {
        config.tcp.no_linger = no_linger;
    }

    if let Some(nodelay) = nodelay {
        config.tcp.nodelay = nodelay;
    }

    if let Some(keepalive_idle) = keepalive_idle {
        config.tcp.keepalive = true;
        config.tcp.keepalive_idle = keepalive_idle;
    }

    CONFIG.store(Arc::new(config));
}

/// tcpopt.toml
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    /// Applied to the listening socket, before bind(2).
    #[serde(default = "Tcp::listener")]
    pub listener: Tcp,
    /// Applied to every connection.
    #[serde(default)]
    pub tcp: Tcp,
    /// Where this was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: General::default(),
            listener: Tcp::listener(),
            tcp: Tcp::default(),
            path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load configuration from disk or use defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut config: Config = if let Ok(source) = read_to_string(path) {
            let config = match toml::from_str(&source) {
                Ok(config) => config,
                Err(err) => return Err(Error::config(&source, err)),
            };
            info!("loaded \"{}\"", path.display());
            config
        } else {
            warn!(
                "\"{}\" doesn't exist, loading defaults instead",
                path.display()
            );
            Config::default()
        };

        config.path = path.to_owned();
        config.check();

        Ok(config)
    }

    /// Warn about settings that won't do what they look like.
    pub fn check(&self) {
        if self.tcp.no_linger && self.tcp.linger_timeout > 0 {
            warn!("tcp.linger_timeout is ignored because tcp.no_linger is set");
        }

        if !self.tcp.keepalive
            && (self.tcp.keepalive_idle > 0
                || self.tcp.keepalive_interval > 0
                || self.tcp.keepalive_probes > 0)
        {
            warn!("tcp keep-alive timers are ignored because tcp.keepalive is off");
        }

        if self.tcp.fast_open > 0 {
            warn!("tcp.fast_open only works on listeners, use listener.fast_open instead");
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Listen on / connect to this address.
    #[serde(default = "General::host")]
    pub host: String,
    /// Listen on / connect to this port.
    #[serde(default = "General::port")]
    pub port: u16,
    /// Listen backlog.
    #[serde(default = "General::backlog")]
    pub backlog: i32,
    /// Runtime worker threads, 0 runs everything on the main thread.
    #[serde(default)]
    pub workers: usize,
}

impl Default for General {
    fn default() -> Self {
        Self {
            host: Self::host(),
            port: Self::port(),
            backlog: Self::backlog(),
            workers: 0,
        }
    }
}

impl General {
    fn host() -> String {
        "127.0.0.1".into()
    }

    fn port() -> u16 {
        9000
    }

    fn backlog() -> i32 {
        1024
    }

    /// Resolve host and port.
    pub fn addr(&self) -> Result<SocketAddr, Error> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.to_socket_addrs()?
            .next()
            .ok_or(Error::Address(addr))
    }
}

/// TCP options. Durations are in milliseconds,
/// zero means "leave the OS default alone".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Tcp {
    pub no_linger: bool,
    pub linger_timeout: u64,
    pub read_buffer: usize,
    pub write_buffer: usize,
    pub nodelay: bool,
    pub keepalive: bool,
    pub keepalive_idle: u64,
    pub keepalive_interval: u64,
    pub keepalive_probes: u32,
    pub fast_open: u32,
    pub fast_open_connect: u32,
    pub quick_ack: bool,
    pub defer_accept: bool,
    pub reuse_addr: bool,
    pub reuse_port: bool,
}

impl Tcp {
    /// Listener defaults.
    fn listener() -> Self {
        Self {
            reuse_addr: true,
            ..Default::default()
        }
    }

    pub fn linger_timeout(&self) -> Duration {
        Duration::from_millis(self.linger_timeout)
    }

    pub fn keepalive_idle(&self) -> Duration {
        Duration::from_millis(self.keepalive_idle)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval)
    }

    /// Socket options.
    pub fn options(&self) -> Options {
        Options::from(self)
    }
}

impl From<&Tcp> for Options {
    fn from(tcp: &Tcp) -> Self {
        Options {
            no_linger: tcp.no_linger,
            linger_timeout: tcp.linger_timeout(),
            read_buffer: tcp.read_buffer,
            write_buffer: tcp.write_buffer,
            nodelay: tcp.nodelay,
            keepalive: tcp.keepalive,
            keepalive_idle: tcp.keepalive_idle(),
            keepalive_interval: tcp.keepalive_interval(),
            keepalive_probes: tcp.keepalive_probes,
            fast_open: tcp.fast_open,
            fast_open_connect: tcp.fast_open_connect,
            quick_ack: tcp.quick_ack,
            defer_accept: tcp.defer_accept,
            reuse_addr: tcp.reuse_addr,
            reuse_port: tcp.reuse_port,
        }
    }
}

impl Display for Tcp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no_linger={} linger_timeout={} nodelay={} keepalive={} idle={} interval={} probes={}",
            self.no_linger,
            human_duration(self.linger_timeout()),
            self.nodelay,
            self.keepalive,
            human_duration(self.keepalive_idle()),
            human_duration(self.keepalive_interval()),
            self.keepalive_probes,
        )
    }
}
