//! Logical TCP options and the batch configuration record.

use std::fmt::Display;
use std::time::Duration;

/// A tunable, independent of how the running OS spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpOption {
    /// `SO_LINGER`.
    Linger,
    /// How long an orphaned connection stays in `FIN_WAIT2`.
    LingerTimeout,
    ReadBuffer,
    WriteBuffer,
    NoDelay,
    KeepAlive,
    KeepAliveIdle,
    KeepAliveInterval,
    KeepAliveProbes,
    /// Fast Open queue length on a listener.
    FastOpen,
    /// Fast Open on the connecting side.
    FastOpenConnect,
    QuickAck,
    DeferAccept,
    ReuseAddr,
    ReusePort,
}

impl TcpOption {
    /// Every option, in the order a batch applies them.
    pub const ALL: [TcpOption; 15] = [
        TcpOption::Linger,
        TcpOption::LingerTimeout,
        TcpOption::ReadBuffer,
        TcpOption::WriteBuffer,
        TcpOption::NoDelay,
        TcpOption::KeepAlive,
        TcpOption::KeepAliveIdle,
        TcpOption::KeepAliveInterval,
        TcpOption::KeepAliveProbes,
        TcpOption::FastOpen,
        TcpOption::FastOpenConnect,
        TcpOption::QuickAck,
        TcpOption::DeferAccept,
        TcpOption::ReuseAddr,
        TcpOption::ReusePort,
    ];

    pub fn name(&self) -> &'static str {
        use TcpOption::*;
        match self {
            Linger => "linger",
            LingerTimeout => "linger_timeout",
            ReadBuffer => "read_buffer",
            WriteBuffer => "write_buffer",
            NoDelay => "nodelay",
            KeepAlive => "keepalive",
            KeepAliveIdle => "keepalive_idle",
            KeepAliveInterval => "keepalive_interval",
            KeepAliveProbes => "keepalive_probes",
            FastOpen => "fast_open",
            FastOpenConnect => "fast_open_connect",
            QuickAck => "quick_ack",
            DeferAccept => "defer_accept",
            ReuseAddr => "reuse_addr",
            ReusePort => "reuse_port",
        }
    }
}

impl Display for TcpOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One option together with the value to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// `None` turns lingering off, `Some(0s)` resets the connection on close.
    Linger(Option<Duration>),
    LingerTimeout(Duration),
    ReadBuffer(usize),
    WriteBuffer(usize),
    NoDelay(bool),
    KeepAlive(bool),
    KeepAliveIdle(Duration),
    KeepAliveInterval(Duration),
    KeepAliveProbes(u32),
    FastOpen(u32),
    FastOpenConnect(u32),
    QuickAck(bool),
    DeferAccept(bool),
    ReuseAddr(bool),
    ReusePort(bool),
}

impl Setting {
    /// The option this setting changes.
    pub fn option(&self) -> TcpOption {
        match self {
            Setting::Linger(_) => TcpOption::Linger,
            Setting::LingerTimeout(_) => TcpOption::LingerTimeout,
            Setting::ReadBuffer(_) => TcpOption::ReadBuffer,
            Setting::WriteBuffer(_) => TcpOption::WriteBuffer,
            Setting::NoDelay(_) => TcpOption::NoDelay,
            Setting::KeepAlive(_) => TcpOption::KeepAlive,
            Setting::KeepAliveIdle(_) => TcpOption::KeepAliveIdle,
            Setting::KeepAliveInterval(_) => TcpOption::KeepAliveInterval,
            Setting::KeepAliveProbes(_) => TcpOption::KeepAliveProbes,
            Setting::FastOpen(_) => TcpOption::FastOpen,
            Setting::FastOpenConnect(_) => TcpOption::FastOpenConnect,
            Setting::QuickAck(_) => TcpOption::QuickAck,
            Setting::DeferAccept(_) => TcpOption::DeferAccept,
            Setting::ReuseAddr(_) => TcpOption::ReuseAddr,
            Setting::ReusePort(_) => TcpOption::ReusePort,
        }
    }
}

/// Batch configuration.
///
/// Zero durations and counts mean "leave alone". Booleans are
/// always applied, except `no_linger` which only does something when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Reset the connection on close instead of draining it.
    /// Makes `linger_timeout` redundant.
    pub no_linger: bool,
    pub linger_timeout: Duration,
    pub read_buffer: usize,
    pub write_buffer: usize,
    pub nodelay: bool,
    pub keepalive: bool,
    /// Only used if `keepalive` is enabled.
    pub keepalive_idle: Duration,
    /// Only used if `keepalive` is enabled.
    pub keepalive_interval: Duration,
    /// Only used if `keepalive` is enabled.
    pub keepalive_probes: u32,
    pub fast_open: u32,
    pub fast_open_connect: u32,
    pub quick_ack: bool,
    pub defer_accept: bool,
    pub reuse_addr: bool,
    pub reuse_port: bool,
}

impl Options {
    /// Settings this record expands to, in the order they're applied.
    pub fn settings(&self) -> Vec<Setting> {
        let mut settings = vec![];

        if self.no_linger {
            settings.push(Setting::Linger(Some(Duration::ZERO)));
        } else if !self.linger_timeout.is_zero() {
            settings.push(Setting::LingerTimeout(self.linger_timeout));
        }

        if self.read_buffer > 0 {
            settings.push(Setting::ReadBuffer(self.read_buffer));
        }
        if self.write_buffer > 0 {
            settings.push(Setting::WriteBuffer(self.write_buffer));
        }

        settings.push(Setting::NoDelay(self.nodelay));
        settings.push(Setting::KeepAlive(self.keepalive));

        if self.keepalive {
            if !self.keepalive_idle.is_zero() {
                settings.push(Setting::KeepAliveIdle(self.keepalive_idle));
            }
            if !self.keepalive_interval.is_zero() {
                settings.push(Setting::KeepAliveInterval(self.keepalive_interval));
            }
            if self.keepalive_probes > 0 {
                settings.push(Setting::KeepAliveProbes(self.keepalive_probes));
            }
        }

        if self.fast_open > 0 {
            settings.push(Setting::FastOpen(self.fast_open));
        }
        if self.fast_open_connect > 0 {
            settings.push(Setting::FastOpenConnect(self.fast_open_connect));
        }

        settings.push(Setting::QuickAck(self.quick_ack));
        settings.push(Setting::DeferAccept(self.defer_accept));
        settings.push(Setting::ReuseAddr(self.reuse_addr));
        settings.push(Setting::ReusePort(self.reuse_port));

        settings
    }
}
