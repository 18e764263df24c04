//! macOS and iOS.
//!
//! Constants are spelled out so the table can be checked on any host.

use libc::c_int;

use super::{portable, Capability, Platform, Sockopt};
use crate::net::TcpOption;

// sys/socket.h
pub const SOL_SOCKET: c_int = 0xffff;
pub const SO_REUSEADDR: c_int = 0x0004;
pub const SO_REUSEPORT: c_int = 0x0200;

// netinet/tcp.h
pub const TCP_KEEPALIVE: c_int = 0x10;
pub const TCP_KEEPINTVL: c_int = 0x101;
pub const TCP_KEEPCNT: c_int = 0x102;
pub const TCP_FASTOPEN: c_int = 0x105;

/// BSD-style provider.
///
/// There is no `TCP_LINGER2`, `TCP_QUICKACK` or `TCP_DEFER_ACCEPT`. Client side
/// Fast Open goes through `connectx(2)` rather than a socket option, so
/// [`TcpOption::FastOpenConnect`] is unsupported on every release.
#[derive(Debug, Clone, Copy, Default)]
pub struct Darwin;

impl Platform for Darwin {
    const NAME: &'static str = "darwin";

    fn capability(option: TcpOption) -> Capability {
        use TcpOption::*;

        if portable(option) {
            return Capability::Portable;
        }

        match option {
            KeepAliveIdle => Capability::Native(Sockopt::tcp(TCP_KEEPALIVE, "TCP_KEEPALIVE")),
            KeepAliveInterval => Capability::Native(Sockopt::tcp(TCP_KEEPINTVL, "TCP_KEEPINTVL")),
            KeepAliveProbes => Capability::Native(Sockopt::tcp(TCP_KEEPCNT, "TCP_KEEPCNT")),
            FastOpen => Capability::Native(Sockopt::tcp(TCP_FASTOPEN, "TCP_FASTOPEN")),
            ReuseAddr => Capability::Native(Sockopt {
                level: SOL_SOCKET,
                name: SO_REUSEADDR,
                label: "SO_REUSEADDR",
            }),
            ReusePort => Capability::Native(Sockopt {
                level: SOL_SOCKET,
                name: SO_REUSEPORT,
                label: "SO_REUSEPORT",
            }),
            _ => Capability::Unsupported,
        }
    }
}
