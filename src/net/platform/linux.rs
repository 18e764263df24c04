//! Linux.

use super::{portable, Capability, Platform, Sockopt};
use crate::net::TcpOption;

/// Linux-style provider. Everything is supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linux;

impl Platform for Linux {
    const NAME: &'static str = "linux";

    fn capability(option: TcpOption) -> Capability {
        use TcpOption::*;

        if portable(option) {
            return Capability::Portable;
        }

        let opt = match option {
            LingerTimeout => Sockopt::tcp(libc::TCP_LINGER2, "TCP_LINGER2"),
            KeepAliveIdle => Sockopt::tcp(libc::TCP_KEEPIDLE, "TCP_KEEPIDLE"),
            KeepAliveInterval => Sockopt::tcp(libc::TCP_KEEPINTVL, "TCP_KEEPINTVL"),
            KeepAliveProbes => Sockopt::tcp(libc::TCP_KEEPCNT, "TCP_KEEPCNT"),
            FastOpen => Sockopt::tcp(libc::TCP_FASTOPEN, "TCP_FASTOPEN"),
            FastOpenConnect => Sockopt::tcp(libc::TCP_FASTOPEN_CONNECT, "TCP_FASTOPEN_CONNECT"),
            QuickAck => Sockopt::tcp(libc::TCP_QUICKACK, "TCP_QUICKACK"),
            DeferAccept => Sockopt::tcp(libc::TCP_DEFER_ACCEPT, "TCP_DEFER_ACCEPT"),
            ReuseAddr => Sockopt {
                level: libc::SOL_SOCKET,
                name: libc::SO_REUSEADDR,
                label: "SO_REUSEADDR",
            },
            ReusePort => Sockopt {
                level: libc::SOL_SOCKET,
                name: libc::SO_REUSEPORT,
                label: "SO_REUSEPORT",
            },
            _ => return Capability::Unsupported,
        };

        Capability::Native(opt)
    }
}
