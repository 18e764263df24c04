//! Scoped access to a connection's descriptor.
//!
//! Tuning calls accept anything implementing [`Connection`]. Only TCP sockets
//! hand out a descriptor; every other connection kind makes the call a
//! successful no-op, so callers holding a mix of connections don't need to
//! check what they have first.

use std::os::fd::{AsFd, BorrowedFd};

use socket2::{SockRef, Type};
#[cfg(target_os = "linux")]
use socket2::Protocol;
use tracing::trace;

use super::Error;

/// A connection that might be a TCP socket.
pub trait Connection {
    /// Borrow the descriptor, if this is a TCP socket.
    fn tcp(&self) -> Option<BorrowedFd<'_>> {
        None
    }
}

macro_rules! tcp {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Connection for $ty {
                fn tcp(&self) -> Option<BorrowedFd<'_>> {
                    Some(self.as_fd())
                }
            }
        )*
    };
}

macro_rules! not_tcp {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Connection for $ty {}
        )*
    };
}

tcp!(
    std::net::TcpStream,
    std::net::TcpListener,
    tokio::net::TcpStream,
    tokio::net::TcpListener,
    tokio::net::TcpSocket,
    // Not connected yet, so options like reuse-port can go in before bind(2).
    socket2::Socket,
);

not_tcp!(
    std::net::UdpSocket,
    std::os::unix::net::UnixStream,
    std::os::unix::net::UnixListener,
    tokio::net::UdpSocket,
    tokio::net::UnixStream,
    tokio::net::UnixListener,
);

impl<T: Connection + ?Sized> Connection for &T {
    fn tcp(&self) -> Option<BorrowedFd<'_>> {
        (**self).tcp()
    }
}

impl<T: Connection + ?Sized> Connection for Box<T> {
    fn tcp(&self) -> Option<BorrowedFd<'_>> {
        (**self).tcp()
    }
}

/// Run `f` once against the descriptor of `conn`.
///
/// Returns `Ok(None)` without calling `f` if `conn` isn't a TCP socket. The
/// descriptor is only borrowed for the duration of `f`. Failing to inspect the
/// descriptor is an [`Error::Access`]; errors returned by `f` are passed through.
pub fn control<C, F, T>(conn: &C, f: F) -> Result<Option<T>, Error>
where
    C: Connection + ?Sized,
    F: FnOnce(SockRef<'_>) -> Result<T, Error>,
{
    let fd = match conn.tcp() {
        Some(fd) => fd,
        None => {
            trace!("not a TCP connection, skipping");
            return Ok(None);
        }
    };

    let sock = SockRef::from(&fd);
    if !is_tcp(&sock)? {
        trace!("descriptor is not a TCP socket, skipping");
        return Ok(None);
    }

    f(sock).map(Some)
}

fn is_tcp(sock: &SockRef<'_>) -> Result<bool, Error> {
    let stream = sock.r#type().map_err(Error::Access)? == Type::STREAM;
    let inet = sock.local_addr().map_err(Error::Access)?.as_socket().is_some();
    Ok(stream && inet && tcp_protocol(sock)?)
}

/// Inet stream sockets can also be SCTP or MPTCP.
#[cfg(target_os = "linux")]
fn tcp_protocol(sock: &SockRef<'_>) -> Result<bool, Error> {
    let protocol = sock.protocol().map_err(Error::Access)?;
    Ok(protocol.map_or(true, |protocol| protocol == Protocol::TCP))
}

#[cfg(not(target_os = "linux"))]
fn tcp_protocol(_sock: &SockRef<'_>) -> Result<bool, Error> {
    Ok(true)
}
