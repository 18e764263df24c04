//! TCP tuning.
//!
//! Every function takes a [`Connection`] and is a no-op for anything
//! that isn't a TCP socket. Options the running OS doesn't have are
//! no-ops too, see [`platform`](super::platform).

use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use libc::c_int;
use socket2::SockRef;
use tracing::{debug, trace};

use super::connection::{control, Connection};
use super::platform::{Capability, Native, Platform};
use super::{sockopt, Error, Options, Setting, TcpOption};
use crate::util::{int_bool, int_count, int_second};

/// Reset the connection on close instead of draining it.
/// Does nothing if `enable` is false.
pub fn set_no_linger<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    if enable {
        apply(conn, Setting::Linger(Some(Duration::ZERO)))
    } else {
        Ok(())
    }
}

/// Linger on close for `duration`, in whole seconds.
/// Zero resets the connection on close, see [`set_no_linger`].
pub fn set_linger<C: Connection + ?Sized>(conn: &C, duration: Duration) -> Result<(), Error> {
    if duration.is_zero() {
        set_no_linger(conn, true)
    } else {
        apply(conn, Setting::Linger(Some(duration)))
    }
}

/// How long an orphaned connection waits in `FIN_WAIT2`.
pub fn set_linger_timeout<C: Connection + ?Sized>(
    conn: &C,
    duration: Duration,
) -> Result<(), Error> {
    apply(conn, Setting::LingerTimeout(duration))
}

pub fn set_read_buffer<C: Connection + ?Sized>(conn: &C, bytes: usize) -> Result<(), Error> {
    apply(conn, Setting::ReadBuffer(bytes))
}

pub fn set_write_buffer<C: Connection + ?Sized>(conn: &C, bytes: usize) -> Result<(), Error> {
    apply(conn, Setting::WriteBuffer(bytes))
}

/// Disable the Nagle algorithm.
pub fn set_nodelay<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::NoDelay(enable))
}

pub fn set_keepalive<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::KeepAlive(enable))
}

/// Turn keep-alive on or off. When turning it on, also set the timers;
/// zero values leave the OS defaults alone.
pub fn keepalive<C: Connection + ?Sized>(
    conn: &C,
    enable: bool,
    idle: Duration,
    interval: Duration,
    probes: u32,
) -> Result<(), Error> {
    let options = Options {
        keepalive: enable,
        keepalive_idle: idle,
        keepalive_interval: interval,
        keepalive_probes: probes,
        ..Default::default()
    };

    let settings = options
        .settings()
        .into_iter()
        .filter(|setting| {
            matches!(
                setting,
                Setting::KeepAlive(_)
                    | Setting::KeepAliveIdle(_)
                    | Setting::KeepAliveInterval(_)
                    | Setting::KeepAliveProbes(_)
            )
        })
        .collect::<Vec<_>>();

    apply_all::<Native, C>(conn, &settings)
}

/// Enable keep-alive and wait `duration` before the first probe.
pub fn set_keepalive_time<C: Connection + ?Sized>(
    conn: &C,
    duration: Duration,
) -> Result<(), Error> {
    apply_all::<Native, C>(
        conn,
        &[Setting::KeepAlive(true), Setting::KeepAliveIdle(duration)],
    )
}

/// Enable keep-alive and wait `duration` between probes.
pub fn set_keepalive_interval<C: Connection + ?Sized>(
    conn: &C,
    duration: Duration,
) -> Result<(), Error> {
    apply_all::<Native, C>(
        conn,
        &[Setting::KeepAlive(true), Setting::KeepAliveInterval(duration)],
    )
}

/// Enable keep-alive and drop the connection after `count` unanswered probes.
pub fn set_keepalive_probes<C: Connection + ?Sized>(conn: &C, count: u32) -> Result<(), Error> {
    apply_all::<Native, C>(
        conn,
        &[Setting::KeepAlive(true), Setting::KeepAliveProbes(count)],
    )
}

/// Fast Open queue length. Call on a listener before `listen(2)`.
pub fn set_fast_open<C: Connection + ?Sized>(conn: &C, queue: u32) -> Result<(), Error> {
    apply(conn, Setting::FastOpen(queue))
}

/// Fast Open on the connecting side. Call before `connect(2)`.
pub fn set_fast_open_connect<C: Connection + ?Sized>(conn: &C, count: u32) -> Result<(), Error> {
    apply(conn, Setting::FastOpenConnect(count))
}

/// Disable delayed ACKs.
pub fn set_quick_ack<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::QuickAck(enable))
}

/// Only wake up `accept(2)` once the client has sent data.
pub fn set_defer_accept<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::DeferAccept(enable))
}

pub fn set_reuse_addr<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::ReuseAddr(enable))
}

/// Let several listeners share a port.
pub fn set_reuse_port<C: Connection + ?Sized>(conn: &C, enable: bool) -> Result<(), Error> {
    apply(conn, Setting::ReusePort(enable))
}

/// Same as [`set_fast_open`], on a raw descriptor.
pub fn set_fast_open_fd(fd: &impl AsFd, queue: u32) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::FastOpen, int_count(queue))
}

/// Same as [`set_fast_open_connect`], on a raw descriptor.
pub fn set_fast_open_connect_fd(fd: &impl AsFd, count: u32) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::FastOpenConnect, int_count(count))
}

/// Same as [`set_quick_ack`], on a raw descriptor.
pub fn set_quick_ack_fd(fd: &impl AsFd, enable: bool) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::QuickAck, int_bool(enable))
}

/// Same as [`set_defer_accept`], on a raw descriptor.
pub fn set_defer_accept_fd(fd: &impl AsFd, enable: bool) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::DeferAccept, int_bool(enable))
}

/// Same as [`set_reuse_addr`], on a raw descriptor.
pub fn set_reuse_addr_fd(fd: &impl AsFd, enable: bool) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::ReuseAddr, int_bool(enable))
}

/// Same as [`set_reuse_port`], on a raw descriptor.
pub fn set_reuse_port_fd(fd: &impl AsFd, enable: bool) -> Result<(), Error> {
    native::<Native>(fd.as_fd(), TcpOption::ReusePort, int_bool(enable))
}

/// Apply one setting.
pub fn apply<C: Connection + ?Sized>(conn: &C, setting: Setting) -> Result<(), Error> {
    apply_all::<Native, C>(conn, &[setting])
}

/// Apply the whole batch, in order, stopping at the first error.
/// Nothing is rolled back.
pub fn set<C: Connection + ?Sized>(conn: &C, options: &Options) -> Result<(), Error> {
    debug!("TCP settings: {:?}", options);
    apply_all::<Native, C>(conn, &options.settings())
}

/// Read an option back.
///
/// Durations come back in seconds, flags as 0 or 1 and linger as
/// seconds or -1 when it's off. `None` if `conn` isn't TCP or the
/// option isn't supported.
pub fn get<C: Connection + ?Sized>(conn: &C, option: TcpOption) -> Result<Option<i64>, Error> {
    get_with::<Native, C>(conn, option)
}

pub(crate) fn apply_all<P: Platform, C: Connection + ?Sized>(
    conn: &C,
    settings: &[Setting],
) -> Result<(), Error> {
    control(conn, |sock| {
        for setting in settings {
            apply_to::<P>(&sock, *setting)?;
        }
        Ok(())
    })
    .map(|_| ())
}

pub(crate) fn get_with<P: Platform, C: Connection + ?Sized>(
    conn: &C,
    option: TcpOption,
) -> Result<Option<i64>, Error> {
    control(conn, |sock| read::<P>(&sock, option)).map(Option::flatten)
}

fn apply_to<P: Platform>(sock: &SockRef<'_>, setting: Setting) -> Result<(), Error> {
    let option = setting.option();
    let value = match setting {
        Setting::Linger(linger) => {
            let linger = linger.map(|linger| Duration::from_secs(int_second(linger) as u64));
            return sock
                .set_linger(linger)
                .map_err(setsockopt("SO_LINGER"));
        }
        Setting::ReadBuffer(bytes) => {
            return sock
                .set_recv_buffer_size(bytes)
                .map_err(setsockopt("SO_RCVBUF"));
        }
        Setting::WriteBuffer(bytes) => {
            return sock
                .set_send_buffer_size(bytes)
                .map_err(setsockopt("SO_SNDBUF"));
        }
        Setting::NoDelay(enable) => {
            return sock
                .set_nodelay(enable)
                .map_err(setsockopt("TCP_NODELAY"));
        }
        Setting::KeepAlive(enable) => {
            return sock
                .set_keepalive(enable)
                .map_err(setsockopt("SO_KEEPALIVE"));
        }

        Setting::LingerTimeout(duration)
        | Setting::KeepAliveIdle(duration)
        | Setting::KeepAliveInterval(duration) => int_second(duration),

        Setting::KeepAliveProbes(count)
        | Setting::FastOpen(count)
        | Setting::FastOpenConnect(count) => int_count(count),

        Setting::QuickAck(enable)
        | Setting::DeferAccept(enable)
        | Setting::ReuseAddr(enable)
        | Setting::ReusePort(enable) => int_bool(enable),
    };

    native::<P>(sock.as_fd(), option, value)
}

fn native<P: Platform>(fd: BorrowedFd<'_>, option: TcpOption, value: c_int) -> Result<(), Error> {
    match P::capability(option) {
        Capability::Native(opt) => {
            trace!("{} = {}", opt.label, value);
            sockopt::set_int(fd, &opt, value)
        }
        Capability::Portable | Capability::Unsupported => {
            trace!("{} isn't supported on {}, skipping", option, P::NAME);
            Ok(())
        }
    }
}

fn read<P: Platform>(sock: &SockRef<'_>, option: TcpOption) -> Result<Option<i64>, Error> {
    let value = match option {
        TcpOption::Linger => sock
            .linger()
            .map_err(getsockopt("SO_LINGER"))?
            .map(|linger| linger.as_secs() as i64)
            .unwrap_or(-1),
        TcpOption::ReadBuffer => sock.recv_buffer_size().map_err(getsockopt("SO_RCVBUF"))? as i64,
        TcpOption::WriteBuffer => sock.send_buffer_size().map_err(getsockopt("SO_SNDBUF"))? as i64,
        TcpOption::NoDelay => int_bool(sock.nodelay().map_err(getsockopt("TCP_NODELAY"))?) as i64,
        TcpOption::KeepAlive => {
            int_bool(sock.keepalive().map_err(getsockopt("SO_KEEPALIVE"))?) as i64
        }
        option => match P::capability(option) {
            Capability::Native(opt) => sockopt::get_int(sock.as_fd(), &opt)? as i64,
            Capability::Portable | Capability::Unsupported => return Ok(None),
        },
    };

    Ok(Some(value))
}

fn setsockopt(option: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |err| Error::syscall("setsockopt", option, err)
}

fn getsockopt(option: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |err| Error::syscall("getsockopt", option, err)
}
