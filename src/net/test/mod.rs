//! Tuning real sockets.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{spawn, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use super::*;

/// Listen on a random port and answer `connections` clients with a
/// greeting before closing them. `setup` runs before bind(2).
fn setup_server(
    connections: usize,
    setup: impl FnOnce(&Socket) -> Result<(), Error>,
) -> (SocketAddr, JoinHandle<()>) {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
    setup(&socket).unwrap();

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    socket.bind(&addr.into()).unwrap();
    socket.listen(128).unwrap();

    let listener: TcpListener = socket.into();
    let addr = listener.local_addr().unwrap();

    let handle = spawn(move || {
        for _ in 0..connections {
            let (mut conn, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let _ = conn.write_all(b"hello");
        }
    });

    (addr, handle)
}

fn tcp_socket() -> Socket {
    Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_keepalive_read_back() {
    let (addr, server) = setup_server(1, |_| Ok(()));
    let conn = TcpStream::connect(addr).unwrap();

    keepalive(
        &conn,
        true,
        Duration::from_secs(123),
        Duration::from_secs(77),
        7,
    )
    .unwrap();

    assert_eq!(get(&conn, TcpOption::KeepAlive).unwrap(), Some(1));
    assert_eq!(get(&conn, TcpOption::KeepAliveIdle).unwrap(), Some(123));
    assert_eq!(get(&conn, TcpOption::KeepAliveInterval).unwrap(), Some(77));
    assert_eq!(get(&conn, TcpOption::KeepAliveProbes).unwrap(), Some(7));

    set_keepalive_interval(&conn, Duration::from_millis(1500)).unwrap();
    assert_eq!(get(&conn, TcpOption::KeepAliveInterval).unwrap(), Some(1));

    set_keepalive_probes(&conn, 3).unwrap();
    assert_eq!(get(&conn, TcpOption::KeepAliveProbes).unwrap(), Some(3));

    drop(conn);
    server.join().unwrap();
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_batch_keepalive_partial() {
    let (addr, server) = setup_server(1, |_| Ok(()));
    let conn = TcpStream::connect(addr).unwrap();

    let interval = get(&conn, TcpOption::KeepAliveInterval).unwrap();
    let probes = get(&conn, TcpOption::KeepAliveProbes).unwrap();

    set(
        &conn,
        &Options {
            keepalive: true,
            keepalive_idle: Duration::from_secs(77),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(get(&conn, TcpOption::KeepAliveIdle).unwrap(), Some(77));
    assert_eq!(get(&conn, TcpOption::KeepAliveInterval).unwrap(), interval);
    assert_eq!(get(&conn, TcpOption::KeepAliveProbes).unwrap(), probes);

    drop(conn);
    server.join().unwrap();
}

#[test]
fn test_no_linger_resets() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (mut server, _) = listener.accept().unwrap();

    set_no_linger(&client, true).unwrap();
    drop(client);

    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = [0u8; 16];
    let err = server.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionReset);
}

#[test]
fn test_graceful_close_without_no_linger() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (mut server, _) = listener.accept().unwrap();

    set_no_linger(&client, false).unwrap();
    drop(client);

    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(server.read(&mut buf).unwrap(), 0);
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_reuse_port() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let first = tcp_socket();
    set_reuse_port(&first, true).unwrap();
    first.bind(&addr.into()).unwrap();
    first.listen(128).unwrap();
    let addr = first.local_addr().unwrap();

    let second = tcp_socket();
    set_reuse_port(&second, true).unwrap();
    second.bind(&addr).unwrap();
    second.listen(128).unwrap();

    assert_eq!(get(&first, TcpOption::ReusePort).unwrap(), Some(1));
    assert_eq!(get(&second, TcpOption::ReusePort).unwrap(), Some(1));

    let addr = addr.as_socket().unwrap();
    let first: TcpListener = first.into();
    let second: TcpListener = second.into();
    first.set_nonblocking(true).unwrap();
    second.set_nonblocking(true).unwrap();

    let clients = (0..16)
        .map(|_| TcpStream::connect(addr).unwrap())
        .collect::<Vec<_>>();

    // Connections are spread between the listeners, but every one of
    // them lands on one of the two.
    let mut accepted = 0;
    for _ in 0..500 {
        for listener in [&first, &second] {
            if listener.accept().is_ok() {
                accepted += 1;
            }
        }
        if accepted == clients.len() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(accepted, clients.len());
}

#[test]
fn test_bind_without_reuse_port_fails() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let first = tcp_socket();
    first.bind(&addr.into()).unwrap();
    first.listen(128).unwrap();

    let second = tcp_socket();
    let err = second.bind(&first.local_addr().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddrInUse);
}

#[test]
fn test_reuse_addr_fd() {
    let socket = tcp_socket();
    set_reuse_addr_fd(&socket, true).unwrap();
    if Native::capability(TcpOption::ReuseAddr).supported() {
        assert_eq!(get(&socket, TcpOption::ReuseAddr).unwrap(), Some(1));
    }
    set_reuse_addr_fd(&socket, false).unwrap();
    if Native::capability(TcpOption::ReuseAddr).supported() {
        assert_eq!(get(&socket, TcpOption::ReuseAddr).unwrap(), Some(0));
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;

    #[test]
    fn test_fast_open() {
        let (addr, server) = setup_server(1, |socket| {
            // Capped by net.core.somaxconn, keep it small.
            set_fast_open(socket, 64)?;
            assert_eq!(get(socket, TcpOption::FastOpen)?, Some(64));
            // Not set, so it's the default.
            assert_eq!(get(socket, TcpOption::DeferAccept)?, Some(0));
            Ok(())
        });

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.write_all(b"PING").unwrap();
        drop(conn);
        server.join().unwrap();
    }

    #[test]
    fn test_fast_open_fd() {
        let socket = tcp_socket();
        set_fast_open_fd(&socket, 16).unwrap();
        assert_eq!(get(&socket, TcpOption::FastOpen).unwrap(), Some(16));
    }

    #[test]
    fn test_defer_accept() {
        let (addr, server) = setup_server(1, |socket| {
            set_defer_accept(socket, true)?;
            assert_eq!(get(socket, TcpOption::DeferAccept)?, Some(1));
            Ok(())
        });

        let mut conn = TcpStream::connect(addr).unwrap();
        // Deferred until there's data.
        conn.write_all(b"PING").unwrap();
        let mut buf = [0u8; 5];
        conn.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        server.join().unwrap();
    }

    #[test]
    fn test_defer_accept_fd() {
        let socket = tcp_socket();
        set_defer_accept_fd(&socket, true).unwrap();
        assert_eq!(get(&socket, TcpOption::DeferAccept).unwrap(), Some(1));
        set_defer_accept_fd(&socket, false).unwrap();
        assert_eq!(get(&socket, TcpOption::DeferAccept).unwrap(), Some(0));
    }

    #[test]
    fn test_fast_open_connect() {
        let socket = tcp_socket();
        match set_fast_open_connect(&socket, 1) {
            // net.ipv4.tcp_fastopen has client support turned off.
            Err(err) if err.raw_os_error() == Some(libc::EOPNOTSUPP) => return,
            result => result.unwrap(),
        }
        assert_eq!(get(&socket, TcpOption::FastOpenConnect).unwrap(), Some(1));

        let socket = tcp_socket();
        set_fast_open_connect_fd(&socket, 1).unwrap();
        assert_eq!(get(&socket, TcpOption::FastOpenConnect).unwrap(), Some(1));
    }

    #[test]
    fn test_linger_timeout() {
        let (addr, server) = setup_server(1, |_| Ok(()));
        let conn = TcpStream::connect(addr).unwrap();

        set_linger_timeout(&conn, Duration::from_millis(5999)).unwrap();
        assert_eq!(get(&conn, TcpOption::LingerTimeout).unwrap(), Some(5));

        drop(conn);
        server.join().unwrap();
    }

    #[test]
    fn test_quick_ack() {
        let (addr, server) = setup_server(1, |_| Ok(()));
        let conn = TcpStream::connect(addr).unwrap();

        set_quick_ack(&conn, true).unwrap();
        set_quick_ack_fd(&conn, false).unwrap();
        // Read-back of quick-ACK reflects the current ACK state, not the
        // setting, so only check that it's there.
        assert!(get(&conn, TcpOption::QuickAck).unwrap().is_some());

        drop(conn);
        server.join().unwrap();
    }

    #[test]
    fn test_batch_stops_at_first_error() {
        let (addr, server) = setup_server(1, |_| Ok(()));
        let conn = TcpStream::connect(addr).unwrap();
        set_nodelay(&conn, false).unwrap();

        // Fast Open can't be set on an established connection.
        let err = set(
            &conn,
            &Options {
                nodelay: true,
                fast_open: 16,
                reuse_port: true,
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.option(), Some("TCP_FASTOPEN"));
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        // Applied before the failure, not rolled back.
        assert_eq!(get(&conn, TcpOption::NoDelay).unwrap(), Some(1));
        // Never attempted.
        assert_eq!(get(&conn, TcpOption::ReusePort).unwrap(), Some(0));

        drop(conn);
        server.join().unwrap();
    }

    #[test]
    fn test_batch_full() {
        let (addr, server) = setup_server(1, |socket| {
            set(
                socket,
                &Options {
                    fast_open: 32,
                    defer_accept: true,
                    reuse_addr: true,
                    reuse_port: true,
                    ..Default::default()
                },
            )
        });

        let conn = TcpStream::connect(addr).unwrap();
        set(
            &conn,
            &Options {
                linger_timeout: Duration::from_secs(7),
                read_buffer: 32 * 1024,
                write_buffer: 32 * 1024,
                nodelay: true,
                keepalive: true,
                keepalive_idle: Duration::from_secs(60),
                keepalive_interval: Duration::from_secs(10),
                keepalive_probes: 4,
                quick_ack: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(get(&conn, TcpOption::LingerTimeout).unwrap(), Some(7));
        assert_eq!(get(&conn, TcpOption::NoDelay).unwrap(), Some(1));
        assert_eq!(get(&conn, TcpOption::KeepAliveIdle).unwrap(), Some(60));
        assert_eq!(get(&conn, TcpOption::KeepAliveInterval).unwrap(), Some(10));
        assert_eq!(get(&conn, TcpOption::KeepAliveProbes).unwrap(), Some(4));

        drop(conn);
        server.join().unwrap();
    }
}

#[tokio::test]
async fn test_tokio_stream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let conn = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (accepted, _) = listener.accept().await.unwrap();

    set(
        &conn,
        &Options {
            nodelay: true,
            keepalive: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(get(&conn, TcpOption::NoDelay).unwrap(), Some(1));
    assert_eq!(get(&conn, TcpOption::KeepAlive).unwrap(), Some(1));

    set_reuse_addr(&listener, true).unwrap();
    set_nodelay(&accepted, true).unwrap();
    assert_eq!(get(&accepted, TcpOption::NoDelay).unwrap(), Some(1));
}

#[tokio::test]
async fn test_tokio_unix_stream_is_noop() {
    let (left, _right) = tokio::net::UnixStream::pair().unwrap();
    set(
        &left,
        &Options {
            nodelay: true,
            fast_open: 1,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(get(&left, TcpOption::NoDelay).unwrap(), None);
}

#[test]
fn test_mixed_connections() {
    let (addr, server) = setup_server(1, |_| Ok(()));
    let tcp = TcpStream::connect(addr).unwrap();
    let (unix, _peer) = std::os::unix::net::UnixStream::pair().unwrap();
    let udp = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();

    let conns: Vec<Box<dyn Connection>> = vec![Box::new(tcp), Box::new(unix), Box::new(udp)];
    for conn in &conns {
        set_nodelay(conn, true).unwrap();
    }

    let nodelay = conns
        .iter()
        .map(|conn| get(conn, TcpOption::NoDelay).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(nodelay, vec![Some(1), None, None]);

    drop(conns);
    server.join().unwrap();
}
