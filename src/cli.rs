use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::signal::ctrl_c;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio::select;
use tracing::{debug, error, info};

use crate::config::{config, Overrides};
use crate::net::{self, platform, Connection, Native, Platform, TcpOption};

/// Apply TCP tuning to real sockets and inspect what the OS supports.
#[derive(Parser, Debug)]
pub struct Cli {
    /// Path to the configuration file. Default: "tcpopt.toml"
    #[arg(short, long, default_value = "tcpopt.toml")]
    pub config: PathBuf,
    /// Reset connections on close instead of draining them.
    #[arg(long)]
    pub no_linger: Option<bool>,
    /// Disable the Nagle algorithm.
    #[arg(long)]
    pub nodelay: Option<bool>,
    /// Enable keep-alive with this idle time, in milliseconds.
    #[arg(long)]
    pub keepalive_idle: Option<u64>,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings passed as flags.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            no_linger: self.no_linger,
            nodelay: self.nodelay,
            keepalive_idle: self.keepalive_idle,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print how this OS sets every option.
    Table,

    /// Accept connections and tune each one.
    Listen {
        /// Address to listen on. Default: host and port from the config.
        #[arg(short, long)]
        addr: Option<SocketAddr>,
        /// Stop after this many connections.
        #[arg(short = 'n', long)]
        connections: Option<usize>,
    },

    /// Connect, tune the connection and print what the OS reports back.
    Connect {
        /// Address to connect to. Default: host and port from the config.
        #[arg(short, long)]
        addr: Option<SocketAddr>,
    },
}

/// Print the capability table.
pub fn table() {
    println!("platform: {}", Native::NAME);
    for (option, capability) in platform::table::<Native>() {
        println!("{:<20} {}", option.name(), capability);
    }
}

/// Read back every option from `conn`.
pub fn report(conn: &(impl Connection + ?Sized)) -> Vec<(TcpOption, Option<i64>)> {
    TcpOption::ALL
        .iter()
        .map(|option| {
            let value = match net::get(conn, *option) {
                Ok(value) => value,
                Err(err) => {
                    debug!("{}: {}", option, err);
                    None
                }
            };
            (*option, value)
        })
        .collect()
}

fn print_report(report: &[(TcpOption, Option<i64>)]) {
    for (option, value) in report {
        match value {
            Some(value) => println!("{:<20} {}", option.name(), value),
            None => println!("{:<20} -", option.name()),
        }
    }
}

/// Listen for connections, tuning the listener and then every client.
pub async fn listen(
    addr: SocketAddr,
    connections: Option<usize>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = config();

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    net::set(&socket, &config.listener.options())?;
    socket.bind(&addr.into())?;
    socket.listen(config.general.backlog)?;
    socket.set_nonblocking(true)?;

    let listener = TcpListener::from_std(socket.into())?;
    info!("listening on {}", listener.local_addr()?);
    debug!("TCP settings: {}", config.tcp);

    let mut accepted = 0;
    let mut clients = JoinSet::new();

    loop {
        if connections.map(|max| accepted >= max).unwrap_or(false) {
            break;
        }

        select! {
            connection = listener.accept() => {
                let (stream, peer) = connection?;
                accepted += 1;

                clients.spawn(async move {
                    if let Err(err) = handle(stream, peer).await {
                        error!("client {} failed: {}", peer, err);
                    }
                });
            }

            Some(_) = clients.join_next(), if !clients.is_empty() => (),

            _ = ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    // Let clients that are still being served get their greeting.
    while clients.join_next().await.is_some() {}

    Ok(())
}

async fn handle(
    mut stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    net::set(&stream, &config().tcp.options())?;

    for (option, value) in report(&stream) {
        if let Some(value) = value {
            debug!("[{}] {} = {}", peer, option, value);
        }
    }

    info!("tuned connection from {}", peer);
    stream
        .write_all(format!("tcpopt {}\n", env!("CARGO_PKG_VERSION")).as_bytes())
        .await?;
    stream.shutdown().await?;

    Ok(())
}

/// Connect, tune the socket before connecting and print the result.
pub async fn connect(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = config();

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    // Before connect(2), so Fast Open on the client side can work.
    net::set(&socket, &config.tcp.options())?;

    let mut stream = socket.connect(addr).await?;
    info!("connected to {}", addr);

    print_report(&report(&stream));

    let mut greeting = String::new();
    match timeout(Duration::from_secs(5), stream.read_to_string(&mut greeting)).await {
        Ok(Ok(_)) if !greeting.is_empty() => info!("server says: {}", greeting.trim()),
        Ok(Ok(_)) => (),
        Ok(Err(err)) => error!("read failed: {}", err),
        Err(_) => debug!("server didn't say anything"),
    }

    Ok(())
}
