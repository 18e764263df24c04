//! tcpopt, portable TCP socket tuning.

use clap::Parser;
use tcpopt::cli::{self, Cli, Commands};
use tcpopt::config;
use tokio::runtime::Builder;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();

    tcpopt::logger();

    if let Some(Commands::Table) = args.command {
        cli::table();
        return Ok(());
    }

    info!("tcpopt {}", env!("CARGO_PKG_VERSION"));

    let config = config::load(&args.config)?;
    config::overrides(args.overrides());
    let addr = config.general.addr()?;

    let runtime = match config.general.workers {
        0 => {
            let mut binding = Builder::new_current_thread();
            binding.enable_all();
            binding
        }
        workers => {
            info!("spawning {} workers", workers);
            let mut builder = Builder::new_multi_thread();
            builder.worker_threads(workers).enable_all();
            builder
        }
    }
    .build()?;

    runtime.block_on(async move {
        match args.command {
            Some(Commands::Connect { addr: target }) => {
                cli::connect(target.unwrap_or(addr)).await
            }
            Some(Commands::Listen {
                addr: target,
                connections,
            }) => cli::listen(target.unwrap_or(addr), connections).await,
            Some(Commands::Table) | None => cli::listen(addr, None).await,
        }
    })?;

    Ok(())
}
