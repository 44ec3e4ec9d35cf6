//! Custody signing provider (v1)
//!
//! Serves a JSON-RPC endpoint for one configured network. Signing calls
//! go to the custody service; everything else goes to the network's node.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::RpcServer ─▶ rpc::ProviderAdapter    │
//!                              │                          │                   │
//!                              │                          ▼                   │
//!                              │                  rpc::Pipeline               │
//!                              │                   │            │             │
//!                              │       signing     ▼            ▼  other      │
//!                              │          signer::CustodySigner   rpc::Http-  │──▶ Node
//!                              │                   │              Transport   │
//!                              └───────────────────┼──────────────────────────┘
//!                                                  ▼
//!                                       custody::HttpCustodyClient ──▶ Custody API
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use custody_signer::config::read_config;
use custody_signer::lifecycle::{signals, Shutdown};
use custody_signer::observability::{logging, metrics};
use custody_signer::{setup, RpcServer};

#[derive(Parser)]
#[command(name = "custody-signer")]
#[command(about = "JSON-RPC provider that signs through a custody service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "custody-signer.toml")]
    config: PathBuf,

    /// Network to serve
    #[arg(short, long)]
    network: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let user = match read_config(&cli.config) {
        Ok(user) => user,
        Err(e) => {
            eprintln!("custody-signer: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&user.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "custody-signer starting");

    if user.observability.metrics_enabled {
        match user.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %user.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Runs the guard over every network; logging is already up for its warnings.
    let adapter = setup(&user, &cli.network)?;
    tracing::info!(
        path = %cli.config.display(),
        networks = user.networks.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&user.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        network = %cli.network,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = RpcServer::new(adapter, &user.server);
    let receiver = shutdown.subscribe();
    let serve = tokio::spawn(server.run(listener, receiver));

    signals::shutdown_on_ctrl_c(&shutdown).await;
    serve.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
