//! Node binary

use clap::{Parser, Subcommand};
use peerkv::common::{NodeConfig, PeerAddress, TransportKind};
use peerkv::Node;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "peerkv-node")]
#[command(about = "peerkv replicated key-value node")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a node
    Serve {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Address announced to peers (defaults to the bound address)
        #[arg(long)]
        advertise: Option<PeerAddress>,

        /// Peers to join (comma-separated host:port)
        #[arg(long, value_delimiter = ',')]
        peers: Vec<PeerAddress>,

        /// Wire protocol
        #[arg(long, value_enum)]
        transport: Option<TransportKind>,

        /// Per-call timeout for peer requests
        #[arg(long)]
        peer_timeout_ms: Option<u64>,

        /// Log every operation
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            advertise,
            peers,
            transport,
            peer_timeout_ms,
            verbose,
        } => {
            // File and environment first, CLI flags win
            let mut node_config = NodeConfig::load(config.as_deref())?;
            if let Some(listen) = listen {
                node_config.listen_addr = listen;
            }
            if advertise.is_some() {
                node_config.advertise_addr = advertise;
            }
            if !peers.is_empty() {
                node_config.peers = peers;
            }
            if let Some(transport) = transport {
                node_config.transport = transport;
            }
            if let Some(ms) = peer_timeout_ms {
                node_config.peer_timeout_ms = ms;
            }
            if verbose {
                node_config.log_level = "debug".to_string();
            }

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| node_config.log_level.clone().into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let node = Node::start(node_config).await?;
            node.serve().await?;
        }
    }

    Ok(())
}
