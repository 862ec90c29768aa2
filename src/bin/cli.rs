//! CLI client

use clap::{Parser, Subcommand};
use peerkv::common::{parse_assignment, PeerAddress, TransportKind};
use peerkv::Client;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "peerkv")]
#[command(about = "peerkv replicated key-value store CLI")]
#[command(version)]
struct Cli {
    /// Node to talk to
    #[arg(long, default_value = "127.0.0.1:4000")]
    node: PeerAddress,

    /// Wire protocol spoken by the node
    #[arg(long, value_enum, default_value_t = TransportKind::Http)]
    transport: TransportKind,

    /// Request timeout
    #[arg(long, default_value = "10000")]
    timeout_ms: u64,

    /// Log requests as they are sent
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a key
    Get {
        /// Key
        key: String,
    },

    /// Write a key; the node replicates it to its peers
    Set {
        /// Key, or KEY=VALUE
        key: String,

        /// Value
        value: Option<String>,
    },

    /// Print every entry
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| (if cli.verbose { "debug" } else { "warn" }).into()),
        )
        .init();

    let client = Client::new(
        cli.node,
        cli.transport,
        Duration::from_millis(cli.timeout_ms),
    )?;

    match cli.command {
        Commands::Get { key } => match client.get(&key).await? {
            Some(value) => println!("{} = {}", key, value),
            None => println!("{}: undefined", key),
        },

        Commands::Set { key, value } => {
            let (key, value) = match value {
                Some(value) => (key, value),
                None => parse_assignment(&key)?,
            };
            let ack = client.set(&key, &value).await?;
            println!(
                "SET {} = {}: ok (replicated to {} peer(s), {} failed)",
                key, value, ack.replicated_to, ack.failed
            );
        }

        Commands::List => {
            let snapshot = client.list().await?;
            println!("{} key(s) on {}", snapshot.len(), client.node());
            for (key, value) in snapshot {
                println!("  {} = {}", key, value);
            }
        }
    }

    Ok(())
}
