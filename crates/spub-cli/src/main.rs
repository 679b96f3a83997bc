use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spub_config::{load_bridge_config, load_layered_yaml};
use spub_normalizer::normalize;
use spub_reconcile::{LiveDecision, ReconciliationEngine};
use spub_schemas::DiscoveryDocument;
use spub_transport::MAX_DATAGRAM;
use std::fs;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

#[derive(Parser)]
#[command(name = "spub")]
#[command(about = "Solar telemetry bridge CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print every discovery topic and its retained payload
    Discovery {
        /// Layered config paths in merge order (falls back to SPUB_CONFIG)
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Show what the bridge would publish for a datagram file (fresh state)
    Inspect {
        /// File holding one datagram
        file: String,

        /// Layered config paths in merge order (falls back to SPUB_CONFIG)
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Send a file as a single UDP datagram
    Send {
        /// Destination, e.g. 127.0.0.1:52005
        #[arg(long)]
        to: SocketAddr,

        /// File holding one datagram
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Discovery { config_paths } => {
            let cfg = load_bridge_config(&config_paths)?.bridge()?;
            let doc = DiscoveryDocument::build(&cfg.topics.scheme())
                .context("discovery document build failed")?;
            for record in doc.records() {
                println!("{} {}", record.topic, record.payload);
            }
        }

        Commands::Inspect { file, config_paths } => {
            let cfg = load_bridge_config(&config_paths)?.bridge()?;
            let scheme = cfg.topics.scheme();
            let raw = read_datagram(&file)?;

            let snapshot = match normalize(&raw) {
                Ok(s) => s,
                Err(failure) => bail!("datagram rejected ({}): {}", failure.reason(), failure),
            };
            let report = ReconciliationEngine::new().apply(&snapshot);
            match report.live {
                LiveDecision::Accepted { timestamp_ms } => println!("live=accepted ts={timestamp_ms}"),
                LiveDecision::Stale { .. } => println!("live=stale"),
                LiveDecision::NotApplicable => println!("live=none"),
            }
            for instruction in &report.instructions {
                println!("{} {}", instruction.topic(&scheme), instruction.payload);
            }
        }

        Commands::Send { to, file } => {
            let raw = read_datagram(&file)?;
            if raw.len() > MAX_DATAGRAM {
                eprintln!(
                    "warning: {} bytes exceeds the listener's {} byte buffer; it will be truncated",
                    raw.len(),
                    MAX_DATAGRAM
                );
            }
            let bind: SocketAddr = if to.is_ipv4() {
                SocketAddr::from(([0, 0, 0, 0], 0))
            } else {
                SocketAddr::from(([0u16; 8], 0))
            };
            let socket = UdpSocket::bind(bind).await.context("bind local udp socket")?;
            let sent = socket
                .send_to(&raw, to)
                .await
                .with_context(|| format!("send datagram to {to}"))?;
            println!("sent_bytes={sent} to={to}");
        }
    }

    Ok(())
}

fn read_datagram(path: &str) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("read datagram file: {path}"))?;
    if raw.is_empty() {
        bail!("datagram file is empty: {path}");
    }
    Ok(raw)
}
