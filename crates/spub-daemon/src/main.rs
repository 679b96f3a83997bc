//! spub-daemon entry point.
//!
//! Startup order matters:
//! 1. config + credentials
//! 2. broker connect (fatal on failure; exit status is the broker's reason code)
//! 3. discovery announcement
//! 4. UDP bind, optional status listener
//! 5. bridge loop until Ctrl-C / SIGTERM, then broker disconnect

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use spub_config::{
    load_bridge_config, report_unused_keys, resolve_broker_credentials, BridgeConfig,
    UnusedKeyPolicy,
};
use spub_daemon::{
    announce::announce_all,
    bridge::Bridge,
    routes,
    state::{AppState, BridgeStats},
};
use spub_schemas::DiscoveryDocument;
use spub_transport::{MqttPublisher, MqttSettings, UdpIngest};
use tokio::sync::RwLock;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "spub-daemon")]
#[command(about = "UDP solar telemetry to MQTT bridge", long_about = None)]
struct Args {
    /// Layered config paths in merge order (falls back to SPUB_CONFIG)
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Abort when the config carries keys the bridge does not read
    #[arg(long, default_value_t = false)]
    strict_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent when absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();
    let args = Args::parse();

    let loaded = load_bridge_config(&args.config_paths)?;
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(&loaded.config_json, policy)?;
    for pointer in &unused.unused_leaf_pointers {
        warn!(pointer = %pointer, "config key is not used by the bridge");
    }
    let cfg = loaded.bridge()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let settings = mqtt_settings(&cfg)?;
    info!(
        host = %settings.host,
        port = settings.port,
        client_id = %settings.client_id,
        "connecting to broker"
    );
    let publisher = match MqttPublisher::connect(&settings).await {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(error = %e, "broker connection failed");
            std::process::exit(e.exit_code());
        }
    };

    let scheme = cfg.topics.scheme();
    let discovery = DiscoveryDocument::build(&scheme).context("discovery document build failed")?;
    announce_all(publisher.as_ref(), &discovery).context("discovery announcement failed")?;

    let mut ingest = UdpIngest::bind(cfg.ingest.bind, cfg.ingest.max_datagram)
        .await
        .context("ingest bind failed")?;
    info!(bind = %cfg.ingest.bind, "listening for datagrams");

    let stats = Arc::new(RwLock::new(BridgeStats::default()));

    if let Some(addr) = cfg.status.bind {
        let shared = Arc::new(AppState::new(
            loaded.config_hash.clone(),
            Arc::clone(&stats),
            publisher.connection_state(),
        ));
        let app = routes::build_router(shared).layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        );
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("status listener bind {addr} failed"))?;
        info!("status listening on http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "status server stopped");
            }
        });
    }

    let mut bridge = Bridge::new(Arc::clone(&publisher), scheme, stats);
    let summary = bridge.run(&mut ingest, shutdown_signal()).await;
    drop(ingest);

    info!(
        datagrams = summary.datagrams_received,
        parse_failures = summary.parse_failures.total(),
        publish_failures = summary.publish_failures,
        "bridge stopped"
    );
    publisher.shutdown(Duration::from_secs(5)).await;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn mqtt_settings(cfg: &BridgeConfig) -> anyhow::Result<MqttSettings> {
    let credentials = resolve_broker_credentials(cfg)?.map(|c| c.into_pair());
    let broker = &cfg.broker;
    Ok(MqttSettings {
        host: broker.host.clone(),
        port: broker.port,
        client_id: broker.client_id.clone(),
        keep_alive: Duration::from_secs(broker.keep_alive_secs),
        qos: broker.qos,
        credentials,
        connect_timeout: Duration::from_secs(broker.connect_timeout_secs),
        request_capacity: broker.request_capacity,
        reconnect_initial: Duration::from_millis(broker.reconnect.initial_ms),
        reconnect_max: Duration::from_millis(broker.reconnect.max_ms),
    })
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
