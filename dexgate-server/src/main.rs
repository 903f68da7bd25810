//! Gateway HTTP server binary.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p dexgate-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p dexgate-server
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p dexgate-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `8787`)
//! - `RUST_LOG` — Log level filter (default: `info`)

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dexgate_core::family::ChainAdapter;
use dexgate_core::CoordinationState;
use dexgate_http::{router, AppState, NetworkRegistry};
use tracing_subscriber::EnvFilter;

use config::{ChainFamily, GatewayConfig, NetworkConfig};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Gateway failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        networks = config.networks.len(),
        "Loaded configuration"
    );

    if config.networks.is_empty() {
        tracing::warn!("No networks configured — gateway will reject every request");
    }

    let tunables = config.tunables.clone().into_tunables();
    let coordination = CoordinationState {
        tunables,
        ..CoordinationState::new()
    };

    let mut networks: NetworkRegistry = NetworkRegistry::new();
    for (name, network_cfg) in &config.networks {
        match build_adapter(name, network_cfg) {
            Ok(adapter) => {
                tracing::info!(network = %name, family = ?network_cfg.family, "Registered chain adapter");
                networks.insert(name.clone(), adapter);
            }
            Err(e) => {
                tracing::warn!(network = %name, error = %e, "Skipping network: failed to build adapter");
            }
        }
    }

    let state = Arc::new(AppState {
        coordination,
        networks,
    });

    spawn_reaper(Arc::clone(&state), Duration::from_millis(config.reaper_interval_ms));

    let app = router(Arc::clone(&state));
    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway shut down gracefully");
    Ok(())
}

#[cfg_attr(not(any(feature = "chain-evm", feature = "chain-svm")), allow(unused_variables))]
fn build_adapter(
    name: &str,
    network_cfg: &NetworkConfig,
) -> Result<Arc<dyn ChainAdapter>, Box<dyn std::error::Error>> {
    match network_cfg.family {
        #[cfg(feature = "chain-evm")]
        ChainFamily::Evm => build_evm_adapter(network_cfg),
        #[cfg(not(feature = "chain-evm"))]
        ChainFamily::Evm => Err(format!("{name}: chain-evm feature not enabled").into()),

        #[cfg(feature = "chain-svm")]
        ChainFamily::Svm => build_svm_adapter(network_cfg),
        #[cfg(not(feature = "chain-svm"))]
        ChainFamily::Svm => Err(format!("{name}: chain-svm feature not enabled").into()),
    }
}

#[cfg(feature = "chain-evm")]
fn build_evm_adapter(
    network_cfg: &NetworkConfig,
) -> Result<Arc<dyn ChainAdapter>, Box<dyn std::error::Error>> {
    use alloy_provider::{Provider, ProviderBuilder};
    use alloy_signer_local::PrivateKeySigner;
    use alloy_transport_http::reqwest::Url;
    use dexgate_evm::signer::SoftwareSigner;
    use dexgate_evm::EvmAdapter;

    let key_str = network_cfg
        .signer_private_key
        .as_deref()
        .unwrap_or_default()
        .trim();
    if key_str.is_empty() || key_str.starts_with('$') {
        return Err("signer_private_key not resolved (missing env var?)".into());
    }

    let signer: PrivateKeySigner = key_str.parse()?;
    let rpc_url: Url = network_cfg.rpc_url.parse()?;
    let provider = ProviderBuilder::new().connect_http(rpc_url).erased();

    let adapter = EvmAdapter::new(
        dexgate_evm::EvmProvider::new(provider),
        Box::new(SoftwareSigner::new(signer)),
    );
    Ok(Arc::new(adapter))
}

#[cfg(feature = "chain-svm")]
fn build_svm_adapter(
    network_cfg: &NetworkConfig,
) -> Result<Arc<dyn ChainAdapter>, Box<dyn std::error::Error>> {
    use dexgate_svm::signer::KeypairSigner;
    use dexgate_svm::{SvmAdapter, SvmProvider};
    use solana_client::nonblocking::rpc_client::RpcClient;
    use solana_keypair::Keypair;

    let path = network_cfg
        .signer_keypair_path
        .as_deref()
        .ok_or("signer_keypair_path not set")?;
    let raw = std::fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&raw)?;
    let keypair = Keypair::try_from(bytes.as_slice())?;

    let client = RpcClient::new(network_cfg.rpc_url.clone());
    let adapter = SvmAdapter::new(SvmProvider::new(client), KeypairSigner::new(keypair));
    Ok(Arc::new(adapter))
}

fn spawn_reaper(state: Arc<AppState>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reaped = state.coordination.reap_once();
            if reaped > 0 {
                tracing::info!(reaped, "Reaped expired leases");
            }
        }
    });
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
