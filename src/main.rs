//! Entry point: resolve configuration, bring up shared state, attempt
//! backend discovery, spawn the heartbeat, then serve the configured
//! transport until it exits or the process receives a shutdown signal.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use replbridge::cli::Cli;
use replbridge::config::BridgeConfig;
use replbridge::error::Result;
use replbridge::heartbeat::Heartbeat;
use replbridge::mcp::dispatcher::Dispatcher;
use replbridge::rp::RpClient;
use replbridge::state::StateCore;
use replbridge::tools;
use replbridge::transport;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::resolve(&cli);
    init_tracing(config.debug);

    tracing::info!(workspace = %config.workspace.display(), "starting bridge");

    let rp = Arc::new(RpClient::new(config.eval_timeout));
    let state = StateCore::new(rp.clone(), config.history_cap, config.workspace.clone(), config.discovery_deadline);

    if let Err(e) = attempt_initial_connect(&state, &config).await {
        tracing::warn!(error = %e, "initial backend discovery did not succeed; continuing disconnected");
    }

    let heartbeat = Heartbeat::spawn(state.clone(), config.heartbeat_interval, config.heartbeat_probe_timeout);

    let registry = tools::build_registry();
    let dispatcher = Arc::new(Dispatcher::new(registry, state));

    let serve = async {
        match config.http_port {
            Some(port) => serve_http(dispatcher, port).await,
            None => {
                transport::stdio::run(dispatcher).await;
                Ok(())
            }
        }
    };

    tokio::select! {
        result = serve => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    heartbeat.stop();
    Ok(())
}

async fn attempt_initial_connect(state: &StateCore, config: &BridgeConfig) -> Result<()> {
    let port = match config.port {
        Some(port) => port,
        None => {
            replbridge::rp::discovery::discover(
                &config.workspace,
                replbridge::rp::discovery::DEFAULT_SENTINEL_NAME,
                config.discovery_deadline,
            )
            .await?
        }
    };
    state.rp.connect("127.0.0.1", port).await?;
    state.set_peer("127.0.0.1".to_string(), port).await;
    tracing::info!(port, "connected to backend");
    Ok(())
}

async fn serve_http(dispatcher: Arc<Dispatcher>, port: u16) -> Result<()> {
    let app = transport::http::router(dispatcher);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(replbridge::error::BridgeError::Io)?;
    tracing::info!(port, "serving HTTP transport");
    axum::serve(listener, app)
        .await
        .map_err(|e| replbridge::error::BridgeError::Internal(e.to_string()))?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "replbridge=debug" } else { "replbridge=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
