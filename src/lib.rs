pub mod config;
pub mod downloader;
pub mod gateway;

use std::sync::Arc;
use std::time::Instant;

use time::format_description::well_known::Rfc3339;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use config::GatewayConfig;
use downloader::{
    ClientIdentityProfile, CookieJar, ToolContext, YtDlpRelay, YtDlpResolver,
};
use gateway::{AppState, HealthInfo};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Seconds allowed for the startup `--version` probe
const TOOL_PROBE_TIMEOUT_SECS: u64 = 10;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("youtube_relay_lib=info,youtube_relay=info,tower_http=info")
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::new(Rfc3339))
        .with_target(true)
        .try_init();
}

/// Build the engine from `config` and serve until Ctrl-C
pub async fn run(config: GatewayConfig) -> Result<(), BoxError> {
    let identity = ClientIdentityProfile::select(
        config.identity_profile.as_deref(),
        config.identity_file.as_deref(),
    )?;
    info!(profile = %identity.version, "client identity selected");

    let cookies = CookieJar::load(&config.cookies, &config.cookies_artifact_path()).await;

    let launcher = config.launcher();
    let tool_version = launcher.probe_version(TOOL_PROBE_TIMEOUT_SECS).await;
    if tool_version.is_none() {
        warn!(
            tool = launcher.program(),
            "extraction tool did not report a version; requests will fail until it is installed"
        );
    }

    let context = Arc::new(ToolContext::new(
        launcher,
        cookies,
        identity,
        config.network(),
    ));

    let health = HealthInfo {
        engine_version: config.engine_label(),
        cookies_valid: context.cookies_valid(),
        identity_version: context.identity.version.clone(),
        tool_version,
        started_at: Instant::now(),
    };
    let state = AppState::new(
        Arc::new(YtDlpResolver::new(context.clone(), config.resolve_timeout())),
        Arc::new(YtDlpRelay::new(context, config.relay_settings())),
        health,
    );

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %listener.local_addr()?,
        engine = %state.health.engine_version,
        cookies_valid = state.health.cookies_valid,
        "gateway listening"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    gateway::serve(listener, state, shutdown, config.shutdown_grace()).await?;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler, run until killed
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
