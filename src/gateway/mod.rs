// HTTP gateway - thin axum layer over the resolver and the relay

pub mod handlers;
pub mod responses;

use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::downloader::{MetadataResolver, StreamRelay};

pub use responses::ApiError;

/// Values reported by `/health`, fixed at startup
#[derive(Debug, Clone)]
pub struct HealthInfo {
    pub engine_version: String,
    pub cookies_valid: bool,
    pub identity_version: String,
    pub tool_version: Option<String>,
    pub started_at: Instant,
}

/// Shared handler state. Everything behind it is read-only.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn MetadataResolver>,
    pub relay: Arc<dyn StreamRelay>,
    pub health: Arc<HealthInfo>,
}

impl AppState {
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        relay: Arc<dyn StreamRelay>,
        health: HealthInfo,
    ) -> Self {
        Self {
            resolver,
            relay,
            health: Arc::new(health),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/video-info", get(handlers::video_info))
        .route("/download", get(handlers::download))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
///
/// Open streams get `grace` to finish. After that `serve` returns without
/// them; shutting the runtime down drops their bodies and kills their tools.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
    grace: Duration,
) -> io::Result<()> {
    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    tokio::select! {
        result = server => result,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "open streams outlived the shutdown grace; closing them");
            Ok(())
        }
    }
}
