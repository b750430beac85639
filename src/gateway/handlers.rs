// Route handlers

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::responses::ApiError;
use super::AppState;
use crate::downloader::utils::sanitize_title;
use crate::downloader::{ExtractionResult, MediaRequest};

/// Query parameters shared by `/video-info` and `/download`
#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    pub url: Option<String>,
    /// Quality tier (`4k`, `hd`, `720p`, `360p`, `audio`, `128k`)
    #[serde(rename = "type")]
    pub tier: Option<String>,
    /// Download filename stem, sanitized before use
    pub title: Option<String>,
}

impl MediaQuery {
    fn to_request(&self) -> Result<MediaRequest, ApiError> {
        Ok(MediaRequest::parse(
            self.url.as_deref(),
            self.tier.as_deref(),
        )?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub engine_version: String,
    pub cookies_valid: bool,
    /// Seconds since startup
    pub uptime: f64,
    pub tool_version: Option<String>,
    pub identity_profile: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = &state.health;
    Json(HealthResponse {
        status: "online",
        engine_version: health.engine_version.clone(),
        cookies_valid: health.cookies_valid,
        uptime: health.started_at.elapsed().as_secs_f64(),
        tool_version: health.tool_version.clone(),
        identity_profile: health.identity_version.clone(),
    })
}

pub async fn video_info(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let request = query.to_request()?;

    match state.resolver.resolve(&request).await {
        Ok(result) => {
            info!(url = %request.source_url, id = %result.id, "metadata resolved");
            Ok(Json(result))
        }
        Err(err) => {
            warn!(
                url = %request.source_url,
                resolver = state.resolver.name(),
                reason = ?err.reason,
                "metadata request failed"
            );
            Err(err.into())
        }
    }
}

pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Response, ApiError> {
    let request = query.to_request()?;

    let stream = match state.relay.open_stream(&request).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(
                url = %request.source_url,
                tier = %request.tier,
                relay = state.relay.name(),
                error = %err,
                stderr = err.diagnostics().unwrap_or(""),
                "stream could not start"
            );
            return Err(err.into());
        }
    };

    let delivery = stream.selector().delivery;
    let disposition = query
        .title
        .as_deref()
        .and_then(|title| attachment_disposition(title, delivery.extension));

    // Size is unknown up front, so the body goes out chunked
    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(delivery.content_type));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Some(value) = disposition {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// `attachment; filename="<stem>.<ext>"` for a client-supplied title
pub fn attachment_disposition(title: &str, extension: &str) -> Option<HeaderValue> {
    let sanitized = sanitize_title(title);
    let stem = sanitized.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem = if stem.is_empty() { "download" } else { stem.as_str() };
    HeaderValue::from_str(&format!("attachment; filename=\"{}.{}\"", stem, extension)).ok()
}
