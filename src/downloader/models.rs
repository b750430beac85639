// Common data models for the resolution and streaming engines

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::RequestError;
use super::utils::{format_duration, format_megabytes, group_thousands, sanitize_title};

/// User-facing quality tier, parsed from the `type` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityTier {
    FourK,
    Hd1080,
    P720,
    P360,
    /// Audio only, transcoded at the high bitrate
    AudioHigh,
    /// Audio only, transcoded at the low bitrate
    AudioLow,
    /// Best available single file
    #[default]
    Default,
}

impl QualityTier {
    pub const ALL: [QualityTier; 7] = [
        Self::FourK,
        Self::Hd1080,
        Self::P720,
        Self::P360,
        Self::AudioHigh,
        Self::AudioLow,
        Self::Default,
    ];

    /// Parse a `type` query value. Unknown or absent values map to `Default`
    /// since the value comes from an untrusted query string.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("4k") => Self::FourK,
            Some("hd") => Self::Hd1080,
            Some("720p") => Self::P720,
            Some("360p") => Self::P360,
            Some("audio") => Self::AudioHigh,
            Some("128k") => Self::AudioLow,
            _ => Self::Default,
        }
    }

    /// Query value that parses back to this tier
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::FourK => "4k",
            Self::Hd1080 => "hd",
            Self::P720 => "720p",
            Self::P360 => "360p",
            Self::AudioHigh => "audio",
            Self::AudioLow => "128k",
            Self::Default => "best",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// A validated media request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub source_url: Url,
    pub tier: QualityTier,
}

impl MediaRequest {
    pub fn new(source_url: Url, tier: QualityTier) -> Self {
        Self { source_url, tier }
    }

    /// Validate raw query parameters
    pub fn parse(url: Option<&str>, tier: Option<&str>) -> Result<Self, RequestError> {
        let raw = url.map(str::trim).filter(|u| !u.is_empty());
        let Some(raw) = raw else {
            return Err(RequestError::MissingUrl);
        };

        let source_url = Url::parse(raw).map_err(|e| RequestError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(source_url.scheme(), "http" | "https") {
            return Err(RequestError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", source_url.scheme()),
            });
        }
        if source_url.host_str().is_none() {
            return Err(RequestError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self::new(source_url, QualityTier::from_query(tier)))
    }
}

/// Network configuration forwarded to the extraction tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// SOCKS5/HTTP proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Socket timeout in seconds
    pub socket_timeout: Option<u32>,
}

/// Metadata document printed by `yt-dlp --dump-json`.
///
/// Only the fields the gateway projects are declared; everything is optional
/// because extractors differ in what they report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub duration_string: Option<String>,
    pub view_count: Option<u64>,
    pub uploader: Option<String>,
    pub filesize_approx: Option<f64>,
    pub filesize: Option<f64>,
}

impl RawMetadata {
    /// Approximate size first, exact size second, absent otherwise
    pub fn approximate_size(&self) -> Option<u64> {
        self.filesize_approx
            .or(self.filesize)
            .filter(|size| size.is_finite() && *size > 0.0)
            .map(|size| size as u64)
    }
}

/// Response DTO for `/video-info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    /// Display duration, e.g. "3:45"
    pub duration: String,
    /// Thousands-grouped view count, or "N/A"
    pub view_count: String,
    pub uploader: String,
    pub filesize_raw: Option<u64>,
    pub filesize_formatted: String,
    /// Filename-safe projection of the title
    pub clean_name: String,
}

impl ExtractionResult {
    /// Project a raw metadata document. `id` and `title` are required.
    pub fn from_raw(raw: RawMetadata) -> Result<Self, String> {
        let size = raw.approximate_size();

        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "Metadata has no id".to_string())?;
        let title = raw
            .title
            .ok_or_else(|| "Metadata has no title".to_string())?;

        let duration = raw
            .duration_string
            .or_else(|| raw.duration.map(format_duration))
            .unwrap_or_default();

        Ok(Self {
            clean_name: sanitize_title(&title),
            id,
            title,
            thumbnail: raw.thumbnail.unwrap_or_default(),
            duration,
            view_count: raw
                .view_count
                .map(group_thousands)
                .unwrap_or_else(|| "N/A".to_string()),
            uploader: raw.uploader.unwrap_or_default(),
            filesize_raw: size,
            filesize_formatted: format_megabytes(size),
        })
    }
}
