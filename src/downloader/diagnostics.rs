// Blocking diagnostics - classifies extraction tool failures
//
// Maps raw stderr from the extraction tool to:
// - A coarse reason (bot detection, 403, geo block, ...)
// - A hint the client can act on without reading tool output

use serde::Serialize;

/// Reasons an upstream source refuses or fails a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    /// Automated-traffic detection ("confirm you're not a bot", captcha)
    BotDetection,

    /// 429 or explicit rate limiting
    RateLimited,

    /// HTTP 403 without a more specific explanation
    Http403Forbidden,

    /// Proof of Origin token required by the player client
    PoTokenRequired,

    /// SABR streaming hides the usable formats for this client
    SabrStreaming,

    AgeRestricted,

    GeoBlocked,

    PrivateVideo,

    /// Deleted, removed, or otherwise gone
    VideoUnavailable,

    /// DRM or paid content; no workaround exists
    DrmProtected,

    MembersOnly,

    /// Socket timeout or unreachable network
    NetworkTimeout,

    /// Source URL not handled by any extractor
    UnsupportedUrl,

    Unknown,
}

impl BlockingReason {
    /// Check if fresh cookies might change the outcome
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::BotDetection
                | Self::Http403Forbidden
                | Self::PoTokenRequired
                | Self::SabrStreaming
                | Self::AgeRestricted
                | Self::PrivateVideo
                | Self::MembersOnly
        )
    }

    /// Check if this is a permanent restriction (no workaround)
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::BotDetection => "Source flagged the request as automated traffic",
            Self::RateLimited => "Rate limited by the source",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::SabrStreaming => "SABR streaming protection active",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::Unknown => "Unknown failure",
        }
    }
}

/// Analyze tool diagnostics and return the most specific blocking reason
pub fn diagnose_error(error: &str) -> BlockingReason {
    let lower = error.to_lowercase();

    // Permanent restrictions first, their messages often mention "sign in" too
    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("requires purchase")
        || lower.contains("this video requires payment")
        || lower.contains("youtube premium")
    {
        return BlockingReason::DrmProtected;
    }

    if lower.contains("members only")
        || lower.contains("members-only")
        || lower.contains("join this channel")
        || lower.contains("available to members")
    {
        return BlockingReason::MembersOnly;
    }

    if lower.contains("po token") || lower.contains("proof of origin") {
        return BlockingReason::PoTokenRequired;
    }

    if lower.contains("sabr") {
        return BlockingReason::SabrStreaming;
    }

    if lower.contains("age-restricted") || lower.contains("confirm your age") {
        return BlockingReason::AgeRestricted;
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return BlockingReason::PrivateVideo;
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return BlockingReason::VideoUnavailable;
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
    {
        return BlockingReason::GeoBlocked;
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        return BlockingReason::RateLimited;
    }

    if lower.contains("not a bot")
        || lower.contains("bot detection")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
        || lower.contains("automated")
    {
        return BlockingReason::BotDetection;
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return BlockingReason::Http403Forbidden;
    }

    if lower.contains("unsupported url") {
        return BlockingReason::UnsupportedUrl;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return BlockingReason::NetworkTimeout;
    }

    BlockingReason::Unknown
}

/// Build a client-facing hint for a failure reason
pub fn hint_for(reason: BlockingReason, cookies_valid: bool) -> String {
    let mut hint = match reason {
        BlockingReason::BotDetection => {
            "Source flagged this request as automated traffic. Refresh the server's cookies.txt \
             from a logged-in browser, then retry later."
                .to_string()
        }
        BlockingReason::RateLimited => {
            "Source is rate-limiting this server. Wait 10-15 minutes before retrying.".to_string()
        }
        BlockingReason::Http403Forbidden => {
            "Source denied access. Refresh cookies or update the client identity profile."
                .to_string()
        }
        BlockingReason::PoTokenRequired | BlockingReason::SabrStreaming => {
            "The spoofed player client is no longer accepted. Rotate the client identity profile \
             or update yt-dlp."
                .to_string()
        }
        BlockingReason::AgeRestricted => {
            "Age-restricted video. Provide cookies from an adult, logged-in account.".to_string()
        }
        BlockingReason::PrivateVideo => {
            "Private video. Only cookies from an authorized account can open it.".to_string()
        }
        BlockingReason::MembersOnly => {
            "Members-only video. Provide cookies from an account with channel membership."
                .to_string()
        }
        BlockingReason::GeoBlocked => {
            "Video is blocked in the server's region. Configure a proxy in an allowed region."
                .to_string()
        }
        BlockingReason::VideoUnavailable => {
            "Video was removed or is no longer available.".to_string()
        }
        BlockingReason::DrmProtected => {
            "DRM-protected content cannot be downloaded.".to_string()
        }
        BlockingReason::NetworkTimeout => {
            "Source did not respond in time. Check server connectivity, then retry.".to_string()
        }
        BlockingReason::UnsupportedUrl => {
            "URL is not supported by the extraction tool. Check the link.".to_string()
        }
        BlockingReason::Unknown => {
            "Check that python3 and yt-dlp are installed and up to date on the server.".to_string()
        }
    };

    if !cookies_valid && reason.cookies_might_help() {
        hint.push_str(" No valid cookies are loaded on the server.");
    }

    hint
}
