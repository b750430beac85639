// Metadata resolver - runs `yt-dlp --dump-json` once per request
//
// No automatic retries: hammering a bot-defended source makes blocking worse,
// so the client decides whether to try again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::diagnostics::{diagnose_error, hint_for, BlockingReason};
use super::errors::{ExtractionError, ExtractionFailure, ToolError};
use super::invocation::ToolContext;
use super::models::{ExtractionResult, MediaRequest, RawMetadata};
use super::traits::MetadataResolver;
use super::utils::run_output_with_timeout;

/// Resolver backed by the yt-dlp process
pub struct YtDlpResolver {
    context: Arc<ToolContext>,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(context: Arc<ToolContext>, timeout: Duration) -> Self {
        Self { context, timeout }
    }

    /// Parse `--dump-json` output into the response DTO
    pub fn parse_json(stdout: &[u8]) -> Result<ExtractionResult, String> {
        // Some extractors print a line per entry; the first document wins
        let text = String::from_utf8_lossy(stdout);
        let first = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| "Extraction tool printed nothing".to_string())?;

        let raw: RawMetadata =
            serde_json::from_str(first).map_err(|e| format!("Invalid JSON: {}", e))?;
        ExtractionResult::from_raw(raw)
    }

    fn failure(&self, failure: ExtractionFailure, details: String) -> ExtractionError {
        let cookies_valid = self.context.cookies_valid();
        let reason = match failure {
            ExtractionFailure::Timeout => BlockingReason::NetworkTimeout,
            _ => diagnose_error(&details),
        };
        ExtractionError {
            failure,
            hint: hint_for(reason, cookies_valid),
            details,
            cookies_valid,
            reason,
        }
    }
}

#[async_trait]
impl MetadataResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, request: &MediaRequest) -> Result<ExtractionResult, ExtractionError> {
        let launcher = &self.context.launcher;
        let args = self.context.metadata_args(request);
        info!(url = %request.source_url, command = %launcher.describe(&args), "resolving metadata");

        let output = run_output_with_timeout(
            launcher.command(&args),
            launcher.program(),
            self.timeout.as_secs().max(1),
        )
        .await
        .map_err(|e| match e {
            ToolError::Timeout { .. } => self.failure(ExtractionFailure::Timeout, e.to_string()),
            other => self.failure(ExtractionFailure::Launch, other.to_string()),
        });

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!(url = %request.source_url, error = %err, "metadata resolution failed");
                return Err(err);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let details = if stderr.is_empty() {
                format!("yt-dlp exited with {}", output.status)
            } else {
                stderr
            };
            let err = self.failure(ExtractionFailure::ToolExited, details);
            warn!(
                url = %request.source_url,
                status = %output.status,
                reason = err.reason.description(),
                permanent = err.reason.is_permanent(),
                cookies_valid = err.cookies_valid,
                "metadata resolution failed"
            );
            return Err(err);
        }

        Self::parse_json(&output.stdout).map_err(|details| {
            warn!(url = %request.source_url, error = %details, "unreadable metadata");
            self.failure(ExtractionFailure::MalformedOutput, details)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::cookies::CookieJar;
    use crate::downloader::identity::ClientIdentityProfile;
    use crate::downloader::models::{NetworkConfig, QualityTier};
    use crate::downloader::tools::ToolLauncher;

    const SAMPLE: &str = r#"{"id":"dQw4w9WgXcQ","title":"Official Video! #1 (HD)","thumbnail":"https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg","duration":213,"duration_string":"3:33","view_count":1500000000,"uploader":"Rick Astley","filesize_approx":12582912,"formats":[]}"#;

    fn resolver_with_script(script: &str) -> YtDlpResolver {
        let launcher = ToolLauncher::new(
            "/bin/sh",
            vec!["-c".to_string(), script.to_string(), "fake-yt-dlp".to_string()],
        );
        let context = ToolContext::new(
            launcher,
            CookieJar::disabled(),
            ClientIdentityProfile::latest(),
            NetworkConfig::default(),
        );
        YtDlpResolver::new(Arc::new(context), Duration::from_secs(5))
    }

    fn request() -> MediaRequest {
        MediaRequest::parse(Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), None).unwrap()
    }

    #[test]
    fn test_parse_json() {
        let result = YtDlpResolver::parse_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.id, "dQw4w9WgXcQ");
        assert_eq!(result.duration, "3:33");
        assert_eq!(result.view_count, "1,500,000,000");
        assert_eq!(result.filesize_raw, Some(12_582_912));
        assert_eq!(result.filesize_formatted, "12.00 MB");
        assert_eq!(result.clean_name, "Official Video 1 HD");
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(YtDlpResolver::parse_json(b"<html>").is_err());
        assert!(YtDlpResolver::parse_json(b"").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_success() {
        let resolver = resolver_with_script(&format!("printf '%s\\n' '{}'", SAMPLE));
        let result = resolver.resolve(&request()).await.unwrap();
        assert_eq!(result.title, "Official Video! #1 (HD)");
        assert_eq!(result.uploader, "Rick Astley");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_receives_url_last() {
        // Echo the last argument back as the id
        let script = r#"for last; do :; done; printf '{"id":"%s","title":"t"}' "$last""#;
        let resolver = resolver_with_script(script);
        let result = resolver.resolve(&request()).await.unwrap();
        assert_eq!(result.id, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_bot_detection() {
        let resolver = resolver_with_script(
            "echo \"ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot\" >&2; exit 1",
        );
        let err = resolver.resolve(&request()).await.unwrap_err();
        assert_eq!(err.failure, ExtractionFailure::ToolExited);
        assert_eq!(err.reason, BlockingReason::BotDetection);
        assert!(err.details.contains("not a bot"));
        assert!(!err.cookies_valid);
        assert!(err.hint.contains("cookies"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_malformed_output() {
        let resolver = resolver_with_script("echo 'not json'");
        let err = resolver.resolve(&request()).await.unwrap_err();
        assert_eq!(err.failure, ExtractionFailure::MalformedOutput);
    }

    #[tokio::test]
    async fn test_resolve_missing_tool() {
        let context = ToolContext::new(
            ToolLauncher::native("/nonexistent/yt-dlp"),
            CookieJar::disabled(),
            ClientIdentityProfile::latest(),
            NetworkConfig::default(),
        );
        let resolver = YtDlpResolver::new(Arc::new(context), Duration::from_secs(5));
        let err = resolver
            .resolve(&MediaRequest::parse(Some("https://example.com/v"), Some(QualityTier::P720.as_query())).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.failure, ExtractionFailure::Launch);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_times_out() {
        let context = ToolContext::new(
            ToolLauncher::new(
                "/bin/sh",
                vec!["-c".to_string(), "exec sleep 30".to_string()],
            ),
            CookieJar::disabled(),
            ClientIdentityProfile::latest(),
            NetworkConfig::default(),
        );
        let resolver = YtDlpResolver::new(Arc::new(context), Duration::from_secs(1));
        let err = resolver.resolve(&request()).await.unwrap_err();
        assert_eq!(err.failure, ExtractionFailure::Timeout);
        assert_eq!(err.reason, BlockingReason::NetworkTimeout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_bounded_when_pipes_outlive_tool() {
        let context = ToolContext::new(
            ToolLauncher::new(
                "/bin/sh",
                vec!["-c".to_string(), "sleep 6 & exit 1".to_string()],
            ),
            CookieJar::disabled(),
            ClientIdentityProfile::latest(),
            NetworkConfig::default(),
        );
        let resolver = YtDlpResolver::new(Arc::new(context), Duration::from_secs(1));

        let started = std::time::Instant::now();
        let err = resolver.resolve(&request()).await.unwrap_err();
        assert_eq!(err.failure, ExtractionFailure::Timeout);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
