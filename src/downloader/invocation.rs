// Argument lists for the extraction tool
//
// Resolution and streaming share the same safety, identity, network and
// credential flags; only the output directive and the tier-specific tail
// differ. Everything here is pure.

use std::sync::Arc;

use super::cookies::CookieJar;
use super::format_selector::FormatSelector;
use super::identity::ClientIdentityProfile;
use super::models::{MediaRequest, NetworkConfig};
use super::tools::ToolLauncher;
use super::utils::{get_proxy_args, get_timeout_args};

/// Throughput tuning for streaming invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTuning {
    /// yt-dlp `--buffer-size` value
    pub buffer_size: String,
    /// Parallel fragment downloads for segmented sources
    pub concurrent_fragments: u32,
}

impl Default for StreamTuning {
    fn default() -> Self {
        Self {
            buffer_size: "1M".to_string(),
            concurrent_fragments: 16,
        }
    }
}

/// Read-only state shared by every invocation, built once at startup
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub launcher: ToolLauncher,
    pub cookies: Arc<CookieJar>,
    pub identity: Arc<ClientIdentityProfile>,
    pub network: NetworkConfig,
}

impl ToolContext {
    pub fn new(
        launcher: ToolLauncher,
        cookies: CookieJar,
        identity: ClientIdentityProfile,
        network: NetworkConfig,
    ) -> Self {
        Self {
            launcher,
            cookies: Arc::new(cookies),
            identity: Arc::new(identity),
            network,
        }
    }

    pub fn cookies_valid(&self) -> bool {
        self.cookies.is_valid()
    }

    /// Flags common to resolution and streaming
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-check-certificates".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.identity.to_args(self.cookies_valid()));
        args.extend(get_timeout_args(&self.network));
        args.extend(get_proxy_args(&self.network));
        args.extend(self.cookies.cookie_args());
        args
    }

    /// Single-shot metadata dump. Tier-independent.
    pub fn metadata_args(&self, request: &MediaRequest) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.common_args());
        args.push("--youtube-skip-dash-manifest".to_string());
        args.push(request.source_url.to_string());
        args
    }

    /// Media bytes to stdout for the request's tier
    pub fn stream_args(
        &self,
        request: &MediaRequest,
        selector: &FormatSelector,
        tuning: &StreamTuning,
    ) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "-".to_string()];
        args.extend(self.common_args());
        args.extend([
            "--buffer-size".to_string(),
            tuning.buffer_size.clone(),
            "--no-part".to_string(),
            "--concurrent-fragments".to_string(),
            tuning.concurrent_fragments.to_string(),
        ]);
        args.extend(selector.to_args());
        args.push(request.source_url.to_string());
        args
    }
}
