// Runtime configuration - command line flags with environment fallbacks

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::downloader::{NetworkConfig, RelaySettings, StreamTuning, ToolLauncher};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "youtube-relay",
    version,
    about = "Resolve media metadata and relay yt-dlp output over HTTP"
)]
pub struct GatewayConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// yt-dlp binary (searched in the usual install locations when unset)
    #[arg(long, env = "YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// Run `<python> -m yt_dlp` instead of the native binary
    #[arg(long, env = "YTDLP_PYTHON")]
    pub python: Option<String>,

    /// Netscape cookie file exported from a logged-in browser
    #[arg(long, env = "COOKIES_PATH", default_value = "cookies.txt")]
    pub cookies: PathBuf,

    /// Where the normalized cookie jar is written
    #[arg(long, env = "COOKIES_ARTIFACT")]
    pub cookies_artifact: Option<PathBuf>,

    /// Built-in client identity profile version
    #[arg(long, env = "IDENTITY_PROFILE")]
    pub identity_profile: Option<String>,

    /// JSON client identity profile (overrides --identity-profile)
    #[arg(long, env = "IDENTITY_FILE")]
    pub identity_file: Option<PathBuf>,

    /// Proxy URL handed to yt-dlp (e.g., "socks5://127.0.0.1:1080")
    #[arg(long, env = "YTDLP_PROXY")]
    pub proxy: Option<String>,

    /// yt-dlp socket timeout in seconds (0 disables the flag)
    #[arg(long, env = "YTDLP_SOCKET_TIMEOUT", default_value_t = 15)]
    pub socket_timeout: u32,

    /// Seconds a metadata lookup may take
    #[arg(long, env = "RESOLVE_TIMEOUT", default_value_t = 45)]
    pub resolve_timeout: u64,

    /// Seconds a stream may take to produce its first byte
    #[arg(long, env = "FIRST_BYTE_TIMEOUT", default_value_t = 60)]
    pub first_byte_timeout: u64,

    /// Hard cap on a single stream, in seconds
    #[arg(long, env = "MAX_STREAM_DURATION", default_value_t = 14_400)]
    pub max_stream_duration: u64,

    /// Seconds open streams get to finish once shutdown is requested
    #[arg(long, env = "SHUTDOWN_GRACE", default_value_t = 10)]
    pub shutdown_grace: u64,

    #[arg(long, env = "YTDLP_BUFFER_SIZE", default_value = "1M")]
    pub buffer_size: String,

    #[arg(long, env = "YTDLP_CONCURRENT_FRAGMENTS", default_value_t = 16)]
    pub concurrent_fragments: u32,

    /// Engine name reported by /health
    #[arg(long, env = "ENGINE_LABEL")]
    pub engine_label: Option<String>,
}

impl GatewayConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn launcher(&self) -> ToolLauncher {
        match (non_empty(&self.python), non_empty(&self.ytdlp_path)) {
            (Some(python), _) => ToolLauncher::python(python),
            (None, Some(path)) => ToolLauncher::native(path),
            (None, None) => ToolLauncher::discover(),
        }
    }

    pub fn cookies_artifact_path(&self) -> PathBuf {
        self.cookies_artifact.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("youtube-relay")
                .join("cookies.normalized.txt")
        })
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            proxy: non_empty(&self.proxy).map(str::to_string),
            socket_timeout: Some(self.socket_timeout).filter(|secs| *secs > 0),
        }
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout.max(1))
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            tuning: StreamTuning {
                buffer_size: self.buffer_size.clone(),
                concurrent_fragments: self.concurrent_fragments.max(1),
            },
            first_byte_timeout: Duration::from_secs(self.first_byte_timeout.max(1)),
            max_duration: Duration::from_secs(self.max_stream_duration.max(1)),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }

    pub fn engine_label(&self) -> String {
        non_empty(&self.engine_label)
            .map(str::to_string)
            .unwrap_or_else(|| format!("youtube-relay/{}", env!("CARGO_PKG_VERSION")))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
