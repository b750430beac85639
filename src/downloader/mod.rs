// Downloader module - metadata resolution and stream relay on top of yt-dlp

pub mod cookies;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod identity;
pub mod invocation;
pub mod models;
pub mod relay;
pub mod resolver;
pub mod tools;
pub mod traits;
pub mod utils;

pub use cookies::CookieJar;
pub use diagnostics::BlockingReason;
pub use errors::{ExtractionError, RequestError, StreamError, ToolError};
pub use format_selector::FormatSelector;
pub use identity::{ClientIdentityProfile, IdentityError};
pub use invocation::{StreamTuning, ToolContext};
pub use models::{ExtractionResult, MediaRequest, NetworkConfig, QualityTier};
pub use relay::{RelaySettings, RelayStream, SessionPhase, YtDlpRelay};
pub use resolver::YtDlpResolver;
pub use tools::ToolLauncher;
pub use traits::{MetadataResolver, StreamRelay};
