// Error types for the resolution and streaming engines

use std::fmt;
use std::io;

use super::diagnostics::BlockingReason;

/// Invalid inbound request parameters. Surfaced as a client error before any
/// subprocess is launched.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// `url` query parameter absent or blank
    #[error("URL required")]
    MissingUrl,

    /// `url` present but not an absolute http(s) URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failures of the extraction tool process itself (not of its output).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to capture {stream} from {program}")]
    MissingPipe {
        program: String,
        stream: &'static str,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {stream}: {source}")]
    Read {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Which stage of a metadata resolution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// The tool could not be started
    Launch,
    /// The tool did not exit within the resolve timeout
    Timeout,
    /// The tool exited with a non-zero status
    ToolExited,
    /// The tool succeeded but printed something other than a metadata document
    MalformedOutput,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch => write!(f, "Extraction tool could not be launched"),
            Self::Timeout => write!(f, "Extraction timed out"),
            Self::ToolExited => write!(f, "Extraction Failed"),
            Self::MalformedOutput => write!(f, "Extraction returned unreadable metadata"),
        }
    }
}

/// Metadata resolution failure, carrying everything a client needs to
/// decide whether (and how) to retry.
#[derive(Debug, thiserror::Error)]
#[error("{failure}: {details}")]
pub struct ExtractionError {
    pub failure: ExtractionFailure,
    /// Raw diagnostic text (tool stderr or parser message)
    pub details: String,
    /// Whether a normalized cookie jar was attached to the request
    pub cookies_valid: bool,
    pub reason: BlockingReason,
    /// Human-actionable suggestion
    pub hint: String,
}

/// Streaming failures that happen before any byte reached the client.
///
/// Anything going wrong after the first byte cannot change the response
/// status, so it is reported by aborting the body instead.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Extraction tool exited ({status}) before producing output")]
    NoOutput { status: String, stderr: String },

    #[error("Extraction tool produced no output within {secs}s")]
    FirstByteTimeout { secs: u64 },

    #[error("Failed reading extraction tool output: {0}")]
    Read(#[source] io::Error),
}

impl StreamError {
    /// Diagnostic text captured from the tool, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::NoOutput { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
