// Extraction tool launcher
//
// The tool runs either as the native `yt-dlp` binary or as
// `<python> -m yt_dlp` (the Python module tends to trip fewer bot checks).

use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use super::utils::run_output_with_timeout;

/// Program plus fixed leading arguments; per-request arguments follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLauncher {
    program: String,
    leading_args: Vec<String>,
}

impl ToolLauncher {
    pub fn new(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    /// Native `yt-dlp` binary at `path`
    pub fn native(path: impl Into<String>) -> Self {
        Self::new(path, Vec::new())
    }

    /// `<interpreter> -m yt_dlp`
    pub fn python(interpreter: impl Into<String>) -> Self {
        Self::new(interpreter, vec!["-m".to_string(), "yt_dlp".to_string()])
    }

    /// Native binary from the usual install locations
    pub fn discover() -> Self {
        Self::native(find_ytdlp())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command with leading args and `args` appended. stdin is closed.
    pub fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null());
        command
    }

    /// Shell-like rendering for logs
    pub fn describe(&self, args: &[String]) -> String {
        let mut parts = Vec::with_capacity(1 + self.leading_args.len() + args.len());
        parts.push(self.program.as_str());
        parts.extend(self.leading_args.iter().map(String::as_str));
        parts.extend(args.iter().map(String::as_str));
        parts.join(" ")
    }

    /// `--version` output, or `None` if the tool cannot be run
    pub async fn probe_version(&self, timeout_secs: u64) -> Option<String> {
        let args = vec!["--version".to_string()];
        match run_output_with_timeout(self.command(&args), &self.program, timeout_secs).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!(tool = %self.describe(&[]), version = %version, "extraction tool available");
                Some(version).filter(|v| !v.is_empty())
            }
            Ok(output) => {
                debug!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "extraction tool version probe failed"
                );
                None
            }
            Err(e) => {
                debug!(error = %e, "extraction tool version probe failed");
                None
            }
        }
    }
}

impl Default for ToolLauncher {
    fn default() -> Self {
        Self::discover()
    }
}

/// Find yt-dlp executable in common paths
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip in containers
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return path;
            }
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_launcher() {
        let launcher = ToolLauncher::python("python3");
        assert_eq!(
            launcher.describe(&["--dump-json".to_string()]),
            "python3 -m yt_dlp --dump-json"
        );
    }

    #[test]
    fn test_discover_returns_something() {
        assert!(!find_ytdlp().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_version() {
        let launcher = ToolLauncher::new(
            "/bin/sh",
            vec!["-c".to_string(), "echo 2025.01.15".to_string(), "yt-dlp".to_string()],
        );
        assert_eq!(launcher.probe_version(5).await.as_deref(), Some("2025.01.15"));
    }

    #[tokio::test]
    async fn test_probe_missing_tool() {
        let launcher = ToolLauncher::native("/nonexistent/yt-dlp");
        assert_eq!(launcher.probe_version(5).await, None);
    }
}
