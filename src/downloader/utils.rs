// Helper functions shared by the resolver and the relay

use std::process::{Output, Stdio};
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::errors::ToolError;
use super::models::NetworkConfig;

/// Longest sanitized title, in characters
pub const CLEAN_NAME_MAX_CHARS: usize = 50;

lazy_static! {
    static ref UNSAFE_TITLE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_\s]").unwrap();
}

/// Run a command to completion, killing it if it outlives `timeout_secs`
pub async fn run_output_with_timeout(
    mut command: Command,
    program: &str,
    timeout_secs: u64,
) -> Result<Output, ToolError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| ToolError::MissingPipe {
        program: program.to_string(),
        stream: "stdout",
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| ToolError::MissingPipe {
        program: program.to_string(),
        stream: "stderr",
    })?;

    // Drain both pipes concurrently so a chatty stderr cannot stall stdout
    let mut stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|source| ToolError::Read {
                stream: "stdout",
                source,
            })?;
        Ok::<Vec<u8>, ToolError>(buf)
    });
    let mut stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|source| ToolError::Read {
                stream: "stderr",
                source,
            })?;
        Ok::<Vec<u8>, ToolError>(buf)
    });

    // One budget covers the exit and the drain: a grandchild that inherited
    // the pipes can hold them open after the tool itself has exited
    let collected = timeout(Duration::from_secs(timeout_secs), async {
        let status = child.wait().await.map_err(|source| ToolError::Wait {
            program: program.to_string(),
            source,
        })?;
        let stdout = join_pipe(&mut stdout_task, "stdout").await?;
        let stderr = join_pipe(&mut stderr_task, "stderr").await?;
        Ok::<Output, ToolError>(Output {
            status,
            stdout,
            stderr,
        })
    })
    .await;

    match collected {
        Ok(result) => result,
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ToolError::Timeout { secs: timeout_secs })
        }
    }
}

async fn join_pipe(
    task: &mut tokio::task::JoinHandle<Result<Vec<u8>, ToolError>>,
    stream: &'static str,
) -> Result<Vec<u8>, ToolError> {
    task.await.map_err(|e| ToolError::Read {
        stream,
        source: std::io::Error::other(e),
    })?
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(timeout) = config.socket_timeout {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }

    args
}

/// Filename-safe projection of a title: drops everything except ASCII
/// letters, digits, underscore and whitespace, then caps the length.
pub fn sanitize_title(title: &str) -> String {
    UNSAFE_TITLE_CHARS
        .replace_all(title, "")
        .chars()
        .take(CLEAN_NAME_MAX_CHARS)
        .collect()
}

/// "12.34 MB" for known sizes, "Dynamic Size" otherwise
pub fn format_megabytes(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) if b > 0 => format!("{:.2} MB", b as f64 / 1_048_576.0),
        _ => "Dynamic Size".to_string(),
    }
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Seconds -> "M:SS" or "H:MM:SS", matching yt-dlp's duration_string
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
