// Stream relay - pipes yt-dlp stdout straight into an HTTP body
//
// A session owns the child process through a supervisor task. The body
// stream holds a drop guard on the session's cancellation token: when the
// client goes away the body is dropped, the token fires and the supervisor
// kills the child. When the child exits first, the body sees EOF, checks the
// exit status, and either ends cleanly or errors so the connection is cut.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::io::ReaderStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::errors::{StreamError, ToolError};
use super::format_selector::FormatSelector;
use super::invocation::{StreamTuning, ToolContext};
use super::models::MediaRequest;
use super::traits::StreamRelay;

/// Diagnostic lines kept from the tool's stderr
const STDERR_TAIL_LINES: usize = 20;

/// Read size for stdout chunks
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// How long to wait for the stderr reader after the child exited
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long the tool may keep running after closing stdout
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Consecutive stderr read errors tolerated before the reader gives up
const STDERR_MAX_READ_ERRORS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub tuning: StreamTuning,
    /// Budget for the tool to emit its first byte
    pub first_byte_timeout: Duration,
    /// Hard cap on a single session, including time spent streaming
    pub max_duration: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            tuning: StreamTuning::default(),
            first_byte_timeout: Duration::from_secs(60),
            max_duration: Duration::from_secs(4 * 60 * 60),
        }
    }
}

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Launching,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Launching => "launching",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media byte stream handed to the gateway.
///
/// Dropping it before the end terminates the producing process.
pub struct RelayStream {
    selector: &'static FormatSelector,
    pid: Option<u32>,
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl RelayStream {
    /// Wrap an arbitrary byte stream (no process attached)
    pub fn from_stream<S>(selector: &'static FormatSelector, stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            selector,
            pid: None,
            inner: stream.boxed(),
        }
    }

    /// Format row the bytes were produced with
    pub fn selector(&self) -> &'static FormatSelector {
        self.selector
    }

    /// Producing process id, if a process is attached
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Stream for RelayStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStream")
            .field("tier", &self.selector.tier)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Bounded ring of the most recent stderr lines
#[derive(Clone, Default)]
struct StderrTail(Arc<Mutex<VecDeque<String>>>);

impl StderrTail {
    fn push(&self, line: String) {
        if let Ok(mut lines) = self.0.lock() {
            if lines.len() == STDERR_TAIL_LINES {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    fn joined(&self) -> String {
        self.0
            .lock()
            .map(|lines| lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }
}

/// How the child ended, as seen by the supervisor
#[derive(Debug)]
enum SessionEnd {
    Exited(ExitStatus),
    Killed(&'static str),
    WaitFailed(io::Error),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(status) => write!(f, "{}", status),
            Self::Killed(cause) => write!(f, "killed ({})", cause),
            Self::WaitFailed(e) => write!(f, "wait failed: {}", e),
        }
    }
}

enum Trigger {
    Exited(io::Result<ExitStatus>),
    Cancelled,
    Expired,
}

/// Wait for the child, killing it on cancellation or when the session
/// outlives `max_duration`.
async fn supervise(
    mut child: Child,
    pid: u32,
    cancel: CancellationToken,
    max_duration: Duration,
    exit_tx: oneshot::Sender<SessionEnd>,
) {
    let trigger = tokio::select! {
        status = child.wait() => Trigger::Exited(status),
        _ = cancel.cancelled() => Trigger::Cancelled,
        _ = tokio::time::sleep(max_duration) => Trigger::Expired,
    };

    let end = match trigger {
        Trigger::Exited(Ok(status)) => SessionEnd::Exited(status),
        Trigger::Exited(Err(e)) => SessionEnd::WaitFailed(e),
        Trigger::Cancelled => {
            kill_child(&mut child, pid).await;
            SessionEnd::Killed("client disconnected")
        }
        Trigger::Expired => {
            warn!(pid, max_secs = max_duration.as_secs(), "stream exceeded maximum duration");
            kill_child(&mut child, pid).await;
            SessionEnd::Killed("maximum stream duration reached")
        }
    };

    debug!(pid, end = %end, "extraction tool finished");
    // Nobody listening means the body is already gone
    let _ = exit_tx.send(end);
}

async fn kill_child(child: &mut Child, pid: u32) {
    if let Err(e) = child.kill().await {
        // Already reaped is the common case here
        debug!(pid, error = %e, "failed to kill extraction tool");
    }
}

fn spawn_stderr_reader(stderr: ChildStderr, pid: u32, tail: StderrTail) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Raw lines: progress output is not guaranteed to be UTF-8, and the
        // pipe must stay open for as long as the tool writes to it
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        let mut read_errors = 0;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    read_errors = 0;
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if line.contains("ERROR") {
                        warn!(pid, "yt-dlp: {}", line);
                    } else {
                        debug!(pid, "yt-dlp: {}", line);
                    }
                    tail.push(line);
                }
                Err(e) => {
                    read_errors += 1;
                    debug!(pid, error = %e, "stderr read failed");
                    if read_errors >= STDERR_MAX_READ_ERRORS {
                        break;
                    }
                }
            }
        }
    })
}

/// One running tool process and its bookkeeping
struct Session {
    pid: u32,
    url: String,
    phase: SessionPhase,
    bytes: u64,
    started: Instant,
    reader: ReaderStream<ChildStdout>,
    exit_rx: Option<oneshot::Receiver<SessionEnd>>,
    /// Armed until the child is known to have exited
    guard: Option<DropGuard>,
    tail: StderrTail,
    stderr_task: Option<JoinHandle<()>>,
    /// Bound on waiting for the exit once stdout is closed
    exit_grace: Duration,
}

impl Session {
    fn enter(&mut self, phase: SessionPhase) {
        info!(
            pid = self.pid,
            url = %self.url,
            from = %self.phase,
            phase = %phase,
            bytes = self.bytes,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "stream session"
        );
        self.phase = phase;
    }

    /// Wait for the supervisor's verdict and the rest of stderr.
    ///
    /// `None` means the tool is still running `exit_grace` after stdout
    /// closed; the guard is left armed for the caller to abandon.
    async fn wait_exit(&mut self) -> Option<SessionEnd> {
        let end = match self.exit_rx.take() {
            Some(rx) => match timeout(self.exit_grace, rx).await {
                Ok(received) => received.unwrap_or(SessionEnd::Killed("supervisor gone")),
                Err(_) => return None,
            },
            None => SessionEnd::Killed("supervisor gone"),
        };
        // The child is gone either way; nothing left to kill
        if let Some(guard) = self.guard.take() {
            guard.disarm();
        }
        if let Some(task) = self.stderr_task.take() {
            if timeout(STDERR_DRAIN_TIMEOUT, task).await.is_err() {
                debug!(pid = self.pid, "stderr still open after exit");
            }
        }
        Some(end)
    }

    /// Terminate the child and mark the session failed
    fn abandon(&mut self, cause: &str) {
        warn!(pid = self.pid, cause, "terminating extraction tool");
        // Dropping the armed guard cancels the token
        drop(self.guard.take());
        self.enter(SessionPhase::Failed);
    }

    /// Stdout reached EOF: decide between a clean end and a cut connection
    async fn finish(&mut self) -> io::Result<()> {
        let Some(end) = self.wait_exit().await else {
            self.abandon("stdout closed but the tool kept running");
            return Err(io::Error::other("extraction tool closed its output without exiting"));
        };
        match end {
            SessionEnd::Exited(status) if status.success() => {
                self.enter(SessionPhase::Completed);
                Ok(())
            }
            end => {
                let tail = self.tail.joined();
                error!(
                    pid = self.pid,
                    url = %self.url,
                    bytes = self.bytes,
                    end = %end,
                    stderr = %tail,
                    "extraction tool failed mid-stream"
                );
                self.enter(SessionPhase::Failed);
                Err(io::Error::other(format!("extraction tool {}", end)))
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.guard.is_some() && !self.phase.is_terminal() {
            self.enter(SessionPhase::Aborted);
        }
    }
}

async fn next_chunk(state: Option<Session>) -> Option<(io::Result<Bytes>, Option<Session>)> {
    let mut session = state?;
    match session.reader.next().await {
        Some(Ok(chunk)) => {
            session.bytes += chunk.len() as u64;
            Some((Ok(chunk), Some(session)))
        }
        Some(Err(e)) => {
            session.abandon("stdout read failed");
            Some((Err(e), None))
        }
        None => match session.finish().await {
            Ok(()) => None,
            Err(e) => Some((Err(e), None)),
        },
    }
}

/// Relay backed by the yt-dlp process
pub struct YtDlpRelay {
    context: Arc<ToolContext>,
    settings: RelaySettings,
}

impl YtDlpRelay {
    pub fn new(context: Arc<ToolContext>, settings: RelaySettings) -> Self {
        Self { context, settings }
    }

    fn launch(
        &self,
        request: &MediaRequest,
        selector: &FormatSelector,
    ) -> Result<Session, StreamError> {
        let launcher = &self.context.launcher;
        let program = launcher.program();
        let args = self
            .context
            .stream_args(request, selector, &self.settings.tuning);
        debug!(command = %launcher.describe(&args), "spawning extraction tool");

        let mut command = launcher.command(&args);
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let pid = child.id().unwrap_or_default();
        let stdout = child.stdout.take().ok_or_else(|| ToolError::MissingPipe {
            program: program.to_string(),
            stream: "stdout",
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ToolError::MissingPipe {
            program: program.to_string(),
            stream: "stderr",
        })?;

        let tail = StderrTail::default();
        let stderr_task = spawn_stderr_reader(stderr, pid, tail.clone());

        let cancel = CancellationToken::new();
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(supervise(
            child,
            pid,
            cancel.clone(),
            self.settings.max_duration,
            exit_tx,
        ));

        let mut session = Session {
            pid,
            url: request.source_url.to_string(),
            phase: SessionPhase::Idle,
            bytes: 0,
            started: Instant::now(),
            reader: ReaderStream::with_capacity(stdout, READ_CHUNK_SIZE),
            exit_rx: Some(exit_rx),
            guard: Some(cancel.drop_guard()),
            tail,
            stderr_task: Some(stderr_task),
            exit_grace: self.settings.first_byte_timeout.min(EXIT_GRACE),
        };
        session.enter(SessionPhase::Launching);
        Ok(session)
    }
}

#[async_trait]
impl StreamRelay for YtDlpRelay {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn open_stream(&self, request: &MediaRequest) -> Result<RelayStream, StreamError> {
        let selector = FormatSelector::for_tier(request.tier);
        info!(url = %request.source_url, tier = %request.tier, "opening stream");

        let mut session = self.launch(request, selector)?;
        let pid = session.pid;

        // Hold the response until the first byte so pre-stream failures can
        // still be reported with a status code
        let first_byte_timeout = self.settings.first_byte_timeout;
        let first = match timeout(first_byte_timeout, session.reader.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => {
                session.abandon("stdout read failed");
                return Err(StreamError::Read(e));
            }
            Ok(None) => {
                let status = match session.wait_exit().await {
                    Some(end) => {
                        session.enter(SessionPhase::Failed);
                        end.to_string()
                    }
                    None => {
                        session.abandon("stdout closed but the tool kept running");
                        "running with stdout closed".to_string()
                    }
                };
                let stderr = session.tail.joined();
                warn!(pid, status = %status, stderr = %stderr, "extraction tool produced no output");
                return Err(StreamError::NoOutput { status, stderr });
            }
            Err(_) => {
                session.abandon("no output before first-byte timeout");
                return Err(StreamError::FirstByteTimeout {
                    secs: first_byte_timeout.as_secs(),
                });
            }
        };

        session.bytes = first.len() as u64;
        session.enter(SessionPhase::Streaming);

        let body = stream::once(futures::future::ready(Ok(first)))
            .chain(stream::unfold(Some(session), next_chunk));

        Ok(RelayStream {
            selector,
            pid: Some(pid),
            inner: body.boxed(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::downloader::cookies::CookieJar;
    use crate::downloader::identity::ClientIdentityProfile;
    use crate::downloader::models::{NetworkConfig, QualityTier};
    use crate::downloader::tools::ToolLauncher;

    fn relay_with_script(script: &str, settings: RelaySettings) -> YtDlpRelay {
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
        YtDlpRelay::new(Arc::new(context), settings)
    }

    fn request(tier: &str) -> MediaRequest {
        MediaRequest::parse(Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some(tier)).unwrap()
    }

    fn process_alive(pid: u32) -> bool {
        std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn wait_until_dead(pid: u32, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !process_alive(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        !process_alive(pid)
    }

    #[tokio::test]
    async fn test_stream_completes() {
        let relay = relay_with_script("printf 'abc'; sleep 0.1; printf 'def'", RelaySettings::default());
        let stream = relay.open_stream(&request("720p")).await.unwrap();
        assert_eq!(stream.selector().tier, QualityTier::P720);
        assert!(stream.pid().is_some());

        let chunks: Vec<io::Result<Bytes>> = stream.collect().await;
        let mut body = Vec::new();
        for chunk in chunks {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"abcdef");
    }

    #[tokio::test]
    async fn test_stream_uses_tier_expression() {
        // Print the argument following -f as the body
        let script = r#"while [ "$#" -gt 0 ]; do if [ "$1" = "-f" ]; then printf '%s' "$2"; fi; shift; done"#;
        let relay = relay_with_script(script, RelaySettings::default());
        let stream = relay.open_stream(&request("audio")).await.unwrap();
        let body: Vec<u8> = stream
            .map(|chunk| chunk.unwrap().to_vec())
            .concat()
            .await;
        assert_eq!(body, FormatSelector::for_tier(QualityTier::AudioHigh).expression.as_bytes());
    }

    #[tokio::test]
    async fn test_failure_before_output() {
        let relay = relay_with_script(
            "echo 'ERROR: [youtube] abc: Requested format is not available' >&2; exit 1",
            RelaySettings::default(),
        );
        let err = relay.open_stream(&request("4k")).await.unwrap_err();
        match err {
            StreamError::NoOutput { status, stderr } => {
                assert!(status.contains('1'));
                assert!(stderr.contains("Requested format is not available"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_exit_without_output_is_failure() {
        let relay = relay_with_script("exit 0", RelaySettings::default());
        let err = relay.open_stream(&request("hd")).await.unwrap_err();
        assert!(matches!(err, StreamError::NoOutput { .. }));
    }

    #[tokio::test]
    async fn test_failure_mid_stream_errors_body() {
        let relay = relay_with_script(
            "printf 'partial'; sleep 0.1; echo 'ERROR: fragment 3 not found' >&2; exit 1",
            RelaySettings::default(),
        );
        let stream = relay.open_stream(&request("hd")).await.unwrap();
        let chunks: Vec<io::Result<Bytes>> = stream.collect().await;

        assert_eq!(chunks.first().unwrap().as_ref().unwrap().as_ref(), b"partial");
        assert!(chunks.last().unwrap().is_err());
    }

    #[tokio::test]
    async fn test_first_byte_timeout_kills_tool() {
        let settings = RelaySettings {
            first_byte_timeout: Duration::from_millis(500),
            ..RelaySettings::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
        let relay = relay_with_script(&script, settings);

        let err = relay.open_stream(&request("hd")).await.unwrap_err();
        assert!(matches!(err, StreamError::FirstByteTimeout { .. }));

        let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(wait_until_dead(pid, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_dropping_stream_kills_tool() {
        let relay = relay_with_script(
            "while :; do printf 'xxxxxxxxxxxxxxxx'; done",
            RelaySettings::default(),
        );
        let mut stream = relay.open_stream(&request("best")).await.unwrap();
        let pid = stream.pid().unwrap();

        assert!(stream.next().await.unwrap().is_ok());
        assert!(process_alive(pid));

        drop(stream);
        assert!(wait_until_dead(pid, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_max_duration_cuts_stream() {
        let settings = RelaySettings {
            max_duration: Duration::from_secs(1),
            ..RelaySettings::default()
        };
        let relay = relay_with_script("printf 'x'; exec sleep 30", settings);
        let stream = relay.open_stream(&request("hd")).await.unwrap();

        let chunks: Vec<io::Result<Bytes>> = timeout(Duration::from_secs(10), stream.collect())
            .await
            .unwrap();
        assert!(chunks.last().unwrap().is_err());
    }

    #[tokio::test]
    async fn test_undecodable_stderr_keeps_stream_alive() {
        let script = "printf 'start'; printf '\\377\\376 bad\\n' >&2; \
                      i=0; while [ $i -lt 200 ]; do echo progress >&2; printf x; i=$((i+1)); done";
        let relay = relay_with_script(script, RelaySettings::default());
        let stream = relay.open_stream(&request("audio")).await.unwrap();

        let chunks: Vec<io::Result<Bytes>> = stream.collect().await;
        let mut body = Vec::new();
        for chunk in chunks {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body.len(), 205);
        assert!(body.starts_with(b"start"));
    }

    #[tokio::test]
    async fn test_stderr_tail_decodes_lossily() {
        let relay = relay_with_script(
            "printf '\\377 ERROR: broken\\n' >&2; exit 1",
            RelaySettings::default(),
        );
        match relay.open_stream(&request("hd")).await.unwrap_err() {
            StreamError::NoOutput { stderr, .. } => {
                assert!(stderr.contains("ERROR: broken"));
                assert!(stderr.contains('\u{FFFD}'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stdout_closed_before_output_is_bounded() {
        let settings = RelaySettings {
            first_byte_timeout: Duration::from_secs(1),
            ..RelaySettings::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec 1>&-; exec sleep 30", pid_file.display());
        let relay = relay_with_script(&script, settings);

        let started = Instant::now();
        let err = relay.open_stream(&request("hd")).await.unwrap_err();
        assert!(matches!(err, StreamError::NoOutput { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(wait_until_dead(pid, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_stdout_closed_mid_stream_is_bounded() {
        let settings = RelaySettings {
            first_byte_timeout: Duration::from_secs(1),
            ..RelaySettings::default()
        };
        let relay = relay_with_script("printf 'x'; exec 1>&-; exec sleep 30", settings);
        let stream = relay.open_stream(&request("hd")).await.unwrap();

        let chunks: Vec<io::Result<Bytes>> = timeout(Duration::from_secs(5), stream.collect())
            .await
            .unwrap();
        assert_eq!(&chunks[0].as_ref().unwrap()[..], b"x");
        assert!(chunks.last().unwrap().is_err());
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let context = ToolContext::new(
            ToolLauncher::native("/nonexistent/yt-dlp"),
            CookieJar::disabled(),
            ClientIdentityProfile::latest(),
            NetworkConfig::default(),
        );
        let relay = YtDlpRelay::new(Arc::new(context), RelaySettings::default());
        let err = relay.open_stream(&request("hd")).await.unwrap_err();
        assert!(matches!(err, StreamError::Tool(ToolError::Spawn { .. })));
    }

    #[test]
    fn test_stderr_tail_is_bounded() {
        let tail = StderrTail::default();
        for i in 0..(STDERR_TAIL_LINES + 5) {
            tail.push(format!("line {}", i));
        }
        let joined = tail.joined();
        assert_eq!(joined.lines().count(), STDERR_TAIL_LINES);
        assert!(joined.starts_with("line 5"));
    }
}
