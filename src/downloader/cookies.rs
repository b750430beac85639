// Cookie jar normalization
//
// yt-dlp only accepts cookie files that start with the Netscape header.
// Browser export extensions are inconsistent about it (and about BOMs), so the
// operator-supplied file is normalized once at startup into a derived artifact
// that every request then references read-only.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Header line yt-dlp requires at the top of a cookie file
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, thiserror::Error)]
enum CookieError {
    #[error("cookie file {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cookie file {path} is empty")]
    Empty { path: PathBuf },

    #[error("normalized cookie file {path} could not be written: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Normalize cookie file text.
///
/// Strips a leading BOM, trims surrounding whitespace and prepends the
/// Netscape header when missing. Cookie lines are left untouched. Returns
/// `None` when nothing remains. Normalizing the output again is a no-op.
pub fn normalize_cookie_text(raw: &str) -> Option<String> {
    let content = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw).trim();
    if content.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(content.len() + NETSCAPE_HEADER.len() + 2);
    if !content.starts_with(NETSCAPE_HEADER) {
        normalized.push_str(NETSCAPE_HEADER);
        normalized.push('\n');
    }
    normalized.push_str(content);
    normalized.push('\n');
    Some(normalized)
}

/// Credentials available to the extraction tool.
///
/// Built once at startup and shared read-only. An invalid jar is never an
/// error: requests simply go out unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    source: Option<PathBuf>,
    artifact: Option<PathBuf>,
    normalized: Option<String>,
}

impl CookieJar {
    /// A jar with no credentials
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Read `source`, normalize it and write the result to `artifact`.
    ///
    /// Any failure (missing file, unreadable file, unwritable artifact)
    /// yields an invalid jar and a log line.
    pub async fn load(source: &Path, artifact: &Path) -> Self {
        match Self::try_load(source, artifact).await {
            Ok(Some(normalized)) => {
                info!(
                    source = %source.display(),
                    artifact = %artifact.display(),
                    "cookie jar normalized"
                );
                Self {
                    source: Some(source.to_path_buf()),
                    artifact: Some(artifact.to_path_buf()),
                    normalized: Some(normalized),
                }
            }
            Ok(None) => {
                info!(source = %source.display(), "no cookie file, requests will be unauthenticated");
                Self {
                    source: Some(source.to_path_buf()),
                    ..Self::default()
                }
            }
            Err(e) => {
                warn!(error = %e, "ignoring cookie file, requests will be unauthenticated");
                Self {
                    source: Some(source.to_path_buf()),
                    ..Self::default()
                }
            }
        }
    }

    async fn try_load(source: &Path, artifact: &Path) -> Result<Option<String>, CookieError> {
        let raw = match tokio::fs::read(source).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source_err) => {
                return Err(CookieError::Read {
                    path: source.to_path_buf(),
                    source: source_err,
                })
            }
        };

        let text = String::from_utf8_lossy(&raw);
        let normalized = normalize_cookie_text(&text).ok_or_else(|| CookieError::Empty {
            path: source.to_path_buf(),
        })?;

        if let Some(parent) = artifact.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CookieError::Write {
                    path: artifact.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(artifact, normalized.as_bytes())
            .await
            .map_err(|e| CookieError::Write {
                path: artifact.to_path_buf(),
                source: e,
            })?;

        Ok(Some(normalized))
    }

    pub fn is_valid(&self) -> bool {
        self.artifact.is_some()
    }

    /// Operator-supplied file this jar was loaded from
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Normalized file handed to the extraction tool
    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    pub fn normalized_text(&self) -> Option<&str> {
        self.normalized.as_deref()
    }

    /// `--cookies <artifact>` for a valid jar, nothing otherwise
    pub fn cookie_args(&self) -> Vec<String> {
        match &self.artifact {
            Some(path) => vec![
                "--cookies".to_string(),
                path.to_string_lossy().to_string(),
            ],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOKIE_LINES: &str = ".youtube.com\tTRUE\t/\tTRUE\t1767225600\tPREF\tf6=40000000\n\
                                .youtube.com\tTRUE\t/\tTRUE\t1767225600\tSID\tabc123";

    #[test]
    fn test_prepends_header() {
        let normalized = normalize_cookie_text(COOKIE_LINES).unwrap();
        assert!(normalized.starts_with(NETSCAPE_HEADER));
        for line in COOKIE_LINES.lines() {
            assert!(normalized.lines().any(|l| l == line));
        }
    }

    #[test]
    fn test_strips_bom_and_whitespace() {
        let raw = format!("\u{feff}\n\n  {}\n{}\n\n", NETSCAPE_HEADER, COOKIE_LINES);
        let normalized = normalize_cookie_text(&raw).unwrap();
        assert!(normalized.starts_with(NETSCAPE_HEADER));
        assert_eq!(normalized.matches(NETSCAPE_HEADER).count(), 1);
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            COOKIE_LINES.to_string(),
            format!("\u{feff}{}", COOKIE_LINES),
            format!("{}\n{}\n", NETSCAPE_HEADER, COOKIE_LINES),
        ] {
            let once = normalize_cookie_text(&raw).unwrap();
            let twice = normalize_cookie_text(&once).unwrap();
            assert_eq!(once.as_bytes(), twice.as_bytes());
        }
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(normalize_cookie_text("").is_none());
        assert!(normalize_cookie_text("\u{feff}  \n\t").is_none());
    }

    #[tokio::test]
    async fn test_missing_file_yields_invalid_jar() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::load(
            &dir.path().join("cookies.txt"),
            &dir.path().join("normalized.txt"),
        )
        .await;

        assert!(!jar.is_valid());
        assert!(jar.cookie_args().is_empty());
        assert!(!dir.path().join("normalized.txt").exists());
    }

    #[tokio::test]
    async fn test_load_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cookies.txt");
        let artifact = dir.path().join("cache").join("normalized.txt");
        std::fs::write(&source, format!("\u{feff}{}\n", COOKIE_LINES)).unwrap();

        let jar = CookieJar::load(&source, &artifact).await;

        assert!(jar.is_valid());
        let written = std::fs::read_to_string(&artifact).unwrap();
        assert!(written.starts_with(NETSCAPE_HEADER));
        assert_eq!(jar.normalized_text(), Some(written.as_str()));
        assert_eq!(
            jar.cookie_args(),
            vec!["--cookies".to_string(), artifact.to_string_lossy().to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_file_yields_invalid_jar() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cookies.txt");
        std::fs::write(&source, "\n  \n").unwrap();

        let jar = CookieJar::load(&source, &dir.path().join("normalized.txt")).await;
        assert!(!jar.is_valid());
    }

    #[tokio::test]
    async fn test_unwritable_artifact_yields_invalid_jar() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cookies.txt");
        std::fs::write(&source, COOKIE_LINES).unwrap();
        // A directory where the artifact file should go
        let artifact = dir.path().join("taken");
        std::fs::create_dir(&artifact).unwrap();

        let jar = CookieJar::load(&source, &artifact).await;
        assert!(!jar.is_valid());
        assert!(jar.cookie_args().is_empty());
    }
}
