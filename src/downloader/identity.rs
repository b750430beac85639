// Client identity profiles
//
// Which player clients and user agent the extraction tool presents upstream.
// Bot-detection countermeasures change often; a profile is swapped as a whole
// (pick another built-in version, or load one from JSON) without touching
// the resolver or the relay.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Unknown identity profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("Failed to read identity profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid identity profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid identity profile: {0}")]
    Invalid(String),
}

/// Versioned record describing the spoofed client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentityProfile {
    pub version: String,
    pub user_agent: String,
    /// Player clients in fallback order, used without credentials
    pub extractor_hints: Vec<String>,
    /// Player clients in fallback order, used when cookies are attached.
    /// Empty means "same as `extractor_hints`".
    #[serde(default)]
    pub authenticated_hints: Vec<String>,
    #[serde(default)]
    pub geo_bypass: bool,
}

struct BuiltinProfile {
    version: &'static str,
    user_agent: &'static str,
    extractor_hints: &'static [&'static str],
    authenticated_hints: &'static [&'static str],
    geo_bypass: bool,
}

/// Oldest first; the last entry is the default
const BUILTIN_PROFILES: &[BuiltinProfile] = &[
    BuiltinProfile {
        version: "2024.11-android",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        // android is less likely to be challenged without a session
        extractor_hints: &["android", "tv", "web"],
        authenticated_hints: &["web", "android"],
        geo_bypass: false,
    },
    BuiltinProfile {
        version: "2025.06-web-safari",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
        extractor_hints: &["web_safari", "ios", "tv"],
        authenticated_hints: &["web", "web_safari", "ios"],
        geo_bypass: true,
    },
];

impl ClientIdentityProfile {
    /// Versions of the compiled-in profiles, oldest first
    pub fn builtin_versions() -> Vec<&'static str> {
        BUILTIN_PROFILES.iter().map(|p| p.version).collect()
    }

    pub fn builtin(version: &str) -> Option<Self> {
        BUILTIN_PROFILES
            .iter()
            .find(|p| p.version == version)
            .map(Self::from_builtin)
    }

    /// Newest compiled-in profile
    pub fn latest() -> Self {
        match BUILTIN_PROFILES.last() {
            Some(profile) => Self::from_builtin(profile),
            None => Self {
                version: "empty".to_string(),
                user_agent: String::new(),
                extractor_hints: Vec::new(),
                authenticated_hints: Vec::new(),
                geo_bypass: false,
            },
        }
    }

    /// Pick a profile: a JSON file wins over a named built-in, which wins
    /// over the newest built-in.
    pub fn select(name: Option<&str>, file: Option<&Path>) -> Result<Self, IdentityError> {
        if let Some(path) = file {
            return Self::from_file(path);
        }
        match name {
            Some(name) => Self::builtin(name).ok_or_else(|| IdentityError::UnknownProfile {
                name: name.to_string(),
                available: Self::builtin_versions().join(", "),
            }),
            None => Ok(Self::latest()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, IdentityError> {
        let content = std::fs::read_to_string(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self =
            serde_json::from_str(&content).map_err(|source| IdentityError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        profile.validate()?;
        Ok(profile)
    }

    fn from_builtin(profile: &BuiltinProfile) -> Self {
        Self {
            version: profile.version.to_string(),
            user_agent: profile.user_agent.to_string(),
            extractor_hints: profile.extractor_hints.iter().map(|s| s.to_string()).collect(),
            authenticated_hints: profile
                .authenticated_hints
                .iter()
                .map(|s| s.to_string())
                .collect(),
            geo_bypass: profile.geo_bypass,
        }
    }

    fn validate(&self) -> Result<(), IdentityError> {
        if self.version.trim().is_empty() {
            return Err(IdentityError::Invalid("version is empty".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(IdentityError::Invalid("userAgent is empty".to_string()));
        }
        if self.extractor_hints.is_empty() {
            return Err(IdentityError::Invalid("extractorHints is empty".to_string()));
        }
        let all_hints = self.extractor_hints.iter().chain(&self.authenticated_hints);
        if let Some(bad) = all_hints.into_iter().find(|h| h.is_empty() || h.contains([',', ';'])) {
            return Err(IdentityError::Invalid(format!("bad player client '{}'", bad)));
        }
        Ok(())
    }

    /// Player clients in priority order for the current credential state
    pub fn hints_for(&self, cookies_valid: bool) -> &[String] {
        if cookies_valid && !self.authenticated_hints.is_empty() {
            &self.authenticated_hints
        } else {
            &self.extractor_hints
        }
    }

    /// Spoofing flags for one invocation
    pub fn to_args(&self, cookies_valid: bool) -> Vec<String> {
        let mut args = Vec::new();

        if !self.user_agent.is_empty() {
            args.push("--user-agent".to_string());
            args.push(self.user_agent.clone());
        }

        let hints = self.hints_for(cookies_valid);
        if !hints.is_empty() {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", hints.join(",")));
        }

        if self.geo_bypass {
            args.push("--geo-bypass".to_string());
        }

        args
    }
}

impl Default for ClientIdentityProfile {
    fn default() -> Self {
        Self::latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for version in ClientIdentityProfile::builtin_versions() {
            let profile = ClientIdentityProfile::builtin(version).unwrap();
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_latest_is_last_builtin() {
        let versions = ClientIdentityProfile::builtin_versions();
        assert_eq!(
            ClientIdentityProfile::latest().version,
            *versions.last().unwrap()
        );
    }

    #[test]
    fn test_hint_order_depends_on_cookies() {
        let profile = ClientIdentityProfile::builtin("2024.11-android").unwrap();
        assert_eq!(profile.hints_for(false)[0], "android");
        assert_eq!(profile.hints_for(true)[0], "web");
    }

    #[test]
    fn test_args() {
        let profile = ClientIdentityProfile::builtin("2024.11-android").unwrap();
        let args = profile.to_args(false);
        assert_eq!(args[0], "--user-agent");
        assert!(args.contains(&"youtube:player_client=android,tv,web".to_string()));
        assert!(!args.contains(&"--geo-bypass".to_string()));

        let latest = ClientIdentityProfile::latest();
        assert!(latest.to_args(true).contains(&"--geo-bypass".to_string()));
    }

    #[test]
    fn test_select_unknown_name() {
        let err = ClientIdentityProfile::select(Some("1999-netscape"), None).unwrap_err();
        assert!(matches!(err, IdentityError::UnknownProfile { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(
            &path,
            r#"{"version":"hotfix-1","userAgent":"UA/1.0","extractorHints":["tv_embedded","web"]}"#,
        )
        .unwrap();

        let profile = ClientIdentityProfile::select(Some("2024.11-android"), Some(&path)).unwrap();
        assert_eq!(profile.version, "hotfix-1");
        assert!(profile.authenticated_hints.is_empty());
        assert_eq!(profile.hints_for(true), profile.hints_for(false));
        assert!(!profile.geo_bypass);
    }

    #[test]
    fn test_rejects_empty_hints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(
            &path,
            r#"{"version":"bad","userAgent":"UA/1.0","extractorHints":[]}"#,
        )
        .unwrap();

        assert!(matches!(
            ClientIdentityProfile::from_file(&path),
            Err(IdentityError::Invalid(_))
        ));
    }
}
