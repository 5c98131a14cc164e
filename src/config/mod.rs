//! Configuration management.
//!
//! The reporter is configured from flags or environment variables (clap
//! reads both). Two values are required:
//!
//! - `GIST_ID` - the gist that holds `results.jsonl`
//! - `GITHUB_TOKEN` - bearer token with the `gist` scope
//!
//! Optional:
//!
//! - `REPORTER_RESULTS_DIR` - directory scanned for `*.jsonl` (default `./results`)
//! - `REPORTER_STAGING_FILE` - staging file (default `<results dir>/.gist_backup`)
//! - `REPORTER_INTERVAL_SECS` - seconds between cycles (default 180)
//! - `GITHUB_API_URL` - API base (default `https://api.github.com`)
//! - `REPORTER_HTTP_TIMEOUT_SECS` - bound on each gist request (default 30)

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::remote::{Credentials, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::scheduler::DEFAULT_INTERVAL;
use crate::sync::SyncPaths;

/// Raw settings as collected from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct ReporterSettings {
    pub gist_id: Option<String>,
    pub token: Option<String>,
    pub results_dir: Option<PathBuf>,
    pub staging_file: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub api_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

/// Validated reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub credentials: Credentials,
    pub paths: SyncPaths,
    pub interval: Duration,
    pub api_url: String,
    pub request_timeout: Duration,
}

impl ReporterConfig {
    /// Validate settings and fill in defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the gist ID or token is missing or blank,
    /// or if the interval or request timeout is zero.
    pub fn resolve(settings: ReporterSettings) -> Result<Self> {
        let gist_id = non_blank(settings.gist_id);
        let token = non_blank(settings.token);
        let (Some(gist_id), Some(token)) = (gist_id, token) else {
            return Err(Error::Config("Missing GIST_ID or GITHUB_TOKEN".to_string()));
        };

        let interval = match settings.interval_secs {
            Some(0) => {
                return Err(Error::Config("interval must be at least 1 second".to_string()));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_INTERVAL,
        };

        let request_timeout = match settings.http_timeout_secs {
            Some(0) => {
                return Err(Error::Config("HTTP timeout must be at least 1 second".to_string()));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let paths = match settings.results_dir {
            Some(dir) => SyncPaths::new(dir),
            None => SyncPaths::default(),
        };
        let paths = match settings.staging_file {
            Some(staging) => paths.with_staging_file(staging),
            None => paths,
        };

        let api_url = non_blank(settings.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            credentials: Credentials::new(gist_id, token),
            paths,
            interval,
            api_url,
            request_timeout,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ReporterSettings {
        ReporterSettings {
            gist_id: Some("abc123".to_string()),
            token: Some("ghp_token".to_string()),
            ..ReporterSettings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ReporterConfig::resolve(settings()).unwrap();
        assert_eq!(config.credentials.document_id, "abc123");
        assert_eq!(config.interval, Duration::from_secs(180));
        assert_eq!(config.paths.results_dir, PathBuf::from("./results"));
        assert_eq!(config.paths.staging_file, PathBuf::from("./results/.gist_backup"));
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_credentials() {
        for (gist_id, token) in [(None, Some("t")), (Some("g"), None), (Some("  "), Some("t"))] {
            let result = ReporterConfig::resolve(ReporterSettings {
                gist_id: gist_id.map(String::from),
                token: token.map(String::from),
                ..ReporterSettings::default()
            });
            assert!(matches!(result, Err(Error::Config(ref m)) if m.contains("GIST_ID")));
        }
    }

    #[test]
    fn test_staging_follows_results_dir() {
        let config = ReporterConfig::resolve(ReporterSettings {
            results_dir: Some(PathBuf::from("/data/results")),
            ..settings()
        })
        .unwrap();
        assert_eq!(config.paths.staging_file, PathBuf::from("/data/results/.gist_backup"));

        let config = ReporterConfig::resolve(ReporterSettings {
            results_dir: Some(PathBuf::from("/data/results")),
            staging_file: Some(PathBuf::from("/tmp/stage")),
            ..settings()
        })
        .unwrap();
        assert_eq!(config.paths.staging_file, PathBuf::from("/tmp/stage"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ReporterConfig::resolve(ReporterSettings {
            interval_secs: Some(0),
            ..settings()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_http_timeout() {
        let config = ReporterConfig::resolve(ReporterSettings {
            http_timeout_secs: Some(5),
            ..settings()
        })
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let result = ReporterConfig::resolve(ReporterSettings {
            http_timeout_secs: Some(0),
            ..settings()
        });
        assert!(matches!(result, Err(Error::Config(ref m)) if m.contains("timeout")));
    }
}
