//! Configuration loading
//!
//! Settings come from CLI flags. The provider credential comes from
//! `--api-key` or the `ETHERSCAN_API_KEY` environment variable, which may
//! be supplied through a `.env` file.

use crate::service::AnalysisSettings;
use crate::source::ApiKey;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider endpoint
    pub api_url: String,
    /// Provider credential
    pub api_key: ApiKey,
    /// Analysis tunables
    pub analysis: AnalysisSettings,
}

impl Config {
    /// Build and validate a configuration.
    pub fn new(
        api_url: String,
        api_key: ApiKey,
        fetch_timeout_secs: u64,
        oracle_timeout_secs: u64,
        max_hops: usize,
    ) -> Result<Self> {
        if api_url.trim().is_empty() {
            anyhow::bail!("API URL must not be empty");
        }
        if fetch_timeout_secs == 0 || oracle_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be at least one second");
        }
        if max_hops == 0 {
            anyhow::bail!("--max-hops must be at least 1");
        }

        Ok(Self {
            api_url,
            api_key,
            analysis: AnalysisSettings {
                fetch_timeout: Duration::from_secs(fetch_timeout_secs),
                oracle_timeout: Duration::from_secs(oracle_timeout_secs),
                max_hops,
            },
        })
    }
}

/// Load environment variables from a `.env` file.
///
/// With an explicit path the file must exist. Without one, a `.env` in the
/// current directory (or a parent) is loaded if present.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("Failed to load env file: {:?}", path))?;
            debug!("Loaded environment from {:?}", path);
        }
        None => {
            if let Ok(found) = dotenv::dotenv() {
                debug!("Loaded environment from {:?}", found);
            }
        }
    }
    Ok(())
}

/// Pick the credential from a flag value or the environment value.
///
/// The flag wins. Blank values count as missing.
pub fn resolve_api_key(flag: Option<String>, env_value: Option<String>) -> Result<ApiKey> {
    flag.into_iter()
        .chain(env_value)
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .map(ApiKey::new)
        .with_context(|| format!("Missing {} (set it in the environment or a .env file)", API_KEY_ENV))
}

/// Read the credential, falling back to the process environment.
pub fn api_key(flag: Option<String>) -> Result<ApiKey> {
    resolve_api_key(flag, std::env::var(API_KEY_ENV).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_env_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# provider settings").unwrap();
        writeln!(file, "FUNDFLOW_TEST_LOADED_KEY=abc123").unwrap();
        file.flush().unwrap();

        load_env_file(Some(file.path())).unwrap();
        assert_eq!(std::env::var("FUNDFLOW_TEST_LOADED_KEY").unwrap(), "abc123");
    }

    #[test]
    fn test_load_env_file_missing() {
        let result = load_env_file(Some(Path::new("/nonexistent/fundflow/.env")));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_api_key_precedence() {
        let key = resolve_api_key(Some("flag".into()), Some("env".into())).unwrap();
        assert_eq!(key.expose(), "flag");

        let key = resolve_api_key(None, Some("env".into())).unwrap();
        assert_eq!(key.expose(), "env");

        let key = resolve_api_key(Some("  ".into()), Some(" env ".into())).unwrap();
        assert_eq!(key.expose(), "env");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let err = resolve_api_key(None, None).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
        assert!(resolve_api_key(Some(String::new()), Some(String::new())).is_err());
    }

    #[test]
    fn test_config_validation() {
        let key = ApiKey::new("k");
        let cfg = Config::new("https://api.etherscan.io/api".into(), key.clone(), 20, 5, 16).unwrap();
        assert_eq!(cfg.analysis.fetch_timeout, Duration::from_secs(20));
        assert_eq!(cfg.analysis.max_hops, 16);

        assert!(Config::new("".into(), key.clone(), 20, 5, 16).is_err());
        assert!(Config::new("http://x".into(), key.clone(), 0, 5, 16).is_err());
        assert!(Config::new("http://x".into(), key, 20, 5, 0).is_err());
    }
}
