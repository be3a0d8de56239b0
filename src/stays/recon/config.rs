//! Connection settings for the remote store.
//!
//! Values come from an env-style file (`KEY=value` lines, optional quotes)
//! with the process environment as a fallback. Each value has a prefixed and
//! an unprefixed key; the prefixed key wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::stays::recon::error::{ReconError, Result};

/// Default env file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env.local";

const URL_KEYS: [&str; 2] = ["VITE_SUPABASE_URL", "SUPABASE_URL"];
const API_KEY_KEYS: [&str; 2] = ["VITE_SUPABASE_ANON_KEY", "SUPABASE_ANON_KEY"];

/// Everything needed to talk to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Credential sent both as `apikey` and as the bearer token.
    pub api_key: String,
    pub table: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub const DEFAULT_TABLE: &'static str = "reservations";
    pub const DEFAULT_PAGE_SIZE: usize = 1000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: Self::DEFAULT_TABLE.to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Loads the base URL and credential from `env_file`.
    pub fn from_env_file(env_file: &Path) -> Result<Self> {
        let file_values = read_env_file(env_file)?;
        let lookup = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| file_values.get(*key).filter(|v| !v.is_empty()).cloned())
                .or_else(|| {
                    keys.iter()
                        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
                })
        };

        let base_url = lookup(&URL_KEYS);
        let api_key = lookup(&API_KEY_KEYS);
        match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Ok(Self::new(&base_url, api_key)),
            (base_url, api_key) => {
                let mut missing = Vec::new();
                if base_url.is_none() {
                    missing.push(URL_KEYS.join("/"));
                }
                if api_key.is_none() {
                    missing.push(API_KEY_KEYS.join("/"));
                }
                Err(ReconError::MissingConfig {
                    keys: missing.join(", "),
                    path: env_file.to_path_buf(),
                })
            }
        }
    }
}

/// Parses an env file into a map; a missing file yields an empty map.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        warn!(path = %path.display(), "env file not found, falling back to process environment");
        return Ok(HashMap::new());
    }

    let invalid = |err: dotenvy::Error| ReconError::InvalidEnvFile {
        path: PathBuf::from(path),
        message: err.to_string(),
    };
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(invalid)? {
        let (key, value) = item.map_err(invalid)?;
        // First occurrence wins.
        values.entry(key).or_insert_with(|| value.trim().to_string());
    }
    debug!(path = %path.display(), keys = values.len(), "loaded env file");
    Ok(values)
}
