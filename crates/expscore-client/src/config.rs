//! Configuration file and source factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use expscore_core::scoring::ScoringConfig;
use expscore_core::traits::ExperimentSource;

use crate::file::FileSource;
use crate::http::{HttpSource, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Connection settings for the coursework API.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token issued at login.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Top-level expscore configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpscoreConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Max concurrent requests when fetching several experiments.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_parallelism() -> usize {
    4
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without an explicit path:
/// 1. `expscore.toml` in the current directory
/// 2. `~/.config/expscore/config.toml`
///
/// Environment variable overrides: `EXPSCORE_BASE_URL`, `EXPSCORE_TOKEN`.
pub fn load_config_from(path: Option<&Path>) -> Result<ExpscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("expscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExpscoreConfig::default(),
    };

    if let Ok(url) = std::env::var("EXPSCORE_BASE_URL") {
        config.api.base_url = url;
    }
    if let Ok(token) = std::env::var("EXPSCORE_TOKEN") {
        config.api.token = Some(token);
    }

    tracing::debug!(
        path = ?config_path,
        base_url = %config.api.base_url,
        "loaded configuration"
    );

    Ok(config)
}

/// Parse configuration text, expanding `${VAR}` references in API settings.
pub fn parse_config_str(content: &str) -> Result<ExpscoreConfig> {
    let mut config: ExpscoreConfig = toml::from_str(content)?;
    config.api.base_url = resolve_env_vars(&config.api.base_url);
    config.api.token = config
        .api
        .token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("expscore"))
}

/// Create a record source: local files when `data_dir` is given, the REST
/// API otherwise.
pub fn create_source(
    config: &ApiConfig,
    data_dir: Option<&Path>,
) -> Result<Box<dyn ExperimentSource>> {
    match data_dir {
        Some(dir) => Ok(Box::new(FileSource::new(dir)?)),
        None => Ok(Box::new(HttpSource::new(
            Some(config.base_url.clone()),
            config.token.clone(),
            config.timeout_secs,
        )?)),
    }
}
