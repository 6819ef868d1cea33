//! Configuration loading.
//!
//! All settings live in `~/.trendscope/config.toml`; every field has a
//! default, so a missing file means "use defaults". Secrets are not stored
//! here, only the names of the environment variables that hold them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Secondary parser settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secondary (LLM) parser settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// Whether escalated queries are sent to the secondary parser.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Model spec in `<provider>/<model>` form.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the provider API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound on one secondary parse call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum response tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base URL override for an Ollama server.
    #[serde(default)]
    pub ollama_url: Option<String>,
}

impl ParserConfig {
    /// Call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            ollama_url: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rotated JSON logs. Console only when absent.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

// Default value functions for serde

fn default_enabled() -> bool {
    true
}
fn default_model() -> String {
    "gemini/gemini-2.0-flash".to_owned()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_owned()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_tokens() -> u32 {
    512
}
fn default_log_level() -> String {
    "info".to_owned()
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_or_default(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}

/// Resolve the default config directory (`~/.trendscope/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".trendscope"))
}

/// Well-known runtime file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// `~/.trendscope`.
    pub root: PathBuf,
    /// `~/.trendscope/config.toml`.
    pub config_toml: PathBuf,
    /// `~/.trendscope/.env`.
    pub env_file: PathBuf,
}

/// Resolve runtime paths under [`config_dir`].
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn runtime_paths() -> anyhow::Result<RuntimePaths> {
    let root = config_dir()?;
    Ok(RuntimePaths {
        config_toml: root.join("config.toml"),
        env_file: root.join(".env"),
        root,
    })
}
