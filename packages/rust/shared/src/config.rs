//! Application configuration for CampaignScope.
//!
//! User config lives at `~/.campaignscope/campaignscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CampaignScopeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "campaignscope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".campaignscope";

// ---------------------------------------------------------------------------
// Config structs (matching campaignscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Bulk analysis (stage executor) settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Competitor enhancement settings.
    #[serde(default)]
    pub enhancement: EnhanceConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the session/ledger database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

impl ServerConfig {
    /// Resolve `db_path` to an absolute path, expanding a leading `~/`.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| CampaignScopeError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        } else {
            Ok(PathBuf::from(&self.db_path))
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    4180
}
fn default_db_path() -> String {
    "~/.campaignscope/campaignscope.db".into()
}

/// `[analysis]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Endpoint of the bulk stage executor service.
    #[serde(default = "default_analysis_endpoint")]
    pub endpoint: String,

    /// Timeout for the bulk analysis call, in seconds.
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analysis_endpoint(),
            timeout_secs: default_analysis_timeout(),
        }
    }
}

fn default_analysis_endpoint() -> String {
    "http://127.0.0.1:4181/analyze".into()
}
fn default_analysis_timeout() -> u64 {
    120
}

/// `[enhancement]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceConfig {
    /// Maximum competitors enriched per batch.
    #[serde(default = "default_max_competitors")]
    pub max_competitors: usize,

    /// Maximum product listings kept per competitor.
    #[serde(default = "default_max_products")]
    pub max_products: usize,

    /// Maximum concurrent competitor fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-fetch timeout, in seconds. An expired fetch fails that
    /// competitor only.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            max_competitors: default_max_competitors(),
            max_products: default_max_products(),
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_max_competitors() -> usize {
    5
}
fn default_max_products() -> usize {
    3
}
fn default_concurrency() -> usize {
    5
}
fn default_fetch_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.campaignscope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CampaignScopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.campaignscope/campaignscope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CampaignScopeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CampaignScopeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CampaignScopeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CampaignScopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CampaignScopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
