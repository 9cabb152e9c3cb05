//! Configuration types for pagetree.
//!
//! [`Config::load`] reads `~/.config/pagetree/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::load_from`] layers an
//! explicit file over the defaults. [`Config::defaults`] returns the defaults
//! without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[remote]
index_base     = "https://ltn.hitomi.la"
content_domain = "hitomi.la"
reader_base    = "https://hitomi.la/reader"

[search]
cache_whole_index = false
max_depth         = 32

[fetch]
timeout_ms = 30000
user_agent = "pagetree/0.1"

[script]
path                  = "gg.js"
# Negative disables periodic refresh.
refresh_interval_secs = -1
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/pagetree/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub script: ScriptConfig,
}

/// `[remote]` section: where things live.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_index_base")]
    pub index_base: String,
    #[serde(default = "default_content_domain")]
    pub content_domain: String,
    #[serde(default = "default_reader_base")]
    pub reader_base: String,
}

fn default_index_base() -> String { "https://ltn.hitomi.la".to_string() }
fn default_content_domain() -> String { "hitomi.la".to_string() }
fn default_reader_base() -> String { "https://hitomi.la/reader".to_string() }

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            index_base: default_index_base(),
            content_domain: default_content_domain(),
            reader_base: default_reader_base(),
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub cache_whole_index: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize { crate::search::DEFAULT_MAX_DEPTH }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_whole_index: false,
            max_depth: default_max_depth(),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_ms() -> u64 { 30_000 }
fn default_user_agent() -> String { "pagetree/0.1".to_string() }

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// `[script]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    #[serde(default = "default_script_path")]
    pub path: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: i64,
}

fn default_script_path() -> String { "gg.js".to_string() }
fn default_refresh_interval_secs() -> i64 { -1 }

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            path: default_script_path(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ScriptConfig {
    /// `None` when periodic refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        u64::try_from(self.refresh_interval_secs)
            .ok()
            .map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/pagetree/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Layer `path` over the built-in defaults. A missing file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.remote.index_base.trim().is_empty(),
            "remote.index_base must not be empty"
        );
        anyhow::ensure!(self.search.max_depth > 0, "search.max_depth must be at least 1");
        anyhow::ensure!(self.fetch.timeout_ms > 0, "fetch.timeout_ms must be at least 1");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/pagetree/config.toml`, falling back to `~/.config`.
pub fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("pagetree")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
