//! Runtime configuration.
//!
//! Layered the same way for every invocation: built-in defaults, then
//! `$XDG_CONFIG_DIRS/bisect-builds/config.toml`, then
//! `$XDG_CONFIG_HOME/bisect-builds/config.toml`, then `BISECT_BUILDS_*`
//! environment variables. The CLI applies its flags on top of the result.
//!
//! ```toml
//! build_root = "/var/cache/bisect-builds"
//! update_url = "https://update.code.visualstudio.com"
//! http_timeout_secs = 60
//! patch_alternate_bundle = true
//!
//! [marketplace]
//! service_url = "https://marketplace.visualstudio.com/_apis/public/gallery"
//! ```

use crate::builds::Host;
use crate::core::error::{BisectError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_UPDATE_URL: &str = "https://update.code.visualstudio.com";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MIN_HTTP_TIMEOUT_SECS: u64 = 5;
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

const APP_DIR: &str = "bisect-builds";

/// Extension gallery injected into patched alternate-channel bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    pub service_url: String,
    pub item_url: String,
    pub cache_url: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            service_url: "https://marketplace.visualstudio.com/_apis/public/gallery".to_owned(),
            item_url: "https://marketplace.visualstudio.com/items".to_owned(),
            cache_url: "https://vscode.blob.core.windows.net/gallery/index".to_owned(),
        }
    }
}

/// Everything the pipeline needs to know about its environment.
///
/// Passed explicitly to every resolver and acquirer so a single process can
/// exercise any host platform.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: Host,
    pub build_root: PathBuf,
    pub history_dir: PathBuf,
    pub update_url: String,
    pub http_timeout: Duration,
    pub patch_alternate_bundle: bool,
    pub marketplace: MarketplaceConfig,
}

impl Config {
    /// Defaults rooted at explicit directories, for the detected host.
    pub fn new(build_root: impl Into<PathBuf>, history_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: Host::detect(),
            build_root: build_root.into(),
            history_dir: history_dir.into(),
            update_url: DEFAULT_UPDATE_URL.to_owned(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            patch_alternate_bundle: true,
            marketplace: MarketplaceConfig::default(),
        }
    }

    /// Load defaults, config files and environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::new(default_build_root(), default_history_dir());

        for path in find_config_files() {
            if !path.exists() {
                continue;
            }
            let parsed = read_toml(&path)?;
            config.apply_toml(parsed);
        }

        config.apply_env();
        Ok(config)
    }

    pub fn with_host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    pub fn with_update_url(mut self, url: impl Into<String>) -> Self {
        self.update_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout = clamp_timeout(secs);
        self
    }

    fn apply_toml(&mut self, file: ConfigToml) {
        if let Some(root) = file.build_root {
            self.build_root = root;
        }
        if let Some(dir) = file.history_dir {
            self.history_dir = dir;
        }
        if let Some(url) = file.update_url {
            self.update_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout = clamp_timeout(secs);
        }
        if let Some(patch) = file.patch_alternate_bundle {
            self.patch_alternate_bundle = patch;
        }
        if let Some(m) = file.marketplace {
            if let Some(url) = m.service_url {
                self.marketplace.service_url = url;
            }
            if let Some(url) = m.item_url {
                self.marketplace.item_url = url;
            }
            if let Some(url) = m.cache_url {
                self.marketplace.cache_url = url;
            }
        }
    }

    fn apply_env(&mut self) {
        if let Some(root) = env_nonempty("BISECT_BUILDS_ROOT") {
            self.build_root = PathBuf::from(root);
        }
        if let Some(dir) = env_nonempty("BISECT_BUILDS_HISTORY_DIR") {
            self.history_dir = PathBuf::from(dir);
        }
        if let Some(url) = env_nonempty("BISECT_BUILDS_UPDATE_URL") {
            self.update_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(secs) =
            env_nonempty("BISECT_BUILDS_HTTP_TIMEOUT").and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout = clamp_timeout(secs);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    build_root: Option<PathBuf>,
    history_dir: Option<PathBuf>,
    update_url: Option<String>,
    http_timeout_secs: Option<u64>,
    patch_alternate_bundle: Option<bool>,
    marketplace: Option<MarketplaceToml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MarketplaceToml {
    service_url: Option<String>,
    item_url: Option<String>,
    cache_url: Option<String>,
}

fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_HTTP_TIMEOUT_SECS, MAX_HTTP_TIMEOUT_SECS))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn read_toml(path: &Path) -> Result<ConfigToml> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| BisectError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str::<ConfigToml>(&text)
        .map_err(|e| BisectError::Config(format!("invalid TOML in {}: {e}", path.display())))
}

fn split_xdg_config_dirs() -> Vec<PathBuf> {
    let raw = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".to_owned());
    raw.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn xdg_config_home() -> PathBuf {
    env_nonempty("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

fn find_config_files() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = split_xdg_config_dirs()
        .into_iter()
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
        .collect();
    paths.push(xdg_config_home().join(APP_DIR).join("config.toml"));
    paths
}

fn default_build_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_DIR)
        .join("builds")
}

fn default_history_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join(APP_DIR)
        .join("history")
}
