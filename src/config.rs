use crate::export::OutputEncoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Site the "discovered on" pages are rendered from.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,

    // Rendering/timing
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_render_timeout")]
    pub render_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_grid_selector")]
    pub grid_selector: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    // Remote API; SPOTIFY_API_BASE / SPOTIFY_AUTH_BASE win over these
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_auth_base")]
    pub auth_base: String,

    #[serde(default)]
    pub output_encoding: OutputEncoding,

    /// When set, logs are also written to a daily-rotated file here.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_base_url() -> String { "https://open.spotify.com".into() }
fn default_webdriver_url() -> String { "http://localhost:9515".into() }
fn default_headless() -> bool { true }
fn default_settle_delay() -> u64 { 1000 }
fn default_render_timeout() -> u64 { 10_000 }
fn default_poll_interval() -> u64 { 250 }
fn default_grid_selector() -> String { "div[data-testid=grid-container]".into() }
fn default_link_selector() -> String { "a".into() }
fn default_api_base() -> String { "https://api.spotify.com/v1".into() }
fn default_auth_base() -> String { "https://accounts.spotify.com".into() }

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            settle_delay_ms: default_settle_delay(),
            render_timeout_ms: default_render_timeout(),
            poll_interval_ms: default_poll_interval(),
            grid_selector: default_grid_selector(),
            link_selector: default_link_selector(),
            api_base: default_api_base(),
            auth_base: default_auth_base(),
            output_encoding: OutputEncoding::default(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Explicit path, else the per-user config file if it exists, else defaults.
    /// Endpoint environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match explicit {
            Some(p) => Self::from_path(p)?,
            None => match Self::user_config_path() {
                Some(p) if p.exists() => Self::from_path(&p)?,
                _ => Self::default(),
            },
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("discovered-on").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SPOTIFY_API_BASE") {
            self.api_base = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_AUTH_BASE") {
            self.auth_base = v;
        }
    }

    pub fn settle_delay(&self) -> Duration { Duration::from_millis(self.settle_delay_ms) }
    pub fn render_timeout(&self) -> Duration { Duration::from_millis(self.render_timeout_ms) }
    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
}
