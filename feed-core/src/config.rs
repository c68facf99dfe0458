use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ConfigError;
use crate::filter::FilterMode;
use crate::render::DEFAULT_MAX_BODY_CHARS;
use crate::sanitize::DEFAULT_LINK_BASE;

pub const DEFAULT_FEED_URL: &str = "https://www.reddit.com/r/reactjs.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub render: RenderConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub max_redirects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_body_chars: usize,
    /// Base for relative links in post bodies and for discussion permalinks.
    pub link_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub heading: String,
    pub default_filter: String,
    pub card_width: f32,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background_color: [u8; 3],
    pub panel_color: [u8; 3],
    pub card_color: [u8; 3],
    pub accent_color: [u8; 3],
    pub text_color: [u8; 3],
    pub secondary_text_color: [u8; 3],
    pub border_color: [u8; 3],
    pub error_color: [u8; 3],
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FEED_URL.to_string(),
            user_agent: concat!("FeedView/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
            link_base: DEFAULT_LINK_BASE.to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            heading: "React Community Insights".to_string(),
            default_filter: FilterMode::Recent.to_string(),
            card_width: 320.0,
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background_color: [17, 24, 39],
            panel_color: [12, 16, 26],
            card_color: [31, 41, 55],
            accent_color: [37, 99, 235],
            text_color: [229, 231, 235],
            secondary_text_color: [156, 163, 175],
            border_color: [55, 65, 81],
            error_color: [248, 113, 113],
        }
    }
}

impl AppConfig {
    /// Path of the configuration file, `<config dir>/feedview/config.json`.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedview").join("config.json"))
    }

    /// Loads the configuration file if there is one, defaults otherwise.
    pub fn load() -> Self {
        let path = match Self::config_file_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "using default configuration");
                return Self::default();
            }
        };
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(error = %e, "failed to load configuration, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FeedConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}

impl RenderConfig {
    /// Relative links in bodies are dropped when the base does not parse.
    pub fn link_base_url(&self) -> Option<Url> {
        match Url::parse(&self.link_base) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, base = %self.link_base, "invalid link base, relative links will be dropped");
                None
            }
        }
    }
}

impl UiConfig {
    pub fn initial_filter(&self) -> FilterMode {
        FilterMode::parse_lossy(&self.default_filter)
    }
}
