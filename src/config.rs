//! Layered configuration for the board core.
//!
//! Settings are read from `.corkboard/board.toml` when present, then
//! environment overrides are applied, then CLI flags (by the caller).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"
//! request_timeout_ms = 10000
//! token = "..."
//!
//! [board]
//! width = 1280
//! height = 800
//! margin = 30
//!
//! [floating]
//! margin = 60
//! click_threshold = 5.0
//! width = 56
//! height = 56
//!
//! [sizes]
//! default = { width = 256, height = 176 }
//! large = { width = 320, height = 240 }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::geometry::{BOARD_MARGIN, FLOATING_CONTROL_MARGIN, Size};
use crate::sync::Credentials;

pub const CONFIG_DIR: &str = ".corkboard";
pub const CONFIG_FILE: &str = "board.toml";

pub const ENV_API_URL: &str = "CORKBOARD_API_URL";
pub const ENV_TOKEN: &str = "CORKBOARD_TOKEN";
pub const ENV_SESSION_COOKIE: &str = "CORKBOARD_SESSION_COOKIE";

/// Remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Raw `Cookie` header value for cookie-based sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            token: None,
            session_cookie: None,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.token.clone(),
            session_cookie: self.session_cookie.clone(),
        }
    }
}

/// Board container settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default = "default_board_width")]
    pub width: i32,
    #[serde(default = "default_board_height")]
    pub height: i32,
    #[serde(default = "default_board_margin")]
    pub margin: i32,
}

fn default_board_width() -> i32 {
    1280
}

fn default_board_height() -> i32 {
    800
}

fn default_board_margin() -> i32 {
    BOARD_MARGIN
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            width: default_board_width(),
            height: default_board_height(),
            margin: default_board_margin(),
        }
    }
}

impl BoardSection {
    pub fn container(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Floating control cluster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingSection {
    #[serde(default = "default_floating_margin")]
    pub margin: i32,
    /// Pointer travel (px) at or below which a press counts as a click.
    #[serde(default = "default_click_threshold")]
    pub click_threshold: f64,
    #[serde(default = "default_floating_extent")]
    pub width: i32,
    #[serde(default = "default_floating_extent")]
    pub height: i32,
}

fn default_floating_margin() -> i32 {
    FLOATING_CONTROL_MARGIN
}

fn default_click_threshold() -> f64 {
    5.0
}

fn default_floating_extent() -> i32 {
    56
}

impl Default for FloatingSection {
    fn default() -> Self {
        Self {
            margin: default_floating_margin(),
            click_threshold: default_click_threshold(),
            width: default_floating_extent(),
            height: default_floating_extent(),
        }
    }
}

impl FloatingSection {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Rendered item sizes per style code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizesConfig {
    #[serde(default = "default_item_size")]
    pub default: Size,
    #[serde(flatten)]
    pub styles: HashMap<String, Size>,
}

fn default_item_size() -> Size {
    Size::new(256, 176)
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            default: default_item_size(),
            styles: HashMap::new(),
        }
    }
}

impl SizesConfig {
    pub fn size_for(&self, style_code: Option<&str>) -> Size {
        style_code
            .and_then(|code| self.styles.get(code))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Top-level board.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub floating: FloatingSection,
    #[serde(default)]
    pub sizes: SizesConfig,
}

impl BoardConfig {
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load file → environment layers and validate the result.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::config_path(project_dir);
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CORKBOARD_*` overrides using `lookup` to read variables.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.api.token = Some(token);
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE).filter(|v| !v.is_empty()) {
            self.api.session_cookie = Some(cookie);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                message: format!("'{}' is not an http(s) URL", self.api.base_url),
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "api.request_timeout_ms",
                message: "must be greater than zero".into(),
            });
        }
        if self.board.margin < 0 || self.floating.margin < 0 {
            return Err(ConfigError::Invalid {
                field: "margin",
                message: "must not be negative".into(),
            });
        }
        let threshold = self.floating.click_threshold;
        if threshold.is_nan() || threshold < 0.0 {
            return Err(ConfigError::Invalid {
                field: "floating.click_threshold",
                message: "must be a non-negative number".into(),
            });
        }
        let all_sizes = std::iter::once(&self.sizes.default).chain(self.sizes.styles.values());
        for size in all_sizes {
            if size.width <= 0 || size.height <= 0 {
                return Err(ConfigError::Invalid {
                    field: "sizes",
                    message: format!("item size {} must be positive", size),
                });
            }
        }
        Ok(())
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.api.token.is_some() {
            shown.api.token = Some("***".into());
        }
        if shown.api.session_cookie.is_some() {
            shown.api.session_cookie = Some("***".into());
        }
        shown
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
