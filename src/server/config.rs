use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::render::RenderOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub font_path: String,
    pub font_size: f32,
    pub stroke_width: u32,
    pub label_offset: i64,
    pub max_upload_bytes: usize,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    bind_address: Option<String>,
    font_path: Option<String>,
    font_size: Option<f32>,
    stroke_width: Option<u32>,
    label_offset: Option<i64>,
    max_upload_bytes: Option<usize>,
    log_dir: Option<String>,
}

impl PartialServerConfig {
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fields set on `self` win over `other`.
    fn or(self, other: PartialServerConfig) -> PartialServerConfig {
        PartialServerConfig {
            bind_address: self.bind_address.or(other.bind_address),
            font_path: self.font_path.or(other.font_path),
            font_size: self.font_size.or(other.font_size),
            stroke_width: self.stroke_width.or(other.stroke_width),
            label_offset: self.label_offset.or(other.label_offset),
            max_upload_bytes: self.max_upload_bytes.or(other.max_upload_bytes),
            log_dir: self.log_dir.or(other.log_dir),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_font_path() -> String {
    "DejaVuSans.ttf".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_FONT_SIZE: f32 = 16.0;
const DEFAULT_STROKE_WIDTH: u32 = 3;
const DEFAULT_LABEL_OFFSET: i64 = 18;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

impl ServerConfig {
    /// File, then environment (which wins), then defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path) => PartialServerConfig::from_file(Path::new(path))?,
            None => PartialServerConfig::default(),
        };
        let env_config: PartialServerConfig = envy::from_env()?;

        Self::resolve(env_config.or(file_config))
    }

    fn resolve(partial: PartialServerConfig) -> Result<Self, ConfigError> {
        let bind_address_raw = partial.bind_address.unwrap_or_else(default_bind_address);
        let bind_address = bind_address_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            field: "bind_address",
            reason: format!("{bind_address_raw:?}: {e}"),
        })?;

        let font_size = partial.font_size.unwrap_or(DEFAULT_FONT_SIZE);
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "font_size",
                reason: format!("must be a positive number, got {font_size}"),
            });
        }

        let stroke_width = partial.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH);
        if stroke_width == 0 {
            return Err(ConfigError::Invalid {
                field: "stroke_width",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ServerConfig {
            bind_address,
            font_path: partial.font_path.unwrap_or_else(default_font_path),
            font_size,
            stroke_width,
            label_offset: partial.label_offset.unwrap_or(DEFAULT_LABEL_OFFSET),
            max_upload_bytes: partial.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            log_dir: partial.log_dir.unwrap_or_else(default_log_dir),
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            stroke_width: self.stroke_width,
            label_offset: self.label_offset,
            ..RenderOptions::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            font_path: default_font_path(),
            font_size: DEFAULT_FONT_SIZE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            label_offset: DEFAULT_LABEL_OFFSET,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_dir: default_log_dir(),
        }
    }
}
