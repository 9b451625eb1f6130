//! Server configuration, read from environment variables.
//!
//! | Variable                | Default                         |
//! |-------------------------|---------------------------------|
//! | `DIGITS_MODEL_PATH`     | `digit_recognition_model.json`  |
//! | `HOST`                  | `0.0.0.0`                       |
//! | `PORT`                  | `5000`                          |
//! | `DIGITS_STATIC_DIR`     | `frontend/build`                |
//! | `DIGITS_MAX_BODY_BYTES` | `5242880`                       |
//! | `DIGITS_RESIZE_FILTER`  | `bicubic`                       |

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::ResizeFilter;

pub const DEFAULT_MODEL_PATH: &str = "digit_recognition_model.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "frontend/build";
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Path of the JSON model artifact.
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Front-end bundle served for non-API `GET` requests.
    pub static_dir: PathBuf,
    /// Request bodies above this size are rejected with 413.
    pub max_body_bytes: usize,
    pub resize_filter: ResizeFilter,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            resize_filter: ResizeFilter::default(),
        }
    }
}

impl ServeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = ServeConfig::default();

        if let Some(v) = get("DIGITS_MODEL_PATH") {
            cfg.model_path = PathBuf::from(v);
        }
        if let Some(v) = get("HOST") {
            cfg.host = v.trim().to_owned();
        }
        if let Some(v) = get("PORT") {
            cfg.port = v.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                value: v.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = get("DIGITS_STATIC_DIR") {
            cfg.static_dir = PathBuf::from(v);
        }
        if let Some(v) = get("DIGITS_MAX_BODY_BYTES") {
            cfg.max_body_bytes = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(ConfigError::Invalid {
                    var: "DIGITS_MAX_BODY_BYTES",
                    value: v,
                    reason: "must be greater than zero".into(),
                }),
                Err(e) => return Err(ConfigError::Invalid {
                    var: "DIGITS_MAX_BODY_BYTES",
                    value: v,
                    reason: e.to_string(),
                }),
            };
        }
        if let Some(v) = get("DIGITS_RESIZE_FILTER") {
            cfg.resize_filter = v.parse().map_err(|reason| ConfigError::Invalid {
                var: "DIGITS_RESIZE_FILTER",
                value: v.clone(),
                reason,
            })?;
        }
        Ok(cfg)
    }

    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
