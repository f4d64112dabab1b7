//! Gateway configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `GATEWAY_*` environment variables and an
//! optional configuration file. Every key is optional; accessors apply the
//! defaults and validate what they return.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{GenerationCost, GenerationSettings};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:5678/webhook/headshot-generator-agent";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 300;
const DEFAULT_UPLOAD_DIR_NAME: &str = "headshot-uploads";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("bind_addr {value:?} is not a socket address")]
    BindAddr { value: String },
    #[error("upstream_url {value:?} is not a valid URL: {message}")]
    UpstreamUrl { value: String, message: String },
    #[error("upstream_timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("generation_cost must be greater than zero")]
    ZeroCost,
    #[error("history_write_attempts must be greater than zero")]
    ZeroHistoryAttempts,
}

/// Settings for the generation gateway.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Endpoint of the image generation service.
    pub upstream_url: Option<String>,
    /// Wall-clock budget for one upstream call, in seconds.
    pub upstream_timeout_secs: Option<u64>,
    /// Credits charged per successful generation.
    pub generation_cost: Option<u32>,
    /// Directory for staged uploads.
    pub upload_dir: Option<PathBuf>,
    /// PostgreSQL connection string; in-memory stores are used when absent.
    pub database_url: Option<String>,
    /// File holding the bearer token signing secret.
    pub token_secret_file: Option<PathBuf>,
    /// Attempts made to write a history record after charging.
    pub history_write_attempts: Option<u32>,
}

impl GatewaySettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn upstream_url(&self) -> Result<Url, SettingsError> {
        let raw = self.upstream_url.as_deref().unwrap_or(DEFAULT_UPSTREAM_URL);
        Url::parse(raw).map_err(|err| SettingsError::UpstreamUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn upstream_timeout(&self) -> Result<Duration, SettingsError> {
        match self
            .upstream_timeout_secs
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS)
        {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Cost and history retry settings for the generation service.
    pub fn generation(&self) -> Result<GenerationSettings, SettingsError> {
        let defaults = GenerationSettings::default();
        let cost = match self.generation_cost {
            Some(value) => GenerationCost::new(value).map_err(|_| SettingsError::ZeroCost)?,
            None => defaults.cost,
        };
        let history_write_attempts = match self.history_write_attempts {
            Some(value) => NonZeroU32::new(value).ok_or(SettingsError::ZeroHistoryAttempts)?,
            None => defaults.history_write_attempts,
        };
        Ok(GenerationSettings {
            cost,
            history_write_attempts,
        })
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_UPLOAD_DIR_NAME))
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn token_secret_file(&self) -> Option<&Path> {
        self.token_secret_file.as_deref()
    }
}
