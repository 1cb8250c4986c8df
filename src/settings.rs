//! Engine settings loaded from TOML.
//!
//! - `Settings::default()` matches the embedded `default_settings.toml`
//! - `parse_settings_toml` / `Settings::load` read user overrides
//! - settings are handed to `TransliterationEngine::from_settings`; there is
//!   no process-wide instance

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::backend::{ConversionBackend, RemoteServiceConversion};
use crate::engine::EngineOptions;
use crate::script;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub engine: EngineSettings,
    pub cache: CacheSettings,
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineSettings {
    pub default_script: String,
    pub source_script: String,
    #[serde(default)]
    pub strict_scripts: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheSettings {
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Remote,
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendSettings {
    pub kind: BackendKind,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_url() -> String {
    crate::backend::DEFAULT_SERVICE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    crate::backend::DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings {
                default_script: script::DEFAULT_SCRIPT.to_string(),
                source_script: script::SOURCE_SCRIPT.to_string(),
                strict_scripts: false,
            },
            cache: CacheSettings {
                capacity: crate::cache::DEFAULT_CAPACITY,
            },
            backend: BackendSettings {
                kind: BackendKind::Remote,
                url: default_url(),
                timeout_ms: default_timeout_ms(),
            },
        }
    }
}

impl Settings {
    /// Read and validate a settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        parse_settings_toml(&content)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_script: self.engine.default_script.clone(),
            source_script: self.engine.source_script.clone(),
            strict_scripts: self.engine.strict_scripts,
            cache_capacity: self.cache.capacity,
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Construct the configured backend.
    pub fn build(&self) -> Result<Arc<dyn ConversionBackend>, SettingsError> {
        match self.kind {
            BackendKind::Remote => Ok(Arc::new(RemoteServiceConversion::new(
                self.url.clone(),
                self.timeout(),
            ))),
            #[cfg(feature = "vidyut")]
            BackendKind::Embedded => Ok(Arc::new(
                crate::backend::EmbeddedConversion::vidyut(),
            )),
            #[cfg(not(feature = "vidyut"))]
            BackendKind::Embedded => Err(SettingsError::InvalidValue {
                field: "backend.kind".to_string(),
                reason: "embedded backend requires the `vidyut` feature".to_string(),
            }),
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    fn invalid(field: &str, reason: impl Into<String>) -> SettingsError {
        SettingsError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    // The source script backs every static fallback, so it must be real
    // even in lenient mode.
    if !script::is_supported(&s.engine.source_script) {
        return Err(invalid("engine.source_script", "not a supported script"));
    }
    if s.engine.strict_scripts && !script::is_supported(&s.engine.default_script) {
        return Err(invalid("engine.default_script", "not a supported script"));
    }
    if s.cache.capacity == 0 {
        return Err(invalid("cache.capacity", "must be positive"));
    }
    if s.backend.timeout_ms == 0 {
        return Err(invalid("backend.timeout_ms", "must be positive"));
    }
    if s.backend.kind == BackendKind::Remote && !s.backend.url.starts_with("http") {
        return Err(invalid("backend.url", "must be an http(s) URL"));
    }
    Ok(())
}
