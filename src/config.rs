//! Engine configuration
//!
//! Every field defaults to the crate constants, so an empty TOML document is a
//! valid configuration.
//!
//! ```toml
//! [progression]
//! compatibility_weight = 0.05
//!
//! [gate]
//! progress_threshold = 100
//! window = { last = 20 }
//!
//! [server]
//! addr = "0.0.0.0:8080"
//! ```

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::core::MilestoneWindow;
use crate::types::{EngineError, Result, ValidationError, check_non_negative};
use crate::{
    BASE_PROGRESS, MAX_PROGRESS_INCREASE, COMPATIBILITY_WEIGHT, FREQUENCY_WEIGHT,
    FREQUENCY_CAP, EXCEPTIONAL_THRESHOLD, EXCEPTIONAL_BONUS, STAGE_PROGRESS_THRESHOLD,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub progression: ProgressionConfig,
    pub gate: GateConfig,
    pub server: ServerConfig,
}

/// Tunables of the progress formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub base_progress: f64,
    pub max_increase: u32,
    pub compatibility_weight: f64,
    pub frequency_weight: f64,
    pub frequency_cap: f64,
    pub exceptional_threshold: f64,
    pub exceptional_bonus: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_progress: BASE_PROGRESS,
            max_increase: MAX_PROGRESS_INCREASE,
            compatibility_weight: COMPATIBILITY_WEIGHT,
            frequency_weight: FREQUENCY_WEIGHT,
            frequency_cap: FREQUENCY_CAP,
            exceptional_threshold: EXCEPTIONAL_THRESHOLD,
            exceptional_bonus: EXCEPTIONAL_BONUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub progress_threshold: u32,
    /// Which milestones count as "recent" for advancement requests
    pub window: MilestoneWindow,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            progress_threshold: STAGE_PROGRESS_THRESHOLD,
            window: MilestoneWindow::SinceStageStart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let p = &self.progression;
        check_non_negative("progression.base_progress", p.base_progress)?;
        check_non_negative("progression.compatibility_weight", p.compatibility_weight)?;
        check_non_negative("progression.frequency_weight", p.frequency_weight)?;
        check_non_negative("progression.frequency_cap", p.frequency_cap)?;
        check_non_negative("progression.exceptional_threshold", p.exceptional_threshold)?;
        check_non_negative("progression.exceptional_bonus", p.exceptional_bonus)?;
        Ok(())
    }
}

/// Reject configurations that cannot be served
pub fn check_server(config: &ServerConfig) -> Result<()> {
    if config.addr.trim().is_empty() {
        return Err(EngineError::Config("server.addr must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.progression.max_increase, 20);
        assert_eq!(config.gate.progress_threshold, 100);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [progression]
            compatibility_weight = 0.05

            [gate]
            window = { last = 5 }
            "#,
        )
        .unwrap();
        assert_eq!(config.progression.compatibility_weight, 0.05);
        assert_eq!(config.progression.base_progress, 2.0);
        assert_eq!(config.gate.window, MilestoneWindow::Last(5));
    }

    #[test]
    fn test_window_names() {
        let config = EngineConfig::from_toml_str("[gate]\nwindow = \"all\"").unwrap();
        assert_eq!(config.gate.window, MilestoneWindow::All);
    }

    #[test]
    fn test_negative_tunable_rejected() {
        let err = EngineConfig::from_toml_str("[progression]\nbase_progress = -1.0").unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = EngineConfig::load("/nonexistent/rapport.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_empty_addr_rejected() {
        let server = ServerConfig { addr: " ".to_string() };
        assert!(check_server(&server).is_err());
    }
}
