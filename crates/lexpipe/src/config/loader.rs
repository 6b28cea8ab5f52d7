use std::path::{Path, PathBuf};

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;
use crate::pipeline::{FailurePolicy, Stage};

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV_VAR: &str = "LEXPIPE_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Picks the config file: explicit argument, then `LEXPIPE_CONFIG`, then the
/// per-user config directory.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("lexpipe").join("config.json"))
}

/// Loads `path` if it exists, otherwise returns the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) if path.exists() => load_config(path),
        Some(path) => {
            log::info!(
                "No config file at {}, using defaults",
                path.display()
            );
            Ok(Config::default())
        }
        None => Ok(Config::default()),
    }
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be greater than 0".to_string(),
        });
    }

    for (name, value) in [
        ("stage_timeout_secs", config.stage_timeout_secs),
        ("run_deadline_secs", config.run_deadline_secs),
    ] {
        if value == Some(0) {
            return Err(ConfigError::Validation {
                message: format!("{} must be positive", name),
            });
        }
    }

    let mut stages: Vec<(&Stage, &FailurePolicy)> = config.stage_policies.iter().collect();
    stages.sort_by_key(|(stage, _)| **stage);
    for (stage, policy) in stages {
        if !stage.is_analysis() && *policy == FailurePolicy::Absorb {
            return Err(ConfigError::InvalidStagePolicy {
                stage: stage.name().to_string(),
                reason: "this stage is always fatal".to_string(),
            });
        }
    }

    Ok(())
}
