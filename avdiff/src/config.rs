#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use avdiff_scene::{Preset, ScenarioConfig};
use avdiff_verify::ActionMode;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "avdiff.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(avdiff::config))]
pub struct ConfigError {
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub run: RunSection,
    pub scenario: ScenarioConfig,
    pub solver: SolverSection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub scenario: Preset,
    pub action: ActionMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub timeout_ms: Option<u32>,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            timeout_ms: Some(10_000),
        }
    }
}

pub fn parse_config(raw: &str) -> Result<RunConfig, ConfigError> {
    toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse config: {e}"),
    })
}

/// An explicit path must exist. Without one, `avdiff.toml` is used if present.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, ConfigError> {
    let path = match path {
        Some(p) => p,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(RunConfig::default()),
    };
    let raw = fs::read_to_string(path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw).map_err(|e| ConfigError {
        message: format!("{}: {}", path.display(), e.message),
    })
}
