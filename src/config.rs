//! YAML configuration for matching simulations.
//!
//! A configuration names the two sides of the market, chooses how
//! preferences are produced and, in input mode, lists every agent with its
//! ranked preferences:
//!
//! ```yaml
//! proposer_side_name: men
//! responder_side_name: women
//! preference_type: input
//! number_of_proposers: 2
//! number_of_responders: 2
//! log_file_name: matching.log
//! seed: 42
//! proposers:
//!   m1: [w1, w2]
//!   m2: [w2]
//! responders:
//!   w1: [m2, m1]
//!   w2: [m1]
//! ```

use color_eyre::eyre::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::matching::PreferenceMap;
use crate::utils::validation::{validate_log_file_name, validate_references, validate_side_names};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// How agents and their preferences are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum PreferenceType {
    /// Generated agents with shuffled preferences
    Random,
    /// Agents and preferences taken from the configuration
    Input,
}

impl PreferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceType::Random => "random",
            PreferenceType::Input => "input",
        }
    }
}

impl fmt::Display for PreferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(PreferenceType::Random),
            "input" => Ok(PreferenceType::Input),
            _ => Err(ValidationError::InvalidPreferenceType(format!(
                "'{}' is neither 'random' nor 'input'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for PreferenceType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub proposer_side_name: String,
    pub responder_side_name: String,
    pub preference_type: PreferenceType,
    pub number_of_proposers: usize,
    pub number_of_responders: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "PreferenceMap::is_empty")]
    pub proposers: PreferenceMap,
    #[serde(default, skip_serializing_if = "PreferenceMap::is_empty")]
    pub responders: PreferenceMap,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_side_names(&self.proposer_side_name, &self.responder_side_name)
            .map_err(ValidationError::InvalidSideName)?;

        if self.number_of_proposers == 0 {
            return Err(ValidationError::InvalidCount(
                "number_of_proposers must be greater than 0".to_string(),
            ));
        }
        if self.number_of_responders == 0 {
            return Err(ValidationError::InvalidCount(
                "number_of_responders must be greater than 0".to_string(),
            ));
        }

        if let Some(name) = &self.log_file_name {
            validate_log_file_name(name).map_err(ValidationError::InvalidLogFile)?;
        }

        if self.preference_type == PreferenceType::Input {
            self.validate_input()?;
        }

        Ok(())
    }

    fn validate_input(&self) -> Result<(), ValidationError> {
        if self.proposers.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "no {} given for input preferences",
                self.proposer_side_name
            )));
        }
        if self.responders.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "no {} given for input preferences",
                self.responder_side_name
            )));
        }

        validate_references(&self.proposers, &self.responders, &self.responder_side_name)
            .map_err(ValidationError::InvalidInput)?;
        validate_references(&self.responders, &self.proposers, &self.proposer_side_name)
            .map_err(ValidationError::InvalidInput)?;

        if self.proposers.len() != self.number_of_proposers {
            warn!(
                "number_of_proposers is {} but {} {} are listed, using the listed agents",
                self.number_of_proposers,
                self.proposers.len(),
                self.proposer_side_name
            );
        }
        if self.responders.len() != self.number_of_responders {
            warn!(
                "number_of_responders is {} but {} {} are listed, using the listed agents",
                self.number_of_responders,
                self.responders.len(),
                self.responder_side_name
            );
        }

        Ok(())
    }

    /// Exchange the roles of the two sides, then re-validate
    pub fn swap_sides(&mut self) -> Result<(), ValidationError> {
        std::mem::swap(&mut self.proposer_side_name, &mut self.responder_side_name);
        std::mem::swap(&mut self.number_of_proposers, &mut self.number_of_responders);
        std::mem::swap(&mut self.proposers, &mut self.responders);
        info!(
            "Swapped sides: {} now propose to {}",
            self.proposer_side_name, self.responder_side_name
        );
        self.validate()
    }

    /// Number of proposers a simulation will create
    pub fn proposer_count(&self) -> usize {
        match self.preference_type {
            PreferenceType::Random => self.number_of_proposers,
            PreferenceType::Input => self.proposers.len(),
        }
    }

    /// Number of responders a simulation will create
    pub fn responder_count(&self) -> usize {
        match self.preference_type {
            PreferenceType::Random => self.number_of_responders,
            PreferenceType::Input => self.responders.len(),
        }
    }
}

/// Parse and validate a configuration from YAML text.
///
/// Top-level keys are matched case-insensitively.
pub fn parse_config(content: &str) -> Result<Config> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).wrap_err("Failed to parse YAML")?;
    let config: Config =
        serde_yaml::from_value(lowercase_keys(value)).wrap_err("Invalid configuration structure")?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a configuration file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

    parse_config(&content).with_context(|| format!("Invalid config file {}", config_path.display()))
}

fn lowercase_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Mapping(mapping) => serde_yaml::Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| match key {
                    serde_yaml::Value::String(key) => (serde_yaml::Value::String(key.to_lowercase()), value),
                    other => (other, value),
                })
                .collect(),
        ),
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid side name: {0}")]
    InvalidSideName(String),
    #[error("Invalid preference type: {0}")]
    InvalidPreferenceType(String),
    #[error("Invalid agent count: {0}")]
    InvalidCount(String),
    #[error("Invalid log file: {0}")]
    InvalidLogFile(String),
    #[error("Invalid input preferences: {0}")]
    InvalidInput(String),
}
