// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use thiserror::Error;
#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} = {value}")]
    InvalidField { field: String, value: String },
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("YAML serialisation failed: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
}
pub type Result<T> = std::result::Result<T, EaselError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl From<serde_json::Error> for EaselError {
    fn from(err: serde_json::Error) -> Self {
        EaselError::Serialisation(SerialisationError::Json { source: err })
    }
}
impl EaselError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EaselError::Config(ConfigError::InvalidField { .. })
                | EaselError::Config(ConfigError::ValidationFailed { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            EaselError::Config(_) => "Configuration",
            EaselError::Serialisation(_) => "Serialisation",
            EaselError::Io(_) => "I/O",
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            EaselError::Config(ConfigError::ConfigFileError { path, .. }) => {
                format!("Unable to load pipeline configuration from '{path}'. Please check the file.")
            }
            EaselError::Serialisation(SerialisationError::Json { .. }) => {
                "The chart specification is not valid JSON.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
