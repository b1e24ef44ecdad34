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

use crate::error::{ConfigError, ConfigResult, Result, SerialisationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lets the last extraction strategy emit a placeholder series instead of nothing.
    pub enable_sample_data: bool,
    pub min_year: i64,
    pub max_year: i64,
}
impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enable_sample_data: false,
            min_year: 1900,
            max_year: 2100,
        }
    }
}
impl ExtractionConfig {
    pub fn accepts_year(&self, year: i64) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub chart_data_threshold: u8,
}
impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            chart_data_threshold: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub chart_height: u32,
    pub default_color: String,
}
impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            chart_height: 400,
            default_color: "#1f77b4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    pub temperature_color: String,
}
impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            temperature_color: "#ff6b6b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub classifier: ClassifierConfig,
    pub fallback: FallbackConfig,
    pub enhancement: EnhancementConfig,
}
impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        if self.extraction.min_year > self.extraction.max_year {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "extraction.min_year ({}) must not exceed extraction.max_year ({})",
                    self.extraction.min_year, self.extraction.max_year
                ),
            });
        }
        if self.classifier.chart_data_threshold > 100 {
            return Err(ConfigError::InvalidField {
                field: "classifier.chart_data_threshold".to_string(),
                value: self.classifier.chart_data_threshold.to_string(),
            });
        }
        if self.fallback.chart_height == 0 {
            return Err(ConfigError::InvalidField {
                field: "fallback.chart_height".to_string(),
                value: "0".to_string(),
            });
        }
        for (field, color) in [
            ("fallback.default_color", &self.fallback.default_color),
            ("enhancement.temperature_color", &self.enhancement.temperature_color),
        ] {
            if !is_hex_color(color) {
                return Err(ConfigError::InvalidField {
                    field: field.to_string(),
                    value: color.clone(),
                });
            }
        }
        Ok(())
    }
    pub fn strict() -> Self {
        Self {
            classifier: ClassifierConfig {
                chart_data_threshold: 70,
            },
            ..Default::default()
        }
    }
    pub fn permissive() -> Self {
        Self {
            extraction: ExtractionConfig {
                enable_sample_data: true,
                ..Default::default()
            },
            classifier: ClassifierConfig {
                chart_data_threshold: 30,
            },
            ..Default::default()
        }
    }
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| SerialisationError::Yaml { source }.into())
    }
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml_str(
            "classifier:\n  chart_data_threshold: 60\nextraction:\n  enable_sample_data: true\n",
        )
        .unwrap();
        assert_eq!(config.classifier.chart_data_threshold, 60);
        assert!(config.extraction.enable_sample_data);
        assert_eq!(config.extraction.min_year, 1900);
        assert_eq!(config.fallback.chart_height, 400);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.extraction.min_year = 2200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));

        let mut config = PipelineConfig::default();
        config.enhancement.temperature_color = "red".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { field, .. }) if field == "enhancement.temperature_color"
        ));

        assert!(PipelineConfig::from_yaml_str("classifier:\n  chart_data_threshold: 101\n").is_err());
        assert!(PipelineConfig::strict().validate().is_ok());
        assert!(PipelineConfig::permissive().validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fallback:\n  chart_height: 300").unwrap();
        let config = PipelineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.fallback.chart_height, 300);

        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(PipelineConfig::from_yaml_str(&yaml).unwrap(), config);

        let missing = PipelineConfig::from_yaml_file("/definitely/not/here.yml");
        assert!(matches!(missing, Err(ConfigError::ConfigFileError { .. })));
    }
}
