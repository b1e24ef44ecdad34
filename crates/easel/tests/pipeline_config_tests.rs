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

use easel::{ChartPipeline, ConfigError, EaselError, PipelineConfig};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const ARGO: &str = "## ARGO Float Activations by Year\n| 2015 | 3000 |";

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_shipped_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/pipeline.yml");
    let config = PipelineConfig::from_yaml_file(path).unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_pipeline_from_config_file_uses_threshold() {
    let file = write_config("classifier:\n  chart_data_threshold: 70\n");
    let strict = ChartPipeline::from_config_file(file.path()).unwrap();
    assert_eq!(strict.config(), &PipelineConfig::strict());

    let outcome = strict.process(ARGO, "");
    assert_eq!(outcome.analysis.confidence, 65);
    assert!(!outcome.analysis.has_chart_data);
    assert!(ChartPipeline::new().process(ARGO, "").analysis.has_chart_data);
}

#[test]
fn test_invalid_color_is_reported_by_field() {
    let file = write_config("fallback:\n  default_color: blue\n");
    let err = ChartPipeline::from_config_file(file.path()).err().unwrap();
    assert!(matches!(
        err,
        EaselError::Config(ConfigError::InvalidField { ref field, .. }) if field == "fallback.default_color"
    ));
}

#[test]
fn test_missing_config_file() {
    let err = ChartPipeline::from_config_file("/nonexistent/easel.yml").err().unwrap();
    assert!(matches!(
        err,
        EaselError::Config(ConfigError::ConfigFileError { .. })
    ));
}

#[test]
fn test_permissive_config_serves_sample_series() {
    let pipeline = ChartPipeline::with_config(PipelineConfig::permissive()).unwrap();
    let outcome = pipeline.process("Nothing numeric in this reply.", "show me a chart");
    let parsed = outcome.parsed.unwrap();
    assert_eq!(parsed.metadata.source_strategy, "sample_data");
    assert!(outcome.spec.unwrap().is_consistent());
}
