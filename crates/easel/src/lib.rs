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

pub mod builder;
pub mod chart_spec;
pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod coordinates;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod patterns;

pub use builder::ChartSpecBuilder;
pub use chart_spec::{
    AnalysisResult, AxisSpec, ChartKind, ChartSpecification, DataKind, DataPoint, Layout, Trace,
    TraceType, XValue,
};
pub use classifier::{Axis, ChartTypeClassifier};
pub use cleaner::TextCleaner;
pub use config::PipelineConfig;
pub use coordinates::{CoordinateFormat, CoordinateValidation};
pub use detector::{is_generic_chart, GenericChartDetector, GenericReason};
pub use error::{ConfigError, EaselError, Result, SerialisationError};
pub use extractor::strategies::ExtractionStrategy;
pub use extractor::{ChartMetadata, ParsedChart, SeriesExtractor};
pub use fallback::{FallbackSynthesizer, RandomSource};

use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub cleaned: String,
    pub analysis: AnalysisResult,
    pub parsed: Option<ParsedChart>,
    pub spec: Option<ChartSpecification>,
}

/// Text-to-chart pipeline: cleaning, analysis, extraction and spec building.
pub struct ChartPipeline {
    config: PipelineConfig,
    cleaner: TextCleaner,
    classifier: ChartTypeClassifier,
    extractor: SeriesExtractor,
    builder: ChartSpecBuilder,
}
impl Default for ChartPipeline {
    fn default() -> Self {
        Self::new()
    }
}
impl ChartPipeline {
    pub fn new() -> Self {
        Self::build(PipelineConfig::default())
    }
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = PipelineConfig::from_yaml_file(path)?;
        Self::with_config(config)
    }
    fn build(config: PipelineConfig) -> Self {
        Self {
            cleaner: TextCleaner::new(),
            classifier: ChartTypeClassifier::with_config(config.classifier.clone()),
            extractor: SeriesExtractor::with_config(&config),
            builder: ChartSpecBuilder::with_config(&config),
            config,
        }
    }
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, response: &str, user_message: &str) -> PipelineOutcome {
        let cleaned = self.cleaner.clean(response);
        let analysis = self.classifier.analyze(&cleaned);
        let parsed = self.extractor.parse(&cleaned);
        let spec = parsed.as_ref().map(|chart| {
            let built = self.builder.build(chart);
            let converted = self.builder.convert_chart_type(&built, user_message);
            self.builder.enhance_chart(&converted, user_message)
        });
        debug!(
            confidence = analysis.confidence,
            has_chart_data = analysis.has_chart_data,
            produced_spec = spec.is_some(),
            "ChartPipeline: processed response"
        );
        PipelineOutcome {
            cleaned,
            analysis,
            parsed,
            spec,
        }
    }

    /// Falls back to a synthesized chart when extraction produced nothing.
    pub fn process_with_fallback<R: RandomSource>(
        &self,
        response: &str,
        user_message: &str,
        synthesizer: &mut FallbackSynthesizer<R>,
    ) -> PipelineOutcome {
        let mut outcome = self.process(response, user_message);
        if outcome.spec.is_none() {
            outcome.spec = synthesizer.generate_fallback_chart(user_message, None);
            if outcome.spec.is_some() {
                info!("ChartPipeline: using synthesized fallback chart");
            }
        }
        outcome
    }

    pub fn process_batch(&self, items: &[(String, String)]) -> Vec<PipelineOutcome> {
        items
            .par_iter()
            .map(|(response, message)| self.process(response, message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_RESPONSE: &str = "Chart Title - Yearly Activations\n\n\
| Year | Activations |\n\
|------|-------------|\n\
| 2019 | 120 |\n\
| 2020 | 150 |\n\
| 2021 | 180 |\n";

    #[test]
    fn process_builds_and_converts_spec() {
        let pipeline = ChartPipeline::new();
        let outcome = pipeline.process(TABLE_RESPONSE, "show this as a line chart");
        let spec = outcome.spec.expect("spec");
        assert_eq!(spec.data[0].trace_type, TraceType::Scatter);
        assert_eq!(spec.data[0].y, vec![120.0, 150.0, 180.0]);
        assert!(spec.is_consistent());
        assert_eq!(
            outcome.parsed.map(|p| p.metadata.source_strategy),
            Some("markdown_table".to_string())
        );
    }

    #[test]
    fn empty_response_yields_no_spec() {
        let outcome = ChartPipeline::new().process("", "hello");
        assert!(outcome.spec.is_none());
        assert!(!outcome.analysis.has_chart_data);
        assert_eq!(outcome.analysis.confidence, 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.extraction.min_year = 2200;
        assert!(matches!(
            ChartPipeline::with_config(config),
            Err(EaselError::Config(_))
        ));
    }

    #[test]
    fn batch_matches_sequential_results() {
        let pipeline = ChartPipeline::new();
        let items = vec![
            (TABLE_RESPONSE.to_string(), "plot it".to_string()),
            ("no numbers here".to_string(), "hi".to_string()),
        ];
        let batch = pipeline.process_batch(&items);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], pipeline.process(&items[0].0, &items[0].1));
        assert!(batch[1].spec.is_none());
    }
}
