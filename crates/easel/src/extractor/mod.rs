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

pub mod strategies;

use crate::chart_spec::{ChartKind, DataPoint};
use crate::classifier::{Axis, ChartTypeClassifier};
use crate::config::PipelineConfig;
use crate::patterns;
use serde::{Deserialize, Serialize};
use strategies::{default_strategies, ExtractionStrategy};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub units: Option<String>,
    pub date_range: Option<DateRange>,
    pub source_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChart {
    pub data: Vec<DataPoint>,
    pub chart_type: ChartKind,
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub metadata: ChartMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub strategy: &'static str,
    pub points: Vec<DataPoint>,
}

pub struct SeriesExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    classifier: ChartTypeClassifier,
}
impl Default for SeriesExtractor {
    fn default() -> Self {
        Self::new()
    }
}
impl SeriesExtractor {
    pub fn new() -> Self {
        Self::with_config(&PipelineConfig::default())
    }
    pub fn with_config(config: &PipelineConfig) -> Self {
        Self {
            strategies: default_strategies(&config.extraction),
            classifier: ChartTypeClassifier::with_config(config.classifier.clone()),
        }
    }
    /// Replaces the ordered strategy list; earlier entries take precedence.
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            classifier: ChartTypeClassifier::new(),
        }
    }
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(&self, content: &str) -> Vec<DataPoint> {
        self.extract_with_source(content)
            .map(|e| e.points)
            .unwrap_or_default()
    }

    /// Runs strategies in order and stops at the first that yields points.
    pub fn extract_with_source(&self, content: &str) -> Option<Extraction> {
        if content.trim().is_empty() {
            return None;
        }
        for strategy in &self.strategies {
            let points = strategy.extract(content);
            if !points.is_empty() {
                debug!(
                    strategy = strategy.name(),
                    points = points.len(),
                    "SeriesExtractor: strategy produced data"
                );
                return Some(Extraction {
                    strategy: strategy.name(),
                    points,
                });
            }
        }
        debug!("SeriesExtractor: no strategy produced data");
        None
    }

    pub fn parse(&self, content: &str) -> Option<ParsedChart> {
        let extraction = self.extract_with_source(content)?;
        Some(ParsedChart {
            data: extraction.points,
            chart_type: self.classifier.detect_chart_type(content),
            title: self.classifier.extract_title(content),
            x_axis_title: self.classifier.extract_axis_title(content, Axis::X),
            y_axis_title: self.classifier.extract_axis_title(content, Axis::Y),
            metadata: extract_metadata(content, extraction.strategy),
        })
    }
}

fn extract_metadata(content: &str, strategy: &str) -> ChartMetadata {
    let units = patterns::UNITS_PARENTHETICAL
        .captures(content)
        .map(|c| c[1].trim().to_string());
    let years: Vec<&str> = patterns::STANDALONE_FOUR_DIGITS
        .find_iter(content)
        .take(2)
        .map(|m| m.as_str())
        .collect();
    let date_range = match years.as_slice() {
        [start, end] => Some(DateRange {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => None,
    };
    ChartMetadata {
        units,
        date_range,
        source_strategy: strategy.to_string(),
    }
}
