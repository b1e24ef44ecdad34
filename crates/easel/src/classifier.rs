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

use crate::chart_spec::{AnalysisResult, ChartKind, DataKind, DataPoint};
use crate::config::ClassifierConfig;
use crate::extractor::strategies::{ExtractionStrategy, StructuredResponse};
use crate::patterns::{self, COUNT_UNIT_WORDS, DATA_SHAPE_PATTERNS};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

mod scoring {
    pub const PATTERN_MATCH: u32 = 30;
    pub const MANY_POINTS: u32 = 25;
    pub const MANY_POINTS_THRESHOLD: usize = 3;
    pub const DATA_TYPE: u32 = 20;
    pub const TITLE: u32 = 15;
    pub const CHART_MENTION: u32 = 10;
    pub const MAX: u32 = 100;
}

struct DataKindRule {
    kind: DataKind,
    keywords: Vec<&'static str>,
    y_axis: &'static str,
    default_chart: ChartKind,
}

/// First match wins: temperature, then count, then percentage.
static DATA_KIND_RULES: Lazy<Vec<DataKindRule>> = Lazy::new(|| {
    let mut count_keywords = vec!["count", "total", "number"];
    count_keywords.extend(COUNT_UNIT_WORDS.iter().copied());
    vec![
        DataKindRule {
            kind: DataKind::Temperature,
            keywords: vec!["temperature", "°c", "°f"],
            y_axis: "Temperature (°C)",
            default_chart: ChartKind::Line,
        },
        DataKindRule {
            kind: DataKind::Count,
            keywords: count_keywords,
            y_axis: "Count",
            default_chart: ChartKind::Bar,
        },
        DataKindRule {
            kind: DataKind::Percentage,
            keywords: vec!["percentage", "%"],
            y_axis: "Percentage",
            default_chart: ChartKind::Pie,
        },
    ]
});

static CHART_SIGNALS: Lazy<Vec<(ChartKind, Vec<Regex>)>> = Lazy::new(|| {
    let signals = |patterns: [&str; 2]| -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    };
    vec![
        (
            ChartKind::Line,
            signals([
                r"(?i)\b(?:trends?|over time|timeline|time series)\b",
                r"(?i)\b(?:increase|decrease|growth|decline|daily|monthly)\b",
            ]),
        ),
        (
            ChartKind::Bar,
            signals([
                r"(?i)\b(?:comparison|compare|annual|yearly)\b",
                r"(?i)\b(?:by year|per year|ranking|versus)\b",
            ]),
        ),
        (
            ChartKind::Pie,
            signals([
                r"(?i)\b(?:distribution|percentage|proportion|share)\b",
                r"(?i)\b(?:breakdown|composition)\b",
            ]),
        ),
        (
            ChartKind::Scatter,
            signals([
                r"(?i)\b(?:correlation|relationship)\b",
                r"(?i)\b(?:scatter|plotted against)\b",
            ]),
        ),
    ]
});

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:chart|graph)\b[^\n]*?\s[–-]\s*([^\n]+)",
        r"(?im)^[ \t]*(?:title|heading)[ \t]*:[ \t]*(.+)$",
        r"(?m)^[ \t]*#{1,6}[ \t]+(.+)$",
        r"\*\*([^*\n]+)\*\*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static X_AXIS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*x[- ]?axis[ \t]*:[ \t]*(.+)$").unwrap());
static Y_AXIS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*y[- ]?axis[ \t]*:[ \t]*(.+)$").unwrap());

fn tidy_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .trim_matches(|c| c == '*' || c == '#')
        .trim()
        .trim_end_matches(':')
        .trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn table_header(content: &str) -> Option<Vec<String>> {
    let line = content
        .lines()
        .find(|l| l.contains('|') && !patterns::is_separator_line(l))?;
    let cells: Vec<String> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let header_like = cells.len() >= 2
        && cells
            .iter()
            .all(|c| !c.chars().any(|ch| ch.is_ascii_digit()));
    header_like.then_some(cells)
}

#[derive(Debug, Clone, Default)]
pub struct ChartTypeClassifier {
    config: ClassifierConfig,
}
impl ChartTypeClassifier {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, content: &str) -> AnalysisResult {
        if content.trim().is_empty() {
            return AnalysisResult::empty();
        }
        let max_matches = DATA_SHAPE_PATTERNS
            .iter()
            .map(|p| p.count(content))
            .max()
            .unwrap_or(0);
        let data_kind = self.detect_data_kind(content);
        let title = self.extract_explicit_title(content);
        let lower = content.to_lowercase();

        let mut confidence = 0;
        if max_matches > 0 {
            confidence += scoring::PATTERN_MATCH;
        }
        if max_matches >= scoring::MANY_POINTS_THRESHOLD {
            confidence += scoring::MANY_POINTS;
        }
        if data_kind.is_some() {
            confidence += scoring::DATA_TYPE;
        }
        if title.is_some() {
            confidence += scoring::TITLE;
        }
        if lower.contains("chart") || lower.contains("graph") {
            confidence += scoring::CHART_MENTION;
        }
        let confidence = confidence.min(scoring::MAX) as u8;
        let suggested_chart_type = self.detect_chart_type(content);
        debug!(
            confidence,
            max_matches,
            chart = %suggested_chart_type,
            "ChartTypeClassifier: scored content"
        );
        AnalysisResult {
            has_chart_data: confidence >= self.config.chart_data_threshold,
            confidence,
            suggested_chart_type,
            data_points: max_matches,
            data_type: data_kind.map_or(DataKind::Unknown, |r| r.kind),
            title,
            x_axis: self.infer_x_axis(content),
            y_axis: Some(data_kind.map_or("Value", |r| r.y_axis).to_string()),
        }
    }

    fn detect_data_kind(&self, content: &str) -> Option<&'static DataKindRule> {
        let lower = content.to_lowercase();
        DATA_KIND_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
    }

    pub fn detect_chart_type(&self, content: &str) -> ChartKind {
        let default = self
            .detect_data_kind(content)
            .map_or(ChartKind::Bar, |r| r.default_chart);
        CHART_SIGNALS
            .iter()
            .find(|(_, signals)| signals.iter().any(|re| re.is_match(content)))
            .map_or(default, |(kind, _)| *kind)
    }

    pub fn extract_explicit_title(&self, content: &str) -> Option<String> {
        TITLE_PATTERNS
            .iter()
            .filter_map(|re| re.captures(content))
            .find_map(|caps| tidy_title(&caps[1]))
    }

    pub fn extract_title(&self, content: &str) -> String {
        if let Some(title) = self.extract_explicit_title(content) {
            return title;
        }
        let lower = content.to_lowercase();
        let fallback = if lower.contains("temperature") {
            "Temperature Data"
        } else if lower.contains("argo") || lower.contains("float") {
            "ARGO Float Data"
        } else if lower.contains("annual") || lower.contains("yearly") {
            "Annual Data"
        } else {
            "Data Visualization"
        };
        fallback.to_string()
    }

    pub fn infer_x_axis(&self, content: &str) -> Option<String> {
        if content.contains("Date") || patterns::ISO_DATE.is_match(content) {
            Some("Date".to_string())
        } else if patterns::FOUR_DIGITS.is_match(content) {
            Some("Year".to_string())
        } else {
            None
        }
    }

    /// Labelled axis text wins, then the first table header, then inference.
    pub fn extract_axis_title(&self, content: &str, axis: Axis) -> String {
        let (label, column) = match axis {
            Axis::X => (&*X_AXIS_LABEL, 0),
            Axis::Y => (&*Y_AXIS_LABEL, 1),
        };
        if let Some(title) = label.captures(content).and_then(|c| tidy_title(&c[1])) {
            return title;
        }
        if let Some(header) = table_header(content) {
            return header[column].clone();
        }
        match axis {
            Axis::X => self
                .infer_x_axis(content)
                .unwrap_or_else(|| "Category".to_string()),
            Axis::Y => self
                .detect_data_kind(content)
                .map_or("Value", |r| r.y_axis)
                .to_string(),
        }
    }

    /// Table-oriented extraction over the data section of a structured reply.
    pub fn extract_data(&self, content: &str) -> Option<Vec<DataPoint>> {
        let points = StructuredResponse.extract(content);
        (!points.is_empty()).then_some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_spec::XValue;

    #[test]
    fn argo_heading_with_single_row_is_chartable() {
        let result = ChartTypeClassifier::new()
            .analyze("## ARGO Float Activations by Year\n| 2015 | 3000 |");
        // 30 pattern + 20 count type + 15 title
        assert_eq!(result.confidence, 65);
        assert!(result.has_chart_data);
        assert_eq!(result.data_type, DataKind::Count);
        assert_eq!(result.suggested_chart_type, ChartKind::Bar);
        assert_eq!(result.title.as_deref(), Some("ARGO Float Activations by Year"));
        assert_eq!(result.x_axis.as_deref(), Some("Year"));
        assert_eq!(result.data_points, 1);
    }

    #[test]
    fn confidence_caps_at_one_hundred() {
        let text = "# Temperature chart\n| 2024-01-01 | 12.5 |\n| 2024-01-02 | 13.1 |\n| 2024-01-03 | 12.9 |";
        let result = ChartTypeClassifier::new().analyze(text);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.data_type, DataKind::Temperature);
        assert_eq!(result.suggested_chart_type, ChartKind::Line);
        assert_eq!(result.x_axis.as_deref(), Some("Date"));
        assert_eq!(result.y_axis.as_deref(), Some("Temperature (°C)"));
    }

    #[test]
    fn plain_prose_is_not_chartable() {
        let result = ChartTypeClassifier::new().analyze("Hello there, how can I help?");
        assert_eq!(result.confidence, 0);
        assert!(!result.has_chart_data);
        assert_eq!(result.x_axis, None);
        assert_eq!(result.y_axis.as_deref(), Some("Value"));
        assert_eq!(ChartTypeClassifier::new().analyze("  "), AnalysisResult::empty());
    }

    #[test]
    fn threshold_is_configurable() {
        let strict = ChartTypeClassifier::with_config(ClassifierConfig {
            chart_data_threshold: 70,
        });
        assert!(!strict
            .analyze("## ARGO Float Activations by Year\n| 2015 | 3000 |")
            .has_chart_data);
    }

    #[test]
    fn signal_order_picks_first_matching_type() {
        let c = ChartTypeClassifier::new();
        assert_eq!(c.detect_chart_type("percentage trend over time"), ChartKind::Line);
        assert_eq!(c.detect_chart_type("the distribution of 40%"), ChartKind::Pie);
        assert_eq!(c.detect_chart_type("correlation of salinity"), ChartKind::Scatter);
        assert_eq!(c.detect_chart_type("number of floats"), ChartKind::Bar);
        assert_eq!(c.detect_chart_type("nothing"), ChartKind::Bar);
    }

    #[test]
    fn title_fallbacks() {
        let c = ChartTypeClassifier::new();
        assert_eq!(c.extract_title("Bar chart – Annual Activations\n"), "Annual Activations");
        assert_eq!(c.extract_title("Title: Float Census\nmore"), "Float Census");
        assert_eq!(c.extract_title("see **Key Numbers** below"), "Key Numbers");
        assert_eq!(c.extract_title("the temperature rose"), "Temperature Data");
        assert_eq!(c.extract_title("argo stuff"), "ARGO Float Data");
        assert_eq!(c.extract_title("yearly stuff"), "Annual Data");
        assert_eq!(c.extract_title("stuff"), "Data Visualization");
    }

    #[test]
    fn axis_titles_prefer_labels_then_headers() {
        let c = ChartTypeClassifier::new();
        let text = "| Year | Activations |\n|---|---|\n| 2020 | 10 |";
        assert_eq!(c.extract_axis_title(text, Axis::X), "Year");
        assert_eq!(c.extract_axis_title(text, Axis::Y), "Activations");
        let labelled = "x-axis: Season\ny axis: Floats deployed\n| 2020 | 10 |";
        assert_eq!(c.extract_axis_title(labelled, Axis::X), "Season");
        assert_eq!(c.extract_axis_title(labelled, Axis::Y), "Floats deployed");
        assert_eq!(c.extract_axis_title("no numbers", Axis::X), "Category");
    }

    #[test]
    fn extract_data_reads_data_section_rows() {
        let text = "Data:\n| Date | Temperature |\n|---|---|\n| 2024-01-01 | 12.5°C |\n| 2024-01-02 | n/a |";
        let points = ChartTypeClassifier::new().extract_data(text).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].x, XValue::from("2024-01-01"));
        assert_eq!(points[0].y, 12.5);
        assert!(ChartTypeClassifier::new().extract_data("no table").is_none());
    }
}
