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

use crate::chart_spec::{DataPoint, XValue};
use crate::config::ExtractionConfig;
use crate::patterns::{
    self, parse_float_prefix, parse_int_prefix, parse_loose_number, strip_separators,
};
use itertools::Itertools;
use serde_json::Value;
use tracing::debug;

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    /// Never fails; an empty vector means the strategy found nothing.
    fn extract(&self, content: &str) -> Vec<DataPoint>;
}

fn sort_by_x(points: &mut [DataPoint]) {
    points.sort_by(|a, b| a.x.sort_cmp(&b.x));
}

fn parse_x_cell(cell: &str) -> XValue {
    if patterns::ISO_DATE_EXACT.is_match(cell) {
        XValue::Text(cell.to_string())
    } else if patterns::YEAR_EXACT.is_match(cell) {
        cell.parse().map_or_else(|_| XValue::from(cell), XValue::Integer)
    } else {
        XValue::from(cell)
    }
}

/// Pipe-delimited rows found after a line announcing data or an interpretation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredResponse;
impl StructuredResponse {
    fn opens_section(line: &str) -> bool {
        let lower = line.to_lowercase();
        lower.contains("interpretation")
            || lower.contains("data")
            || (line.contains("Date") && line.contains("Temperature"))
    }
}
impl ExtractionStrategy for StructuredResponse {
    fn name(&self) -> &'static str {
        "structured_response"
    }
    fn extract(&self, content: &str) -> Vec<DataPoint> {
        let mut in_section = false;
        let mut points = Vec::new();
        for line in content.lines() {
            if Self::opens_section(line) {
                in_section = true;
                continue;
            }
            if !in_section || patterns::is_separator_line(line) || !line.contains('|') {
                continue;
            }
            let cells: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if cells.len() < 2 {
                continue;
            }
            let Some(y) = parse_loose_number(cells[1]) else {
                continue;
            };
            points.extend(DataPoint::with_label(parse_x_cell(cells[0]), y, cells[0]));
        }
        points
    }
}

#[derive(Debug, Clone)]
pub struct MarkdownTable {
    config: ExtractionConfig,
}
impl MarkdownTable {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
    fn year_point(&self, year: Option<i64>, value: Option<f64>) -> Option<DataPoint> {
        let year = year.filter(|y| self.config.accepts_year(*y))?;
        DataPoint::new(XValue::Integer(year), value?)
    }
    fn split_rows(&self, content: &str) -> Vec<DataPoint> {
        content
            .lines()
            .filter(|line| line.contains('|'))
            .filter_map(|line| {
                let cells: Vec<&str> = line.split('|').collect();
                if cells.len() < 3 {
                    return None;
                }
                let year = parse_int_prefix(cells[1].trim());
                let value = parse_int_prefix(&strip_separators(cells[2])).map(|v| v as f64);
                self.year_point(year, value)
            })
            .collect()
    }
}
impl Default for MarkdownTable {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
impl ExtractionStrategy for MarkdownTable {
    fn name(&self) -> &'static str {
        "markdown_table"
    }
    fn extract(&self, content: &str) -> Vec<DataPoint> {
        let rows: Vec<_> = patterns::SIMPLE_TABLE_ROW.captures_iter(content).collect();
        if rows.is_empty() {
            return self.split_rows(content);
        }
        rows.iter()
            .filter_map(|caps| {
                let year = caps[1].parse().ok();
                let value = parse_float_prefix(&strip_separators(&caps[2]));
                self.year_point(year, value)
            })
            .collect()
    }
}

/// Prose such as "in 2019 there were 1,200 activations".
#[derive(Debug, Clone)]
pub struct DescriptiveText {
    config: ExtractionConfig,
}
impl DescriptiveText {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}
impl Default for DescriptiveText {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
impl ExtractionStrategy for DescriptiveText {
    fn name(&self) -> &'static str {
        "descriptive_text"
    }
    fn extract(&self, content: &str) -> Vec<DataPoint> {
        let mut points: Vec<DataPoint> = patterns::DESCRIPTIVE_YEAR_VALUE
            .captures_iter(content)
            .filter_map(|caps| {
                let year: i64 = caps[1].parse().ok()?;
                if !self.config.accepts_year(year) {
                    return None;
                }
                let value = parse_float_prefix(&strip_separators(&caps[2]))?;
                DataPoint::new(XValue::Integer(year), value)
            })
            .unique_by(|p| p.label.clone())
            .collect();
        sort_by_x(&mut points);
        points
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedJson;
impl EmbeddedJson {
    fn point_from(item: &Value) -> Option<DataPoint> {
        let obj = item.as_object()?;
        let x = match obj.get("x")? {
            Value::Number(n) => n
                .as_i64()
                .map(XValue::Integer)
                .or_else(|| n.as_f64().map(XValue::Number))?,
            Value::String(s) => XValue::Text(s.clone()),
            _ => return None,
        };
        let y = match obj.get("y")? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        let label = obj
            .get("label")
            .and_then(Value::as_str)
            .map_or_else(|| x.to_string(), str::to_string);
        DataPoint::with_label(x, y, label)
    }
}
impl ExtractionStrategy for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded_json"
    }
    fn extract(&self, content: &str) -> Vec<DataPoint> {
        let mut points = Vec::new();
        for candidate in patterns::JSON_ARRAY.find_iter(content) {
            match serde_json::from_str::<Vec<Value>>(candidate.as_str()) {
                Ok(items) => points.extend(items.iter().filter_map(Self::point_from)),
                Err(e) => {
                    debug!(error = %e, "EmbeddedJson: skipping unparseable array");
                }
            }
        }
        points
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BulletPoints;
impl ExtractionStrategy for BulletPoints {
    fn name(&self) -> &'static str {
        "bullet_points"
    }
    fn extract(&self, content: &str) -> Vec<DataPoint> {
        let mut points: Vec<DataPoint> = patterns::BULLET_YEAR_VALUE
            .captures_iter(content)
            .filter_map(|caps| {
                let year: i64 = caps[1].parse().ok()?;
                let value = parse_int_prefix(&strip_separators(&caps[2]))?;
                DataPoint::new(XValue::Integer(year), value as f64)
            })
            .collect();
        sort_by_x(&mut points);
        points
    }
}

const SAMPLE_SERIES: [(i64, f64); 5] = [
    (2019, 120.0),
    (2020, 150.0),
    (2021, 170.0),
    (2022, 160.0),
    (2023, 190.0),
];

/// Last in line. Returns nothing unless sample data is switched on in
/// [`ExtractionConfig`]; made-up numbers are left to the fallback synthesizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleData {
    enabled: bool,
}
impl SampleData {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            enabled: config.enable_sample_data,
        }
    }
}
impl ExtractionStrategy for SampleData {
    fn name(&self) -> &'static str {
        "sample_data"
    }
    fn extract(&self, _content: &str) -> Vec<DataPoint> {
        if !self.enabled {
            return Vec::new();
        }
        SAMPLE_SERIES
            .iter()
            .filter_map(|(x, y)| DataPoint::new(XValue::Integer(*x), *y))
            .collect()
    }
}

pub fn default_strategies(config: &ExtractionConfig) -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(StructuredResponse),
        Box::new(MarkdownTable::new(config)),
        Box::new(DescriptiveText::new(config)),
        Box::new(EmbeddedJson),
        Box::new(BulletPoints),
        Box::new(SampleData::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xs(points: &[DataPoint]) -> Vec<XValue> {
        points.iter().map(|p| p.x.clone()).collect()
    }

    #[test]
    fn structured_rows_need_a_section_opener() {
        let rows = "| 2020 | 5 |\n| 2021 | 6 |";
        assert!(StructuredResponse.extract(rows).is_empty());
        let points = StructuredResponse.extract(&format!("Interpretation\n{rows}\n| 2022 | - |"));
        assert_eq!(xs(&points), vec![XValue::Integer(2020), XValue::Integer(2021)]);
        assert_eq!(points[1].y, 6.0);
    }

    #[test]
    fn structured_rows_keep_non_year_labels_as_text() {
        let points = StructuredResponse.extract("Raw data\n| Station A | 1,500.5 |\n| x |");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].x, XValue::from("Station A"));
        assert_eq!(points[0].y, 1500.5);
    }

    #[test]
    fn table_regex_rows() {
        let points = MarkdownTable::default().extract("| 2020 | 1,234 |\n| 2021 | 2,345 |");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], DataPoint::new(XValue::Integer(2020), 1234.0).unwrap());
        assert_eq!(points[1].label, "2021");
        assert_eq!(points[1].y, 2345.0);
    }

    #[test]
    fn table_split_fallback_applies_year_range() {
        let text = "| Year | Floats |\n|---|---|\n| 2019 | 1,000 floats |\n| 1850 | 12 units |\n| 2020 | 1 200 floats |";
        let points = MarkdownTable::default().extract(text);
        assert_eq!(xs(&points), vec![XValue::Integer(2019), XValue::Integer(2020)]);
        assert_eq!(points[1].y, 1200.0);
    }

    #[test]
    fn descriptive_text_dedups_and_sorts() {
        let text = "In 2021 there were 2,000 activations. Back in 2019 we saw 900 floats. \
                    In 2021 a recount gave 2,100 activations. Year 1800 had 5 units.";
        let points = DescriptiveText::default().extract(text);
        assert_eq!(xs(&points), vec![XValue::Integer(2019), XValue::Integer(2021)]);
        assert_eq!(points[1].y, 2000.0);
    }

    #[test]
    fn embedded_json_skips_bad_arrays() {
        let text = r#"bad: [1, 2,] good: [{"x": 2020, "y": 3.5, "label": "first"}, {"x": "b", "y": "4"}, {"x": 1}]"#;
        let points = EmbeddedJson.extract(text);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "first");
        assert_eq!(points[1].x, XValue::from("b"));
        assert_eq!(points[1].label, "b");
        assert_eq!(points[1].y, 4.0);
    }

    #[test]
    fn bullets_sorted_by_year() {
        let text = "- 2022: 3,000\n• 2020: 1,234\n* 2021: 2000";
        let points = BulletPoints.extract(text);
        assert_eq!(
            xs(&points),
            vec![XValue::Integer(2020), XValue::Integer(2021), XValue::Integer(2022)]
        );
        assert_eq!(points[0].y, 1234.0);
    }

    #[test]
    fn sample_data_is_off_by_default() {
        assert!(SampleData::default().extract("anything").is_empty());
        let enabled = SampleData::new(&ExtractionConfig {
            enable_sample_data: true,
            ..Default::default()
        });
        assert_eq!(enabled.extract("anything").len(), 5);
    }
}
