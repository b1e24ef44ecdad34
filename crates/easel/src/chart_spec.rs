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

use crate::error::{Result, SerialisationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    Integer(i64),
    Number(f64),
    Text(String),
}
impl XValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            XValue::Integer(i) => Some(*i as f64),
            XValue::Number(n) => Some(*n),
            XValue::Text(_) => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
    /// Numbers sort before text; text sorts lexically.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}
impl fmt::Display for XValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XValue::Integer(i) => write!(f, "{i}"),
            XValue::Number(n) => write!(f, "{n}"),
            XValue::Text(s) => f.write_str(s),
        }
    }
}
impl From<i64> for XValue {
    fn from(value: i64) -> Self {
        XValue::Integer(value)
    }
}
impl From<&str> for XValue {
    fn from(value: &str) -> Self {
        XValue::Text(value.to_string())
    }
}
impl From<String> for XValue {
    fn from(value: String) -> Self {
        XValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: XValue,
    pub y: f64,
    pub label: String,
}
impl DataPoint {
    /// Returns `None` when `y` is not a finite number.
    pub fn new(x: XValue, y: f64) -> Option<Self> {
        if !y.is_finite() {
            return None;
        }
        let label = x.to_string();
        Some(Self { x, y, label })
    }
    pub fn with_label(x: XValue, y: f64, label: impl Into<String>) -> Option<Self> {
        Self::new(x, y).map(|mut p| {
            p.label = label.into();
            p
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    Area,
}
impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Area => "area",
        }
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Temperature,
    Count,
    Percentage,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub has_chart_data: bool,
    pub confidence: u8,
    pub suggested_chart_type: ChartKind,
    pub data_points: usize,
    pub data_type: DataKind,
    pub title: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
}
impl AnalysisResult {
    pub fn empty() -> Self {
        Self {
            has_chart_data: false,
            confidence: 0,
            suggested_chart_type: ChartKind::Bar,
            data_points: 0,
            data_type: DataKind::Unknown,
            title: None,
            x_axis: None,
            y_axis: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    Bar,
    Scatter,
    Line,
    Pie,
    #[serde(other)]
    Other,
}
impl TraceType {
    pub fn is_line_like(&self) -> bool {
        matches!(self, TraceType::Scatter | TraceType::Line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: TraceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub x: Vec<XValue>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
}
impl Trace {
    pub fn from_points(trace_type: TraceType, points: &[DataPoint]) -> Self {
        let (x, y) = points.iter().map(|p| (p.x.clone(), p.y)).unzip();
        Self {
            trace_type,
            mode: None,
            x,
            y,
            name: None,
            fill: None,
            line: None,
            marker: None,
        }
    }
    pub fn is_consistent(&self) -> bool {
        self.x.len() == self.y.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    #[serde(default)]
    pub title: String,
}
impl AxisSpec {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub xaxis: AxisSpec,
    #[serde(default)]
    pub yaxis: AxisSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpecification {
    #[serde(default)]
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Layout,
}
impl ChartSpecification {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|source| SerialisationError::Json { source }.into())
    }
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|source| SerialisationError::Json { source }.into())
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn x_values(&self) -> impl Iterator<Item = &XValue> {
        self.data.iter().flat_map(|t| t.x.iter())
    }
    pub fn is_consistent(&self) -> bool {
        self.data.iter().all(Trace::is_consistent)
    }
}
