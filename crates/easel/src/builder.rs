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

use crate::chart_spec::{
    AxisSpec, ChartKind, ChartSpecification, Layout, LineStyle, MarkerStyle, Trace, TraceType,
};
use crate::config::PipelineConfig;
use crate::extractor::ParsedChart;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static BAR_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)bar chart").unwrap());
static LINE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)line chart").unwrap());
static RECENT_WINDOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)last \d+ (?:day|week|month)s?").unwrap());

const LINES_AND_MARKERS: &str = "lines+markers";
const TEMPERATURE_AXIS: &str = "Temperature (°C)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestedStyle {
    Line,
    Bar,
}

fn requested_style(user_message: &str) -> Option<RequestedStyle> {
    let lower = user_message.to_lowercase();
    let mentions_chart = lower.contains("chart") || lower.contains("graph");
    let wants_line = lower.contains("line chart")
        || lower.contains("line graph")
        || lower.contains("trend")
        || (lower.contains("line") && mentions_chart);
    let wants_bar = lower.contains("bar chart")
        || lower.contains("bar graph")
        || (lower.contains("bar") && mentions_chart);
    match (wants_line, wants_bar) {
        (true, false) => Some(RequestedStyle::Line),
        (false, true) => Some(RequestedStyle::Bar),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ChartSpecBuilder {
    temperature_color: String,
    chart_height: u32,
}
impl Default for ChartSpecBuilder {
    fn default() -> Self {
        Self::with_config(&PipelineConfig::default())
    }
}
impl ChartSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: &PipelineConfig) -> Self {
        Self {
            temperature_color: config.enhancement.temperature_color.clone(),
            chart_height: config.fallback.chart_height,
        }
    }

    pub fn build(&self, parsed: &ParsedChart) -> ChartSpecification {
        let (trace_type, mode, fill) = match parsed.chart_type {
            ChartKind::Line => (TraceType::Scatter, Some(LINES_AND_MARKERS), None),
            ChartKind::Bar => (TraceType::Bar, None, None),
            ChartKind::Pie => (TraceType::Pie, None, None),
            ChartKind::Scatter => (TraceType::Scatter, Some("markers"), None),
            ChartKind::Area => (TraceType::Scatter, Some("lines"), Some("tozeroy")),
        };
        let mut trace = Trace::from_points(trace_type, &parsed.data);
        trace.mode = mode.map(str::to_string);
        trace.fill = fill.map(str::to_string);
        trace.name = Some(parsed.y_axis_title.clone());
        if mode.is_some() {
            trace.line = Some(LineStyle {
                width: Some(2.0),
                ..Default::default()
            });
        }
        ChartSpecification {
            data: vec![trace],
            layout: Layout {
                title: parsed.title.clone(),
                xaxis: AxisSpec::titled(parsed.x_axis_title.clone()),
                yaxis: AxisSpec::titled(parsed.y_axis_title.clone()),
                height: Some(self.chart_height),
                showlegend: Some(false),
            },
        }
    }

    /// Switches bar traces to lines or back when the user asks for exactly one of them.
    pub fn convert_chart_type(
        &self,
        spec: &ChartSpecification,
        user_message: &str,
    ) -> ChartSpecification {
        let mut converted = spec.clone();
        if converted.data.is_empty() {
            return converted;
        }
        match requested_style(user_message) {
            Some(RequestedStyle::Line) => {
                for trace in converted
                    .data
                    .iter_mut()
                    .filter(|t| t.trace_type == TraceType::Bar)
                {
                    trace.trace_type = TraceType::Scatter;
                    trace.mode = Some(LINES_AND_MARKERS.to_string());
                }
                converted.layout.title = BAR_TITLE
                    .replace_all(&converted.layout.title, "Line Chart")
                    .into_owned();
                debug!("ChartSpecBuilder: converted bar traces to lines");
            }
            Some(RequestedStyle::Bar) => {
                for trace in converted
                    .data
                    .iter_mut()
                    .filter(|t| t.trace_type.is_line_like())
                {
                    trace.trace_type = TraceType::Bar;
                    trace.mode = None;
                }
                converted.layout.title = LINE_TITLE
                    .replace_all(&converted.layout.title, "Bar Chart")
                    .into_owned();
                debug!("ChartSpecBuilder: converted line traces to bars");
            }
            None => {}
        }
        converted
    }

    pub fn enhance_chart(
        &self,
        spec: &ChartSpecification,
        user_message: &str,
    ) -> ChartSpecification {
        let mut enhanced = spec.clone();
        let lower = user_message.to_lowercase();
        if lower.contains("temperature") {
            for trace in enhanced
                .data
                .iter_mut()
                .filter(|t| t.trace_type.is_line_like())
            {
                trace.line.get_or_insert_with(LineStyle::default).color =
                    Some(self.temperature_color.clone());
                trace.marker.get_or_insert_with(MarkerStyle::default).color =
                    Some(self.temperature_color.clone());
            }
            if !enhanced.layout.yaxis.has_title() {
                enhanced.layout.yaxis = AxisSpec::titled(TEMPERATURE_AXIS);
            }
        }
        if RECENT_WINDOW.is_match(user_message) {
            for trace in enhanced
                .data
                .iter_mut()
                .filter(|t| t.trace_type.is_line_like())
            {
                trace.line.get_or_insert_with(LineStyle::default).shape = Some("spline".into());
            }
        }
        enhanced
    }
}
