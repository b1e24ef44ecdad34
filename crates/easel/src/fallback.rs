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
    AxisSpec, ChartSpecification, Layout, LineStyle, MarkerStyle, Trace, TraceType, XValue,
};
use crate::config::FallbackConfig;
use crate::detector::GenericChartDetector;
pub use crate::detector::is_generic_chart;
use chrono::{Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use regex::Regex;
use tracing::{debug, info};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}
impl<R: RngCore> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

const GREETINGS: &[&str] = &[
    "hi",
    "hii",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];
const LOCATIONS: &[&str] = &[
    "north atlantic",
    "pacific",
    "indian ocean",
    "mediterranean",
    "arctic",
    "antarctic",
];
const TIME_WORDS: &[&str] = &["time", "year", "month", "week", "day", "trend"];
const POSITION_WORDS: &[&str] = &["latitude", "longitude", "location"];
const OCEAN_WORDS: &[&str] = &["ocean", "atlantic", "pacific"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const DEPTH_PROFILE: [&str; 6] = ["0m", "50m", "100m", "200m", "500m", "1000m"];

static VISUALIZATION_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:plot|chart|graph|visuali[sz]e|show\b.*\b(?:chart|graph)|create\b.*\bchart|generate\b.*\bplot|draw\b.*\bgraph)",
    )
    .unwrap()
});
static VISUALIZATION_CONTEXT: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)\b(?:temperature|salinity|pressure)\b.*\b(?:trends?|over time|time series|last \d+ (?:day|week|month)s?)\b",
        )
        .unwrap(),
        Regex::new(r"(?i)\bdata visuali[sz]ation\b").unwrap(),
    ]
});
static DEPTH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*m").unwrap());

struct Measurement {
    keyword: &'static str,
    name: &'static str,
    axis: &'static str,
    anomaly_axis: &'static str,
    color: &'static str,
}

/// Checked in order: salinity, temperature, pressure, depth.
static MEASUREMENTS: [Measurement; 4] = [
    Measurement {
        keyword: "salinity",
        name: "Salinity",
        axis: "Salinity (PSU)",
        anomaly_axis: "Salinity Anomaly (PSU)",
        color: "#4ecdc4",
    },
    Measurement {
        keyword: "temperature",
        name: "Temperature",
        axis: "Temperature (°C)",
        anomaly_axis: "Temperature Anomaly (°C)",
        color: "#ff6b6b",
    },
    Measurement {
        keyword: "pressure",
        name: "Pressure",
        axis: "Pressure (dbar)",
        anomaly_axis: "Pressure Anomaly (dbar)",
        color: "#45b7d1",
    },
    Measurement {
        keyword: "depth",
        name: "Depth",
        axis: "Depth (m)",
        anomaly_axis: "Depth Anomaly (m)",
        color: "#96ceb4",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XAxisPlan {
    Time,
    Position,
    DepthProfile,
    OceanLatitude,
    Stations,
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// First matching predicate picks the x axis; `Stations` is the catch-all.
static X_AXIS_PLANS: [(fn(&str) -> bool, XAxisPlan); 4] = [
    (|m: &str| contains_any(m, TIME_WORDS), XAxisPlan::Time),
    (|m: &str| contains_any(m, POSITION_WORDS), XAxisPlan::Position),
    (
        |m: &str| m.contains("depth") && m.contains("profile"),
        XAxisPlan::DepthProfile,
    ),
    (|m: &str| contains_any(m, OCEAN_WORDS), XAxisPlan::OceanLatitude),
];

type WalkRule = fn(&str, Option<f64>) -> Option<(f64, f64)>;

/// Random-walk `(base, variation)` by keyword, first match wins.
static WALK_RULES: [WalkRule; 5] = [
    |m: &str, _: Option<f64>| m.contains("salinity").then_some((35.0, 0.8)),
    |_: &str, depth: Option<f64>| depth.map(|d| (0.0, d * 0.01)),
    |m: &str, _: Option<f64>| {
        m.contains("temperature").then(|| {
            if m.contains("alandi") {
                (27.3, 0.5)
            } else {
                (15.0, 3.0)
            }
        })
    },
    |m: &str, _: Option<f64>| m.contains("pressure").then_some((1013.0, 20.0)),
    |m: &str, _: Option<f64>| m.contains("anomal").then_some((0.0, 2.0)),
];

/// `None` means plain uniform noise instead of a walk.
fn walk_parameters(message: &str, depth: Option<f64>) -> Option<(f64, f64)> {
    WALK_RULES.iter().find_map(|rule| rule(message, depth))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_greeting(user_message: &str) -> bool {
    let normalised = user_message
        .to_lowercase()
        .trim()
        .trim_end_matches('!')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    GREETINGS.contains(&normalised.as_str())
}

pub fn is_visualization_request(user_message: &str) -> bool {
    VISUALIZATION_VERB.is_match(user_message)
        || VISUALIZATION_CONTEXT
            .iter()
            .any(|re| re.is_match(user_message))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackParameters {
    pub location: Option<String>,
    pub measurement: Option<&'static str>,
    pub y_axis_title: String,
    pub color: String,
    pub depth: Option<String>,
    pub anomaly: bool,
    pub trace_type: TraceType,
    pub title: String,
}
impl FallbackParameters {
    pub fn from_message(user_message: &str, default_color: &str) -> Self {
        let lower = user_message.to_lowercase();
        let anomaly = lower.contains("anomal");
        let location = LOCATIONS
            .iter()
            .find(|l| lower.contains(*l))
            .map(|l| title_case(l));
        let measurement = MEASUREMENTS.iter().find(|m| lower.contains(m.keyword));
        let depth = DEPTH_TOKEN.captures(&lower).map(|c| c[1].to_string());
        let trace_type = if lower.contains("bar") || lower.contains("histogram") {
            TraceType::Bar
        } else {
            TraceType::Scatter
        };

        let mut title = measurement.map_or("Data", |m| m.name).to_string();
        if anomaly {
            title.push_str(" Anomalies");
        }
        if let Some(depth) = &depth {
            title.push_str(&format!(" at {depth}m depth"));
        }
        if let Some(location) = &location {
            title.push_str(&format!(" in {location}"));
        }
        Self {
            location,
            measurement: measurement.map(|m| m.name),
            y_axis_title: measurement
                .map_or("Value", |m| if anomaly { m.anomaly_axis } else { m.axis })
                .to_string(),
            color: measurement.map_or(default_color, |m| m.color).to_string(),
            depth,
            anomaly,
            trace_type,
            title,
        }
    }
}

pub struct FallbackSynthesizer<R: RandomSource = StdRng> {
    rng: R,
    today: Option<NaiveDate>,
    config: FallbackConfig,
    detector: GenericChartDetector,
}
impl FallbackSynthesizer<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}
impl Default for FallbackSynthesizer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}
impl<R: RandomSource> FallbackSynthesizer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            today: None,
            config: FallbackConfig::default(),
            detector: GenericChartDetector,
        }
    }
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
    pub fn with_config(mut self, config: FallbackConfig) -> Self {
        self.config = config;
        self
    }

    /// Synthesizes a placeholder chart, but only for explicit visualization requests.
    pub fn generate_fallback_chart(
        &mut self,
        user_message: &str,
        backend_chart: Option<&ChartSpecification>,
    ) -> Option<ChartSpecification> {
        if user_message.trim().is_empty()
            || is_greeting(user_message)
            || !is_visualization_request(user_message)
        {
            return None;
        }
        if let Some(chart) = backend_chart {
            if !chart.is_empty() && !self.detector.is_generic_chart(chart, user_message) {
                debug!("FallbackSynthesizer: keeping backend chart");
                return Some(chart.clone());
            }
        }
        let lower = user_message.to_lowercase();
        let params = FallbackParameters::from_message(user_message, &self.config.default_color);
        let (labels, x_axis_title) = self.x_axis(&lower);
        let depth = params.depth.as_deref().and_then(|d| d.parse::<f64>().ok());
        let y = self.series(&lower, depth, labels.len());
        info!(
            title = %params.title,
            points = labels.len(),
            "FallbackSynthesizer: synthesized placeholder chart"
        );

        let is_scatter = params.trace_type == TraceType::Scatter;
        let trace = Trace {
            trace_type: params.trace_type,
            mode: is_scatter.then(|| "lines+markers".to_string()),
            x: labels.into_iter().map(XValue::Text).collect(),
            y,
            name: Some(params.measurement.unwrap_or("Data").to_string()),
            fill: None,
            line: is_scatter.then(|| LineStyle {
                color: Some(params.color.clone()),
                width: Some(2.0),
                shape: None,
            }),
            marker: Some(MarkerStyle {
                color: Some(params.color.clone()),
                size: is_scatter.then_some(6.0),
            }),
        };
        Some(ChartSpecification {
            data: vec![trace],
            layout: Layout {
                title: params.title,
                xaxis: AxisSpec::titled(x_axis_title),
                yaxis: AxisSpec::titled(params.y_axis_title),
                height: Some(self.config.chart_height),
                showlegend: Some(false),
            },
        })
    }

    fn x_axis(&mut self, message: &str) -> (Vec<String>, String) {
        let plan = X_AXIS_PLANS
            .iter()
            .find(|(matches, _)| matches(message))
            .map_or(XAxisPlan::Stations, |(_, plan)| *plan);
        match plan {
            XAxisPlan::Time => (self.time_labels(message), "Time".to_string()),
            XAxisPlan::Position => (
                (0..5).map(|i| format!("{}°N", 40 + i * 5)).collect(),
                "Latitude".to_string(),
            ),
            XAxisPlan::DepthProfile => (
                DEPTH_PROFILE.iter().map(|d| d.to_string()).collect(),
                "Depth".to_string(),
            ),
            XAxisPlan::OceanLatitude => (
                (0..12).map(|i| format!("{}°N", 40 + i * 2)).collect(),
                "Latitude".to_string(),
            ),
            XAxisPlan::Stations => {
                let count = self.station_count();
                (
                    (1..=count).map(|i| format!("Station {i}")).collect(),
                    "Station".to_string(),
                )
            }
        }
    }

    fn time_labels(&self, message: &str) -> Vec<String> {
        if message.contains("2000") && message.contains("2020") {
            (0..5).map(|i| (2000 + i * 5).to_string()).collect()
        } else if message.contains("month") {
            MONTHS.iter().map(|m| m.to_string()).collect()
        } else if message.contains("week") || message.contains("7 day") {
            self.recent_dates(7)
        } else {
            self.recent_dates(20)
        }
    }

    fn recent_dates(&self, count: i64) -> Vec<String> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        (0..count)
            .rev()
            .map(|back| (today - Duration::days(back)).format("%b %-d").to_string())
            .collect()
    }

    // Kept as max(8, min(15, floor(r * 8) + 8)); the clamps never bind for r in [0, 1).
    fn station_count(&mut self) -> usize {
        let drawn = (self.rng.next_f64() * 8.0).floor() as usize + 8;
        drawn.min(15).max(8)
    }

    fn series(&mut self, message: &str, depth: Option<f64>, len: usize) -> Vec<f64> {
        match walk_parameters(message, depth) {
            Some((base, variation)) => {
                let mut values = Vec::with_capacity(len);
                let mut current = round2(base);
                for i in 0..len {
                    if i > 0 {
                        current = round2(current + (self.rng.next_f64() - 0.5) * variation);
                    }
                    values.push(current);
                }
                values
            }
            None => (0..len)
                .map(|_| round2(self.rng.next_f64() * 100.0))
                .collect(),
        }
    }
}
