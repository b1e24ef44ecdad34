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

use crate::chart_spec::{ChartSpecification, XValue};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericReason {
    BoilerplateMonths,
    MissingTemperature,
    MissingSalinity,
    SalesScaleValues,
}
impl fmt::Display for GenericReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GenericReason::BoilerplateMonths => "x axis is January/February/March boilerplate",
            GenericReason::MissingTemperature => "temperature requested but not charted",
            GenericReason::MissingSalinity => "salinity requested but not charted",
            GenericReason::SalesScaleValues => "ocean query charted with sales-sized values",
        };
        f.write_str(text)
    }
}

const BOILERPLATE_MONTHS: [&str; 3] = ["January", "February", "March"];
const SALES_SCALE: f64 = 100_000.0;

/// Flags charts that look like placeholder data rather than an answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericChartDetector;
impl GenericChartDetector {
    pub fn detect(&self, spec: &ChartSpecification, user_message: &str) -> Option<GenericReason> {
        let message = user_message.to_lowercase();
        let about_sales = message.contains("sales");
        let title = spec.layout.title.to_lowercase();
        let y_title = spec.layout.yaxis.title.to_lowercase();
        let charted = |term: &str| title.contains(term) || y_title.contains(term);

        if !about_sales && !message.contains("q1") {
            let months: Vec<&str> = spec.x_values().filter_map(XValue::as_text).collect();
            if BOILERPLATE_MONTHS.iter().all(|m| months.contains(m)) {
                return Some(GenericReason::BoilerplateMonths);
            }
        }
        if message.contains("temperature") && !charted("temperature") {
            return Some(GenericReason::MissingTemperature);
        }
        if message.contains("salinity") && !charted("salinity") {
            return Some(GenericReason::MissingSalinity);
        }
        let oceanic = ["ocean", "atlantic", "pacific"]
            .iter()
            .any(|t| message.contains(t));
        if oceanic
            && !about_sales
            && spec
                .data
                .iter()
                .any(|t| t.y.iter().any(|v| *v > SALES_SCALE))
        {
            return Some(GenericReason::SalesScaleValues);
        }
        None
    }

    pub fn is_generic_chart(&self, spec: &ChartSpecification, user_message: &str) -> bool {
        match self.detect(spec, user_message) {
            Some(reason) => {
                warn!(%reason, title = %spec.layout.title, "GenericChartDetector: chart looks generic");
                true
            }
            None => false,
        }
    }
}

pub fn is_generic_chart(spec: &ChartSpecification, user_message: &str) -> bool {
    GenericChartDetector.is_generic_chart(spec, user_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_spec::{AxisSpec, Layout, Trace, TraceType};

    fn spec(x: &[&str], y: &[f64], title: &str, y_title: &str) -> ChartSpecification {
        ChartSpecification {
            data: vec![Trace {
                trace_type: TraceType::Bar,
                mode: None,
                x: x.iter().map(|s| XValue::from(*s)).collect(),
                y: y.to_vec(),
                name: None,
                fill: None,
                line: None,
                marker: None,
            }],
            layout: Layout {
                title: title.into(),
                xaxis: AxisSpec::titled("Month"),
                yaxis: AxisSpec::titled(y_title),
                ..Default::default()
            },
        }
    }

    #[test]
    fn month_boilerplate_is_generic_unless_sales() {
        let s = spec(&["January", "February", "March"], &[1.0, 2.0, 3.0], "Ocean Temperature", "Temperature");
        assert_eq!(
            GenericChartDetector.detect(&s, "show ocean temperature"),
            Some(GenericReason::BoilerplateMonths)
        );
        assert!(is_generic_chart(&s, "show ocean temperature"));
        assert!(!is_generic_chart(&s, "Q1 sales temperature"));
    }

    #[test]
    fn requested_measure_must_be_charted() {
        let s = spec(&["a", "b"], &[1.0, 2.0], "Pressure", "dbar");
        assert_eq!(
            GenericChartDetector.detect(&s, "temperature please"),
            Some(GenericReason::MissingTemperature)
        );
        assert_eq!(
            GenericChartDetector.detect(&s, "salinity please"),
            Some(GenericReason::MissingSalinity)
        );
        let ok = spec(&["a"], &[1.0], "Profile", "Salinity (PSU)");
        assert!(!is_generic_chart(&ok, "salinity please"));
    }

    #[test]
    fn huge_values_on_ocean_queries() {
        let s = spec(&["a", "b"], &[10.0, 250_000.0], "Revenue", "USD");
        assert_eq!(
            GenericChartDetector.detect(&s, "north atlantic floats"),
            Some(GenericReason::SalesScaleValues)
        );
        assert!(!is_generic_chart(&s, "atlantic sales"));
        assert!(!is_generic_chart(&s, "hello"));
    }
}
