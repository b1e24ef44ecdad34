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

use easel::chart_spec::{DataPoint, XValue};
use easel::extractor::strategies::{
    default_strategies, BulletPoints, DescriptiveText, ExtractionStrategy, MarkdownTable,
};
use easel::config::ExtractionConfig;
use easel::SeriesExtractor;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingStrategy {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    yields: Vec<DataPoint>,
}

impl ExtractionStrategy for CountingStrategy {
    fn name(&self) -> &'static str {
        self.name
    }
    fn extract(&self, _content: &str) -> Vec<DataPoint> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.yields.clone()
    }
}

fn counting(name: &'static str, yields: Vec<DataPoint>) -> (Box<dyn ExtractionStrategy>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let strategy = CountingStrategy {
        name,
        calls: Arc::clone(&calls),
        yields,
    };
    (Box::new(strategy), calls)
}

fn point(year: i64, y: f64) -> DataPoint {
    DataPoint::new(XValue::Integer(year), y).unwrap()
}

#[test]
fn test_later_strategies_do_not_run_after_a_hit() {
    let (first, first_calls) = counting("first", Vec::new());
    let (second, second_calls) = counting("second", vec![point(2020, 1.0)]);
    let (third, third_calls) = counting("third", vec![point(2021, 2.0)]);
    let extractor = SeriesExtractor::with_strategies(vec![first, second, third]);

    let extraction = extractor.extract_with_source("anything").unwrap();
    assert_eq!(extraction.strategy, "second");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_blank_content_runs_no_strategy() {
    let (only, calls) = counting("only", vec![point(2020, 1.0)]);
    let extractor = SeriesExtractor::with_strategies(vec![only]);
    assert!(extractor.extract("   \n").is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_default_strategy_order() {
    assert_eq!(
        SeriesExtractor::new().strategy_names(),
        vec![
            "structured_response",
            "markdown_table",
            "descriptive_text",
            "embedded_json",
            "bullet_points",
            "sample_data",
        ]
    );
}

#[test]
fn test_table_wins_over_bullets() {
    let content = "| 2020 | 100 |\n| 2021 | 200 |\n\n- 2019: 50\n- 2022: 70\n";
    let extraction = SeriesExtractor::new().extract_with_source(content).unwrap();
    assert_eq!(extraction.strategy, "markdown_table");
    assert_eq!(
        extraction.points.iter().map(|p| p.y).collect::<Vec<_>>(),
        vec![100.0, 200.0]
    );
    assert!(!BulletPoints.extract(content).is_empty());
}

#[test]
fn test_sample_series_only_when_enabled() {
    let content = "nothing chartable here";
    assert!(SeriesExtractor::new().extract(content).is_empty());

    let config = ExtractionConfig {
        enable_sample_data: true,
        ..ExtractionConfig::default()
    };
    let names: Vec<_> = default_strategies(&config)
        .iter()
        .map(|s| (s.name(), s.extract(content).len()))
        .collect();
    assert_eq!(names.last().map(|(name, _)| *name), Some("sample_data"));
    assert!(names.last().map_or(0, |(_, n)| *n) > 0);
}

proptest! {
    #[test]
    fn prop_table_years_stay_in_range(rows in prop::collection::vec((1000i64..3000, 0u32..1_000_000), 1..12)) {
        let content: String = rows
            .iter()
            .map(|(year, value)| format!("| {year} | {value} |\n"))
            .collect();
        for p in MarkdownTable::default().extract(&content) {
            prop_assert!(p.y.is_finite());
            let year = p.x.as_f64().unwrap();
            prop_assert!((1900.0..=2100.0).contains(&year));
        }
    }

    #[test]
    fn prop_descriptive_years_stay_in_range(rows in prop::collection::vec((1000i64..3000, 0u32..100_000), 1..8)) {
        let content: String = rows
            .iter()
            .map(|(year, value)| format!("In {year} there were {value} activations. "))
            .collect();
        for p in DescriptiveText::default().extract(&content) {
            prop_assert!(p.y.is_finite());
            let year = p.x.as_f64().unwrap();
            prop_assert!((1900.0..=2100.0).contains(&year));
        }
    }

    #[test]
    fn prop_no_strategy_emits_nan(content in "[a-z0-9|:,.\\-\\[\\] \n]{0,160}") {
        for strategy in default_strategies(&ExtractionConfig::default()) {
            for p in strategy.extract(&content) {
                prop_assert!(p.y.is_finite(), "{} emitted {}", strategy.name(), p.y);
            }
        }
    }
}
