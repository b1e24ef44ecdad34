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

//! Regexes shared by the classifier and the series extractor, so both agree on
//! what a year, a table row or a date looks like.

use once_cell::sync::Lazy;
use regex::Regex;

pub struct NamedPattern {
    pub name: &'static str,
    pub regex: Regex,
}
impl NamedPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

/// Unit words that mark a number as a count of things.
pub const COUNT_UNIT_WORDS: &[&str] = &["activations", "floats", "units", "count", "total"];

pub static YEAR_VALUE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|[ \t]*(\d{4})[ \t]*\|[ \t]*(\d[\d,. ]*)[ \t]*\|").unwrap());
pub static DATE_VALUE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|[ \t]*(\d{4}-\d{2}-\d{2})[ \t]*\|[ \t]*(-?\d[\d,.]*)").unwrap()
});
pub static DATE_NUMERIC_SEQ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})[^\d\n]{1,20}?(-?\d+(?:\.\d+)?)").unwrap()
});
pub static YEAR_FORMATTED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\b[^\d\n]{1,30}?(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)").unwrap()
});

/// Patterns whose presence suggests the text carries a plottable series.
pub static DATA_SHAPE_PATTERNS: Lazy<Vec<NamedPattern>> = Lazy::new(|| {
    vec![
        NamedPattern::new("year_value_row", YEAR_VALUE_ROW.as_str()),
        NamedPattern::new("date_value_row", DATE_VALUE_ROW.as_str()),
        NamedPattern::new("date_numeric_sequence", DATE_NUMERIC_SEQ.as_str()),
        NamedPattern::new("year_formatted_number", YEAR_FORMATTED_NUMBER.as_str()),
    ]
});

pub static SIMPLE_TABLE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|[ \t]*(\d{4})[ \t]*\|[ \t]*([\d, ]+?)[ \t]*\|").unwrap());
pub static DESCRIPTIVE_YEAR_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{4}})\b[^\d\n]*?(\d{{1,3}}(?:,\d{{3}})+|\d+)\s+({})\b",
        COUNT_UNIT_WORDS.join("|")
    ))
    .unwrap()
});
pub static BULLET_YEAR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-•*][ \t]*(\d{4})[ \t]*:[ \t]*([\d,]+)").unwrap());
pub static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());

pub static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
pub static ISO_DATE_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
pub static YEAR_EXACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
pub static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
pub static STANDALONE_FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());
pub static UNITS_PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(([^)]*\b(?:unit|count|number)[^)]*)\)").unwrap()
});

static FLOAT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap());
static INT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+").unwrap());
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.\-]").unwrap());

/// Parses the longest numeric prefix of `s`, ignoring leading whitespace.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    FLOAT_PREFIX
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn parse_int_prefix(s: &str) -> Option<i64> {
    INT_PREFIX
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Drops every character that is not a digit, `.` or `-` before parsing.
pub fn parse_loose_number(s: &str) -> Option<f64> {
    parse_float_prefix(&NON_NUMERIC.replace_all(s, ""))
}

pub fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

pub fn is_separator_line(line: &str) -> bool {
    line.contains("---") || line.contains("===")
}
