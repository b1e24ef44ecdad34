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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

const SAMPLE_SIZE: usize = 10;
const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateFormat {
    #[serde(rename = "lat-lng")]
    LatLng,
    #[serde(rename = "lng-lat")]
    LngLat,
}
impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateFormat::LatLng => f.write_str("lat-lng"),
            CoordinateFormat::LngLat => f.write_str("lng-lat"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

fn vote(pair: &[f64]) -> Option<CoordinateFormat> {
    let (first, second) = match pair {
        [first, second, ..] => (first.abs(), second.abs()),
        _ => return None,
    };
    if !first.is_finite()
        || !second.is_finite()
        || first > MAX_LATITUDE
        || second > MAX_LONGITUDE
    {
        return None;
    }
    if second > first || second > MAX_LATITUDE {
        Some(CoordinateFormat::LatLng)
    } else {
        Some(CoordinateFormat::LngLat)
    }
}

/// Majority vote over the first ten pairs; ties and no votes mean lng-lat.
pub fn detect_format(coords: &[Vec<f64>]) -> CoordinateFormat {
    let (lat_lng, lng_lat) = coords
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(|pair| vote(pair))
        .fold((0usize, 0usize), |(a, b), v| match v {
            CoordinateFormat::LatLng => (a + 1, b),
            CoordinateFormat::LngLat => (a, b + 1),
        });
    let format = if lat_lng > lng_lat {
        CoordinateFormat::LatLng
    } else {
        CoordinateFormat::LngLat
    };
    debug!(%format, lat_lng, lng_lat, "CoordinateNormalizer: detected format");
    format
}

/// Returns pairs in lng-lat order.
pub fn normalize(coords: &[Vec<f64>]) -> Vec<Vec<f64>> {
    if detect_format(coords) == CoordinateFormat::LngLat {
        return coords.to_vec();
    }
    coords
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            if pair.len() < 2 {
                warn!(index = i, "CoordinateNormalizer: invalid coordinate passed through");
                return pair.clone();
            }
            let mut swapped = pair.clone();
            swapped.swap(0, 1);
            swapped
        })
        .collect()
}

/// Reads a JSON trajectory; non-array entries become empty pairs and
/// non-numeric values become NaN so validation can report them.
pub fn parse_coordinates(value: &Value) -> Option<Vec<Vec<f64>>> {
    let entries = value.as_array()?;
    Some(
        entries
            .iter()
            .map(|entry| {
                entry.as_array().map_or_else(Vec::new, |items| {
                    items
                        .iter()
                        .map(|v| v.as_f64().unwrap_or(f64::NAN))
                        .collect()
                })
            })
            .collect(),
    )
}

fn pair_error(index: usize, pair: &[f64]) -> Option<String> {
    if pair.len() < 2 {
        Some(format!("Coordinate {index} has fewer than 2 values"))
    } else if pair[..2].iter().any(|v| v.is_nan()) {
        Some(format!("Coordinate {index} contains non-numeric values"))
    } else {
        None
    }
}

fn range_warnings(coords: &[Vec<f64>]) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, pair) in normalize(coords).iter().enumerate() {
        if let [lng, lat, ..] = pair.as_slice() {
            if lng.abs() > MAX_LONGITUDE {
                warnings.push(format!("Coordinate {i} longitude {lng} is out of range"));
            }
            if lat.abs() > MAX_LATITUDE {
                warnings.push(format!("Coordinate {i} latitude {lat} is out of range"));
            }
        }
    }
    warnings
}

pub fn validate_pairs(coords: &[Vec<f64>]) -> CoordinateValidation {
    if coords.is_empty() {
        return CoordinateValidation {
            is_valid: false,
            errors: vec!["Coordinates array is empty".to_string()],
            warnings: Vec::new(),
        };
    }
    let errors: Vec<String> = coords
        .iter()
        .enumerate()
        .filter_map(|(i, pair)| pair_error(i, pair))
        .collect();
    CoordinateValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings: range_warnings(coords),
    }
}

pub fn validate(value: &Value) -> CoordinateValidation {
    let (Some(entries), Some(pairs)) = (value.as_array(), parse_coordinates(value)) else {
        return CoordinateValidation {
            is_valid: false,
            errors: vec!["Coordinates must be an array".to_string()],
            warnings: Vec::new(),
        };
    };
    if entries.is_empty() {
        return validate_pairs(&pairs);
    }
    let errors: Vec<String> = entries
        .iter()
        .zip(&pairs)
        .enumerate()
        .filter_map(|(i, (entry, pair))| {
            if entry.is_array() {
                pair_error(i, pair)
            } else {
                Some(format!("Coordinate {i} is not an array"))
            }
        })
        .collect();
    CoordinateValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings: range_warnings(&pairs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_orientation_by_magnitude() {
        assert_eq!(
            detect_format(&[vec![10.0, 100.0], vec![15.0, 110.0]]),
            CoordinateFormat::LatLng
        );
        assert_eq!(
            detect_format(&[vec![100.0, 10.0], vec![110.0, 15.0]]),
            CoordinateFormat::LngLat
        );
        assert_eq!(detect_format(&[]), CoordinateFormat::LngLat);
        assert_eq!(
            detect_format(&[vec![10.0, 20.0], vec![20.0, 10.0]]),
            CoordinateFormat::LngLat
        );
    }

    #[test]
    fn only_first_ten_pairs_vote() {
        let mut coords = vec![vec![50.0, 10.0]; 10];
        coords.extend(vec![vec![10.0, 120.0]; 20]);
        assert_eq!(detect_format(&coords), CoordinateFormat::LngLat);
    }

    #[test]
    fn non_numeric_pairs_cast_no_vote() {
        let coords = parse_coordinates(&json!([["a", "b"], ["c", "d"], [10, 100]])).unwrap();
        assert_eq!(detect_format(&coords), CoordinateFormat::LatLng);
        assert_eq!(normalize(&coords)[2], vec![100.0, 10.0]);
    }

    #[test]
    fn normalize_swaps_lat_lng_and_keeps_short_entries() {
        let coords = vec![vec![10.0, 100.0], vec![5.0], vec![15.0, 110.0, 3.0]];
        assert_eq!(
            normalize(&coords),
            vec![vec![100.0, 10.0], vec![5.0], vec![110.0, 15.0, 3.0]]
        );
        let already = vec![vec![100.0, 10.0]];
        assert_eq!(normalize(&already), already);
    }

    #[test]
    fn validation_reports_errors_and_warnings() {
        assert!(!validate(&json!({"not": "array"})).is_valid);
        assert_eq!(validate(&json!([])).errors, vec!["Coordinates array is empty"]);

        let report = validate(&json!([[1.0, 2.0], "x", [3.0], [1.0, "a"]]));
        assert!(!report.is_valid);
        assert!(report.errors.contains(&"Coordinate 1 is not an array".to_string()));
        assert!(report.errors.contains(&"Coordinate 2 has fewer than 2 values".to_string()));
        assert!(report
            .errors
            .contains(&"Coordinate 3 contains non-numeric values".to_string()));
        assert!(!report.errors.contains(&"Coordinate 1 has fewer than 2 values".to_string()));

        let report = validate(&json!([[200.0, 95.0], [100.0, 10.0]]));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
    }
}
