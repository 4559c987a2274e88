// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template parameters: definitions, typed values, and extraction.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

/// Declared type a captured parameter is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Date,
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl ParamValue {
    /// JSON form used inside query arguments.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParamValue::Boolean(b) => Value::Bool(*b),
            ParamValue::Date(d) => Value::String(d.to_rfc3339()),
        }
    }
}

/// One parameter a template accepts.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub param_type: ParamType,
    /// Re-run against the question; the first non-empty capture group is the value.
    pub extract: Option<Regex>,
    pub default: Option<ParamValue>,
    pub required: bool,
}

impl ParameterDefinition {
    /// Extract and coerce this parameter from `question`.
    ///
    /// Falls back to the default when the pattern is absent, does not match,
    /// captures nothing, or the capture does not coerce.
    pub fn extract_from(&self, question: &str) -> Option<ParamValue> {
        let captured = self.extract.as_ref().and_then(|pattern| {
            pattern.captures(question).and_then(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().trim())
                    .find(|s| !s.is_empty())
                    .map(str::to_string)
            })
        });

        match captured {
            Some(raw) => match coerce(&raw, self.param_type) {
                Some(value) => Some(value),
                None => {
                    debug!(
                        param = self.name,
                        raw = %raw,
                        "parameter did not coerce, using default"
                    );
                    self.default.clone()
                }
            },
            None => self.default.clone(),
        }
    }
}

/// Coerce a captured string to the declared type.
pub fn coerce(raw: &str, param_type: ParamType) -> Option<ParamValue> {
    match param_type {
        ParamType::String => Some(ParamValue::String(raw.to_string())),
        ParamType::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ParamValue::Number),
        ParamType::Boolean => Some(ParamValue::Boolean(
            raw.eq_ignore_ascii_case("true") || raw == "1",
        )),
        ParamType::Date => parse_date(raw).map(ParamValue::Date),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Extracted parameters, keyed by definition name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// String value, if present and a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, if present and a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(ParamValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// JSON form of a value, or `null` when absent.
    pub fn json(&self, name: &str) -> Value {
        self.0.get(name).map(ParamValue::to_json).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn def(
        param_type: ParamType,
        pattern: &str,
        default: Option<ParamValue>,
    ) -> ParameterDefinition {
        ParameterDefinition {
            name: "p",
            param_type,
            extract: Some(Regex::new(pattern).unwrap()),
            default,
            required: false,
        }
    }

    #[test]
    fn number_capture_is_numeric() {
        let d = def(ParamType::Number, r"(?i)below\s+(\d+)", None);
        assert_eq!(d.extract_from("adoption below 42%"), Some(ParamValue::Number(42.0)));
        assert_eq!(ParamValue::Number(42.0).to_json(), serde_json::json!(42.0));
    }

    #[test]
    fn first_non_empty_group_wins() {
        let d = def(ParamType::String, r"(?i)for\s+(\w+)|of\s+(\w+)", None);
        assert_eq!(
            d.extract_from("tasks of Duo"),
            Some(ParamValue::String("Duo".into()))
        );
    }

    #[test]
    fn default_used_when_pattern_misses() {
        let d = def(ParamType::Number, r"below\s+(\d+)", Some(ParamValue::Number(50.0)));
        assert_eq!(d.extract_from("struggling customers"), Some(ParamValue::Number(50.0)));
    }

    #[test]
    fn default_used_when_coercion_fails() {
        let d = def(ParamType::Number, r"below\s+(\S+)", Some(ParamValue::Number(50.0)));
        assert_eq!(d.extract_from("below lots"), Some(ParamValue::Number(50.0)));
    }

    #[test]
    fn no_pattern_no_default_is_absent() {
        let d = ParameterDefinition {
            name: "p",
            param_type: ParamType::String,
            extract: None,
            default: None,
            required: true,
        };
        assert_eq!(d.extract_from("anything"), None);
    }

    #[test]
    fn boolean_coercion() {
        assert_eq!(coerce("TRUE", ParamType::Boolean), Some(ParamValue::Boolean(true)));
        assert_eq!(coerce("1", ParamType::Boolean), Some(ParamValue::Boolean(true)));
        assert_eq!(coerce("yes", ParamType::Boolean), Some(ParamValue::Boolean(false)));
    }

    #[test]
    fn date_coercion_accepts_common_formats() {
        let Some(ParamValue::Date(d)) = coerce("2026-03-14", ParamType::Date) else {
            panic!("expected date");
        };
        assert_eq!((d.year(), d.month(), d.day()), (2026, 3, 14));
        assert!(coerce("March 14, 2026", ParamType::Date).is_some());
        assert!(coerce("2026-03-14T10:00:00Z", ParamType::Date).is_some());
        assert!(coerce("someday", ParamType::Date).is_none());
    }
}
