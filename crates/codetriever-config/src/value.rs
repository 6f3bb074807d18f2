//! Tagged configuration values and environment-string coercion.
//!
//! Every [`crate::Constant`] carries a declared type tag; an environment
//! variable read for that constant is coerced according to the tag of its
//! default value, never by guessing from the string's shape. Coercion
//! failures fall back to the default rather than panicking or propagating
//! an error — a malformed `MAX_SOURCES_IN_DEEP_SEARCH=banana` should not be
//! able to take the process down.

use std::collections::HashMap;
use std::time::Duration;

/// A configuration value tagged with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
    List(Vec<String>),
    Dict(HashMap<String, String>),
}

impl ConfigValue {
    /// Coerce a raw environment string according to the tag of `default`.
    ///
    /// Returns `default.clone()` when `raw` cannot be parsed as that tag's
    /// type — unknown or malformed values fall back to default, they never
    /// poison the process.
    #[must_use]
    pub fn coerce(raw: &str, default: &Self) -> Self {
        match default {
            Self::Str(_) => Self::Str(raw.to_string()),
            Self::Int(_) => raw
                .trim()
                .parse::<i64>()
                .map_or_else(|_| default.clone(), Self::Int),
            Self::Float(_) => raw
                .trim()
                .parse::<f64>()
                .map_or_else(|_| default.clone(), Self::Float),
            Self::Bool(_) => Self::Bool(matches!(
                raw.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )),
            Self::Duration(_) => raw.trim().parse::<f64>().map_or_else(
                |_| default.clone(),
                |secs| Self::Duration(Duration::from_secs_f64(secs.max(0.0))),
            ),
            Self::List(_) => Self::List(Self::parse_list(raw)),
            Self::Dict(_) => serde_json::from_str::<HashMap<String, String>>(raw)
                .map_or_else(|_| default.clone(), Self::Dict),
        }
    }

    /// Parse a comma-separated list, with a JSON-array escape hatch.
    ///
    /// `[a, b, c]`-shaped input is treated as a single literal item when it
    /// does not parse as a JSON array of strings, matching the source
    /// system's "bracketed but not valid JSON falls back to one item"
    /// behavior rather than silently splitting on the inner commas.
    fn parse_list(raw: &str) -> Vec<String> {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            return serde_json::from_str::<Vec<String>>(trimmed)
                .unwrap_or_else(|_| vec![trimmed.to_string()]);
        }
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dict(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Dict(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_coercion_falls_back_to_default_on_garbage() {
        let default = ConfigValue::Int(10);
        assert_eq!(ConfigValue::coerce("42", &default), ConfigValue::Int(42));
        assert_eq!(ConfigValue::coerce("banana", &default), default);
    }

    #[test]
    fn bool_coercion_matches_truthy_tokens() {
        let default = ConfigValue::Bool(false);
        for truthy in ["true", "1", "yes", "on", "TRUE", "On"] {
            assert_eq!(ConfigValue::coerce(truthy, &default), ConfigValue::Bool(true));
        }
        assert_eq!(ConfigValue::coerce("nope", &default), ConfigValue::Bool(false));
    }

    #[test]
    fn duration_coercion_reads_seconds() {
        let default = ConfigValue::Duration(Duration::from_secs(1));
        assert_eq!(
            ConfigValue::coerce("30", &default),
            ConfigValue::Duration(Duration::from_secs(30))
        );
    }

    #[test]
    fn list_coercion_splits_on_comma() {
        let default = ConfigValue::List(vec![]);
        assert_eq!(
            ConfigValue::coerce("a, b ,c", &default),
            ConfigValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn list_coercion_treats_invalid_json_bracket_as_single_item() {
        let default = ConfigValue::List(vec![]);
        assert_eq!(
            ConfigValue::coerce("[not json", &default),
            ConfigValue::List(vec!["[not json".into()])
        );
    }

    #[test]
    fn list_coercion_parses_json_array() {
        let default = ConfigValue::List(vec![]);
        assert_eq!(
            ConfigValue::coerce(r#"["a","b"]"#, &default),
            ConfigValue::List(vec!["a".into(), "b".into()])
        );
    }
}
