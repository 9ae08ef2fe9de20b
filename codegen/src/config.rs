//! Build-time serialization configuration
//!
//! [`JsonbConfig`] is the raw document as written by the user. It is validated exactly once
//! per build into a [`GlobalSerializationConfig`]; any invalid option is a fatal
//! [`Error::Configuration`] rather than a per-type degradation.

use std::path::Path;
use std::sync::LazyLock;

use chrono::format::{Item, StrftimeItems};
use error_stack::{Report, ResultExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::type_descriptor::constants::DEFAULT_UNIT_PREFIX;

/// Locale used when none is configured
pub const DEFAULT_LOCALE: &str = "en-US";

static LOCALE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2,3}([-_][a-zA-Z0-9]{2,8})*$").ok());

/// Output key order applied to the properties of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PropertyOrderStrategy {
    /// Ascending by final key name
    #[default]
    Lexicographical,
    /// Descending by final key name
    Reverse,
    /// No particular order requested; treated as lexicographical
    Any,
}

impl PropertyOrderStrategy {
    /// Whether keys are written in descending order
    #[must_use]
    pub const fn is_reverse(self) -> bool { matches!(self, Self::Reverse) }
}

/// Which property types may be handed to the generic leaf writer instead of failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum DeferralPolicy {
    /// Plain class references and arrays without type variables
    #[default]
    ClassesAndArrays,
    /// Plain class references only
    ClassesOnly,
    /// Nothing is deferred; every property must have a generator
    None,
}

impl DeferralPolicy {
    /// Whether unsupported class references are deferred
    #[must_use]
    pub const fn defers_classes(self) -> bool { !matches!(self, Self::None) }

    /// Whether unsupported arrays are deferred
    #[must_use]
    pub const fn defers_arrays(self) -> bool { matches!(self, Self::ClassesAndArrays) }
}

/// How date and time values are rendered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// ISO-8601 / RFC 3339 text, written as held by the host value
    #[default]
    Iso,
    /// A chrono strftime pattern
    Pattern(String),
}

impl DateFormat {
    /// Validate a strftime pattern; the literal `ISO` selects [`DateFormat::Iso`]
    ///
    /// # Errors
    ///
    /// Returns an error when `pattern` is not a valid strftime pattern.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() || pattern.eq_ignore_ascii_case("iso") {
            return Ok(Self::Iso);
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Report::new(Error::invalid_config(
                "date-format",
                format!("`{pattern}` is not a valid strftime pattern"),
            )));
        }
        Ok(Self::Pattern(pattern.to_string()))
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iso => write!(f, "ISO"),
            Self::Pattern(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// Raw configuration document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct JsonbConfig {
    /// `enabled`
    pub enabled:                 Option<bool>,
    /// `locale`
    pub locale:                  Option<String>,
    /// `date-format`, a strftime pattern or `ISO`
    pub date_format:             Option<String>,
    /// `serialize-null-values`
    pub serialize_null_values:   Option<bool>,
    /// `property-order-strategy`
    pub property_order_strategy: Option<String>,
    /// `deferral-policy`
    pub deferral_policy:         Option<String>,
    /// `unit-prefix`
    pub unit_prefix:             Option<String>,
}

impl JsonbConfig {
    /// Read a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the file cannot be read
    /// - the file is not a JSON object of known configuration keys
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Report::new(Error::io_failed("read configuration", path, e)))?;
        serde_json::from_str(&contents)
            .change_context(Error::Configuration(format!(
                "Malformed configuration file {}",
                path.display()
            )))
    }

    /// Check every option and produce the effective configuration
    ///
    /// # Errors
    ///
    /// Returns an error for the first option holding an invalid value.
    pub fn validate(self) -> Result<GlobalSerializationConfig> {
        let locale = self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        if !LOCALE_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&locale))
        {
            return Err(Report::new(Error::invalid_config(
                "locale",
                format!("`{locale}` is not a language tag"),
            )));
        }

        let property_order_strategy = match self.property_order_strategy {
            Some(strategy) => strategy.trim().parse().map_err(|_| {
                Report::new(Error::invalid_config(
                    "property-order-strategy",
                    format!("`{strategy}`, expected one of lexicographical, reverse, any"),
                ))
            })?,
            None => PropertyOrderStrategy::default(),
        };

        let deferral_policy = match self.deferral_policy {
            Some(policy) => policy.trim().parse().map_err(|_| {
                Report::new(Error::invalid_config(
                    "deferral-policy",
                    format!("`{policy}`, expected one of classes-and-arrays, classes-only, none"),
                ))
            })?,
            None => DeferralPolicy::default(),
        };

        let date_format = match self.date_format {
            Some(pattern) => DateFormat::parse(&pattern)?,
            None => DateFormat::default(),
        };

        let unit_prefix = self
            .unit_prefix
            .unwrap_or_else(|| DEFAULT_UNIT_PREFIX.to_string());
        if !unit_prefix.is_empty() && !unit_prefix.ends_with('.') {
            tracing::warn!(%unit_prefix, "Unit prefix does not end with '.', identifiers will run together");
        }

        Ok(GlobalSerializationConfig {
            enabled: self.enabled.unwrap_or(true),
            locale,
            date_format,
            serialize_null_values: self.serialize_null_values.unwrap_or(false),
            property_order_strategy,
            deferral_policy,
            unit_prefix,
        })
    }
}

/// Validated configuration shared by every stage of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSerializationConfig {
    /// Generate anything at all
    pub enabled:                 bool,
    /// Validated language tag; recorded, not applied to date text
    pub locale:                  String,
    /// Format for dates without a property-level override
    pub date_format:             DateFormat,
    /// Write `null` for null properties not marked nillable
    pub serialize_null_values:   bool,
    /// Key order within each object
    pub property_order_strategy: PropertyOrderStrategy,
    /// Property types left to the reflective writer
    pub deferral_policy:         DeferralPolicy,
    /// Package prefix of every unit id
    pub unit_prefix:             String,
}

impl Default for GlobalSerializationConfig {
    fn default() -> Self {
        Self {
            enabled:                 true,
            locale:                  DEFAULT_LOCALE.to_string(),
            date_format:             DateFormat::default(),
            serialize_null_values:   false,
            property_order_strategy: PropertyOrderStrategy::default(),
            deferral_policy:         DeferralPolicy::default(),
            unit_prefix:             DEFAULT_UNIT_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(value: serde_json::Value) -> Result<GlobalSerializationConfig> {
        serde_json::from_value::<JsonbConfig>(value)
            .expect("raw config should deserialize")
            .validate()
    }

    #[test]
    fn test_defaults() {
        let config = config(json!({})).expect("empty config is valid");
        assert_eq!(config, GlobalSerializationConfig::default());
    }

    #[test]
    fn test_order_strategy_is_case_insensitive() {
        let config = config(json!({ "property-order-strategy": "REVERSE" }))
            .expect("reverse is valid");
        assert!(config.property_order_strategy.is_reverse());
    }

    #[test]
    fn test_invalid_order_strategy_is_fatal() {
        let error = config(json!({ "property-order-strategy": "random" }))
            .expect_err("unknown strategy must be rejected");
        assert!(matches!(error.current_context(), Error::Configuration(_)));
        assert!(error.to_string().contains("property-order-strategy"));
    }

    #[test]
    fn test_date_format_and_locale_validation() {
        assert!(config(json!({ "date-format": "%Y-%m-%d" })).is_ok());
        assert!(config(json!({ "date-format": "%Q" })).is_err());
        assert!(config(json!({ "locale": "de_DE" })).is_ok());
        assert!(config(json!({ "locale": "not a locale" })).is_err());
    }

    #[test]
    fn test_deferral_policy() {
        let config = config(json!({ "deferral-policy": "classes-only" })).expect("valid policy");
        assert!(config.deferral_policy.defers_classes());
        assert!(!config.deferral_policy.defers_arrays());
    }
}
