//! Annotation model and priority-ordered annotation lookup
//!
//! Annotations are plain key/value records. An [`AnnotationSet`] keeps every instance
//! together with the [`AnnotationSource`] it came from, in priority order, so callers can
//! ask either for the winning instance of a kind or walk all candidates of that kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Attribute holding an annotation's primary value
pub const VALUE_ATTRIBUTE: &str = "value";

/// Attribute on the property annotation overriding the null policy
pub const NILLABLE_ATTRIBUTE: &str = "nillable";

/// Annotation kinds the generator understands
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum AnnotationKind {
    /// Renames a property and optionally overrides its null policy
    #[strum(
        serialize = "JsonbProperty",
        serialize = "javax.json.bind.annotation.JsonbProperty",
        serialize = "jakarta.json.bind.annotation.JsonbProperty"
    )]
    Property,
    /// Class or package level null policy default
    #[strum(
        serialize = "JsonbNillable",
        serialize = "javax.json.bind.annotation.JsonbNillable",
        serialize = "jakarta.json.bind.annotation.JsonbNillable"
    )]
    Nillable,
    /// Explicit property order for a class
    #[strum(
        serialize = "JsonbPropertyOrder",
        serialize = "javax.json.bind.annotation.JsonbPropertyOrder",
        serialize = "jakarta.json.bind.annotation.JsonbPropertyOrder"
    )]
    PropertyOrder,
    /// Excludes a property from serialization
    #[strum(
        serialize = "JsonbTransient",
        serialize = "javax.json.bind.annotation.JsonbTransient",
        serialize = "jakarta.json.bind.annotation.JsonbTransient"
    )]
    Transient,
    /// Date format override for a property or class
    #[strum(
        serialize = "JsonbDateFormat",
        serialize = "javax.json.bind.annotation.JsonbDateFormat",
        serialize = "jakarta.json.bind.annotation.JsonbDateFormat"
    )]
    DateFormat,
    /// Any annotation the generator does not interpret
    #[strum(default)]
    Other(String),
}

impl AnnotationKind {
    /// Canonical short name of this annotation kind
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Property => "JsonbProperty",
            Self::Nillable => "JsonbNillable",
            Self::PropertyOrder => "JsonbPropertyOrder",
            Self::Transient => "JsonbTransient",
            Self::DateFormat => "JsonbDateFormat",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for AnnotationKind {
    fn from(name: String) -> Self { name.parse().unwrap_or(Self::Other(name)) }
}

impl From<AnnotationKind> for String {
    fn from(kind: AnnotationKind) -> Self { kind.name().to_string() }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "@{}", self.name()) }
}

impl Serialize for AnnotationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for AnnotationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A single annotation with its attribute values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInstance {
    /// Which annotation this is
    #[serde(rename = "name")]
    pub kind:   AnnotationKind,
    /// Attribute values by attribute name
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub values: Map<String, Value>,
}

impl AnnotationInstance {
    /// Create an annotation without attributes
    #[must_use]
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            values: Map::new(),
        }
    }

    /// Add an attribute value
    #[must_use]
    pub fn with(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.values.insert(attribute.to_string(), value.into());
        self
    }

    /// The `value` attribute, if set
    #[must_use]
    pub fn value(&self) -> Option<&Value> { self.values.get(VALUE_ATTRIBUTE) }

    /// A string attribute
    #[must_use]
    pub fn string_value(&self, attribute: &str) -> Option<&str> {
        self.values.get(attribute).and_then(Value::as_str)
    }

    /// A boolean attribute
    #[must_use]
    pub fn bool_value(&self, attribute: &str) -> Option<bool> {
        self.values.get(attribute).and_then(Value::as_bool)
    }

    /// A string-array attribute; a single string is accepted as a one-element array
    #[must_use]
    pub fn string_array(&self, attribute: &str) -> Option<Vec<String>> {
        match self.values.get(attribute)? {
            Value::String(single) => Some(vec![single.clone()]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Where an annotation instance was found, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnnotationSource {
    /// The getter itself
    Method,
    /// The field backing the property
    Field,
    /// The class declaring the property
    Class,
    /// A superclass or implemented interface
    Inherited,
    /// The package of the class
    Package,
}

impl AnnotationSource {
    /// Sources attached to the member itself rather than to its class
    #[must_use]
    pub const fn is_member(self) -> bool { matches!(self, Self::Method | Self::Field) }
}

/// Annotations gathered from an ordered list of sources
///
/// Entries are kept in insertion (priority) order; [`AnnotationSet::get`] returns the first
/// instance of a kind, so later sources never override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    entries: Vec<(AnnotationSource, AnnotationInstance)>,
}

impl AnnotationSet {
    /// Merge sources in the order given
    #[must_use]
    pub fn merged<'a>(
        sources: impl IntoIterator<Item = (AnnotationSource, &'a [AnnotationInstance])>,
    ) -> Self {
        let mut set = Self::default();
        for (source, instances) in sources {
            set.push_all(source, instances);
        }
        set
    }

    /// Append instances from a lower priority source
    pub fn push_all(&mut self, source: AnnotationSource, instances: &[AnnotationInstance]) {
        self.entries
            .extend(instances.iter().map(|instance| (source, instance.clone())));
    }

    /// Append every entry of a lower priority set
    pub fn extend(&mut self, other: &Self) { self.entries.extend(other.entries.iter().cloned()); }

    /// The winning instance of a kind
    #[must_use]
    pub fn get(&self, kind: &AnnotationKind) -> Option<&AnnotationInstance> {
        self.entries
            .iter()
            .find(|(_, instance)| &instance.kind == kind)
            .map(|(_, instance)| instance)
    }

    /// The source of the winning instance of a kind
    #[must_use]
    pub fn source_of(&self, kind: &AnnotationKind) -> Option<AnnotationSource> {
        self.entries
            .iter()
            .find(|(_, instance)| &instance.kind == kind)
            .map(|(source, _)| *source)
    }

    /// Every instance of a kind in priority order
    pub fn all<'a>(
        &'a self,
        kind: &'a AnnotationKind,
    ) -> impl Iterator<Item = (AnnotationSource, &'a AnnotationInstance)> + 'a {
        self.entries
            .iter()
            .filter(move |(_, instance)| &instance.kind == kind)
            .map(|(source, instance)| (*source, instance))
    }

    /// Whether any instance of a kind is present
    #[must_use]
    pub fn contains(&self, kind: &AnnotationKind) -> bool { self.get(kind).is_some() }

    /// Whether the set holds no annotations
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind_parsing_accepts_qualified_names() {
        assert_eq!(
            AnnotationKind::from("javax.json.bind.annotation.JsonbProperty".to_string()),
            AnnotationKind::Property
        );
        assert_eq!(
            AnnotationKind::from("JsonbNillable".to_string()),
            AnnotationKind::Nillable
        );
        assert_eq!(
            AnnotationKind::from("com.acme.Audit".to_string()),
            AnnotationKind::Other("com.acme.Audit".to_string())
        );
    }

    #[test]
    fn test_first_source_wins() {
        let method = vec![AnnotationInstance::new(AnnotationKind::Property).with("value", "m")];
        let field = vec![
            AnnotationInstance::new(AnnotationKind::Property)
                .with("value", "f")
                .with(NILLABLE_ATTRIBUTE, true),
            AnnotationInstance::new(AnnotationKind::DateFormat).with("value", "%Y"),
        ];
        let set = AnnotationSet::merged([
            (AnnotationSource::Method, method.as_slice()),
            (AnnotationSource::Field, field.as_slice()),
        ]);

        assert_eq!(
            set.get(&AnnotationKind::Property)
                .and_then(|a| a.string_value(VALUE_ATTRIBUTE)),
            Some("m")
        );
        assert_eq!(
            set.source_of(&AnnotationKind::DateFormat),
            Some(AnnotationSource::Field)
        );
        let nillable_sources: Vec<_> = set
            .all(&AnnotationKind::Property)
            .filter_map(|(source, a)| a.bool_value(NILLABLE_ATTRIBUTE).map(|_| source))
            .collect();
        assert_eq!(nillable_sources, vec![AnnotationSource::Field]);
    }

    #[test]
    fn test_deserialize_instance() {
        let instance: Result<AnnotationInstance, _> = serde_json::from_value(json!({
            "name": "JsonbPropertyOrder",
            "values": { "value": ["b", "a"] }
        }));
        let instance = instance.ok();
        assert_eq!(
            instance.as_ref().map(|i| i.kind.clone()),
            Some(AnnotationKind::PropertyOrder)
        );
        assert_eq!(
            instance.and_then(|i| i.string_array(VALUE_ATTRIBUTE)),
            Some(vec!["b".to_string(), "a".to_string()])
        );
    }
}
