//! Property naming, null policy and output ordering
//!
//! Both the generated object functions and the reflective writer take their properties from
//! [`ordered_properties`], so the two paths agree on keys, order and nillability by
//! construction.

use std::collections::BTreeMap;

use crate::config::GlobalSerializationConfig;
use crate::inspector::InspectionResult;
use crate::ir::ValueExpr;
use crate::type_descriptor::TypeDescriptor;
use crate::type_index::{
    AnnotationKind, AnnotationSet, AnnotationSource, NILLABLE_ATTRIBUTE, VALUE_ATTRIBUTE,
};

/// How a property value is read from its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Zero-argument getter method
    Getter(String),
    /// Public field
    Field(String),
}

impl Accessor {
    /// Expression reading this property from `target`
    #[must_use]
    pub fn read(&self, target: ValueExpr) -> ValueExpr {
        match self {
            Self::Getter(method) => target.getter(method),
            Self::Field(name) => target.field(name),
        }
    }
}

/// One serializable property with its resolved naming and null policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Name derived from the getter or field
    pub default_name:    String,
    /// Key written to the output
    pub final_name:      String,
    /// Whether a null (or empty optional) value is written as `null` instead of skipped
    pub nillable:        bool,
    /// Declared type of the getter return value or the field
    pub type_descriptor: TypeDescriptor,
    /// How the value is read from the owner
    pub accessor:        Accessor,
    /// Member annotations followed by the effective class-level annotations
    pub annotations:     AnnotationSet,
}

impl Property {
    fn new(
        default_name: String,
        type_descriptor: TypeDescriptor,
        accessor: Accessor,
        annotations: AnnotationSet,
        config: &GlobalSerializationConfig,
    ) -> Self {
        let final_name = renamed(&annotations).unwrap_or_else(|| default_name.clone());
        let nillable = resolve_nillable(&annotations, config);
        Self {
            default_name,
            final_name,
            nillable,
            type_descriptor,
            accessor,
            annotations,
        }
    }
}

/// A non-empty rename from the property annotation
fn renamed(annotations: &AnnotationSet) -> Option<String> {
    annotations
        .all(&AnnotationKind::Property)
        .filter(|(source, _)| source.is_member())
        .find_map(|(_, annotation)| annotation.string_value(VALUE_ATTRIBUTE))
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// Null policy, highest priority first:
/// 1. `nillable` on the property annotation of the getter
/// 2. `nillable` on the property annotation of the backing field
/// 3. class (or inherited, or package) nillable annotation, `true` when it has no value
/// 4. the global `serialize-null-values`
#[must_use]
pub fn resolve_nillable(annotations: &AnnotationSet, config: &GlobalSerializationConfig) -> bool {
    let member = annotations
        .all(&AnnotationKind::Property)
        .filter(|(source, _)| source.is_member())
        .find_map(|(_, annotation)| annotation.bool_value(NILLABLE_ATTRIBUTE));
    if let Some(explicit) = member {
        return explicit;
    }

    annotations
        .all(&AnnotationKind::Nillable)
        .find(|(source, _)| !source.is_member())
        .map_or(config.serialize_null_values, |(_, annotation)| {
            annotation.bool_value(VALUE_ATTRIBUTE).unwrap_or(true)
        })
}

/// Properties of an inspected class in output order
///
/// Getter properties are registered before field properties, keyed by final name; on a key
/// collision the later registration replaces the earlier one. The result is sorted by final
/// name (descending under the reverse strategy). A class-level property order list, which
/// names default names, moves the properties it names to the front in list order; unknown or
/// repeated names are ignored.
#[must_use]
pub fn ordered_properties(
    inspection: &InspectionResult,
    config: &GlobalSerializationConfig,
) -> Vec<Property> {
    let class_annotations = &inspection.class_annotations;

    let getters = inspection.getters.iter().map(|getter| {
        let mut annotations = AnnotationSet::default();
        annotations.push_all(AnnotationSource::Method, &getter.getter.annotations);
        if let Some(field) = &getter.field {
            annotations.push_all(AnnotationSource::Field, &field.annotations);
        }
        annotations.extend(class_annotations);
        Property::new(
            getter.name.clone(),
            getter.getter.return_type.clone(),
            Accessor::Getter(getter.getter.name.clone()),
            annotations,
            config,
        )
    });

    let fields = inspection.fields.iter().map(|field| {
        let mut annotations = AnnotationSet::default();
        annotations.push_all(AnnotationSource::Field, &field.field.annotations);
        annotations.extend(class_annotations);
        Property::new(
            field.name.clone(),
            field.field.field_type.clone(),
            Accessor::Field(field.field.name.clone()),
            annotations,
            config,
        )
    });

    let mut by_final_name: BTreeMap<String, Property> = BTreeMap::new();
    for property in getters.chain(fields) {
        if let Some(replaced) = by_final_name.insert(property.final_name.clone(), property) {
            tracing::debug!(
                class = %inspection.class_name,
                key = %replaced.final_name,
                replaced = %replaced.default_name,
                "Property key collision, last registration wins"
            );
        }
    }

    let mut sorted: Vec<Property> = by_final_name.into_values().collect();
    if config.property_order_strategy.is_reverse() {
        sorted.reverse();
    }

    let explicit_order = class_annotations
        .get(&AnnotationKind::PropertyOrder)
        .and_then(|annotation| annotation.string_array(VALUE_ATTRIBUTE))
        .unwrap_or_default();
    if explicit_order.is_empty() {
        return sorted;
    }

    let mut ordered = Vec::with_capacity(sorted.len());
    for name in &explicit_order {
        if let Some(position) = sorted.iter().position(|p| &p.default_name == name) {
            ordered.push(sorted.remove(position));
        }
    }
    ordered.extend(sorted);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_index::AnnotationInstance;

    fn nillable_set(entries: &[(AnnotationSource, AnnotationInstance)]) -> AnnotationSet {
        let mut set = AnnotationSet::default();
        for (source, instance) in entries {
            set.push_all(*source, std::slice::from_ref(instance));
        }
        set
    }

    #[test]
    fn test_nillable_precedence() {
        let config = GlobalSerializationConfig::default();
        let property_not_nillable =
            AnnotationInstance::new(AnnotationKind::Property).with(NILLABLE_ATTRIBUTE, false);
        let property_nillable =
            AnnotationInstance::new(AnnotationKind::Property).with(NILLABLE_ATTRIBUTE, true);
        let class_nillable = AnnotationInstance::new(AnnotationKind::Nillable);
        let class_not_nillable =
            AnnotationInstance::new(AnnotationKind::Nillable).with(VALUE_ATTRIBUTE, false);

        // method beats class beats global
        let set = nillable_set(&[
            (AnnotationSource::Method, property_not_nillable.clone()),
            (AnnotationSource::Class, class_nillable.clone()),
        ]);
        assert!(!resolve_nillable(&set, &config));

        // method beats field
        let set = nillable_set(&[
            (AnnotationSource::Method, property_nillable),
            (AnnotationSource::Field, property_not_nillable.clone()),
        ]);
        assert!(resolve_nillable(&set, &config));

        // field beats class
        let set = nillable_set(&[
            (AnnotationSource::Field, property_not_nillable),
            (AnnotationSource::Class, class_nillable.clone()),
        ]);
        assert!(!resolve_nillable(&set, &config));

        // class annotation without value means nillable
        let set = nillable_set(&[(AnnotationSource::Package, class_nillable)]);
        assert!(resolve_nillable(&set, &config));

        let set = nillable_set(&[(AnnotationSource::Class, class_not_nillable)]);
        let null_friendly = GlobalSerializationConfig {
            serialize_null_values: true,
            ..GlobalSerializationConfig::default()
        };
        assert!(!resolve_nillable(&set, &null_friendly));
        assert!(resolve_nillable(&AnnotationSet::default(), &null_friendly));
    }

    #[test]
    fn test_rename_without_value_keeps_default() {
        let rename = AnnotationInstance::new(AnnotationKind::Property).with(VALUE_ATTRIBUTE, "");
        let set = nillable_set(&[(AnnotationSource::Method, rename)]);
        assert_eq!(renamed(&set), None);

        let rename = AnnotationInstance::new(AnnotationKind::Property).with(VALUE_ATTRIBUTE, "bar");
        let set = nillable_set(&[(AnnotationSource::Field, rename)]);
        assert_eq!(renamed(&set).as_deref(), Some("bar"));
    }
}
