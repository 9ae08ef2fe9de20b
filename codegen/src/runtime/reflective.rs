//! Reflective serializer
//!
//! Writes any host value by inspecting its type at the time of the call. Generated serializers
//! hand deferred leaves to it. It reads properties through [`ordered_properties`] and applies the
//! same null policy as the object variant, so a value written statically and a value written
//! reflectively produce the same text.
//!
//! An instance is written as its declared class whenever the type index describes that class,
//! so a subclass value contributes only the declared properties. The runtime class recorded in
//! `@type` is consulted only when the declared class is missing from the index or cannot be
//! analysed (abstract classes, ambiguous interfaces, `java.lang.Object`).

use std::sync::Arc;

use serde_json::Value;

use super::host::{self, TYPE_MARKER};
use super::json_generator::JsonGenerator;
use crate::config::GlobalSerializationConfig;
use crate::error::{Error, Result};
use crate::generator::{Accessor, Property, date_format_for, ordered_properties};
use crate::inspector::{Inspector, decapitalize};
use crate::ir::ScalarKind;
use crate::type_descriptor::constants::{
    BOOLEAN_GETTER_PREFIX, DATE_TYPES, GETTER_PREFIX, STRING_TYPES, TYPE_BOOLEAN, TYPE_CHARACTER,
};
use crate::type_descriptor::{ClassName, PrimitiveType, TypeDescriptor, TypeKind};
use crate::type_index::AnnotationSet;

/// Generic runtime writer for values without a generated serializer
pub struct ReflectiveSerializer {
    inspector: Arc<Inspector>,
    config:    Arc<GlobalSerializationConfig>,
}

impl ReflectiveSerializer {
    /// Writer resolving classes through `inspector`
    #[must_use]
    pub const fn new(inspector: Arc<Inspector>, config: Arc<GlobalSerializationConfig>) -> Self {
        Self { inspector, config }
    }

    /// Write `value`, declared as `declared`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a primitive is null
    /// - some part of `value` does not match the shape of its declared type
    /// - the generator rejects a write
    pub fn serialize(
        &self,
        value: &Value,
        declared: &TypeDescriptor,
        generator: &mut dyn JsonGenerator,
    ) -> Result<()> {
        self.write_value(value, declared, None, generator)
    }

    fn write_value(
        &self,
        value: &Value,
        declared: &TypeDescriptor,
        annotations: Option<&AnnotationSet>,
        generator: &mut dyn JsonGenerator,
    ) -> Result<()> {
        if value.is_null() {
            if declared.is_primitive() {
                return Err(error_stack::Report::new(Error::shape_mismatch(
                    &format!("a `{declared}` value"),
                    value,
                )));
            }
            return generator.write_null();
        }

        match declared.kind() {
            TypeKind::Primitive | TypeKind::Boxed => {
                host::write_scalar(generator, value, scalar_kind(declared))
            }
            TypeKind::Optional => match (host::optional_content(value)?, declared.element_type()) {
                (Some(content), Some(element)) => {
                    self.write_value(content, &element, annotations, generator)
                }
                (Some(content), None) => self.write_untyped(content, generator),
                (None, _) => generator.write_null(),
            },
            TypeKind::Array | TypeKind::Collection => {
                let element = declared.element_type();
                generator.write_start_array()?;
                for item in host::elements(value)? {
                    match &element {
                        Some(element) => self.write_value(item, element, annotations, generator)?,
                        None => self.write_untyped(item, generator)?,
                    }
                }
                generator.write_end_array()
            }
            TypeKind::Map => {
                generator.write_start_object()?;
                for (key, entry) in host::entries(value)? {
                    generator.write_key(key)?;
                    match declared.value_type() {
                        Some(value_type) => {
                            self.write_value(entry, value_type, annotations, generator)?;
                        }
                        None => self.write_untyped(entry, generator)?,
                    }
                }
                generator.write_end_object()
            }
            TypeKind::PlainClass => match declared {
                TypeDescriptor::Class(name) => {
                    self.write_class_instance(value, name, annotations, generator)
                }
                _ => self.write_untyped(value, generator),
            },
            TypeKind::Generic | TypeKind::Unresolved => self.write_untyped(value, generator),
        }
    }

    fn write_class_instance(
        &self,
        value: &Value,
        declared: &ClassName,
        annotations: Option<&AnnotationSet>,
        generator: &mut dyn JsonGenerator,
    ) -> Result<()> {
        let name = declared.as_str();
        if STRING_TYPES.contains(&name) {
            return host::write_scalar(generator, value, ScalarKind::Text);
        }
        if DATE_TYPES.contains(&name) {
            let format = date_format_for(annotations, &self.config)?;
            return host::write_date(generator, value, &format);
        }

        if self.write_as_indexed(value, declared, generator)? {
            return Ok(());
        }
        if let Some(runtime) = host::runtime_class(value).map(ClassName::from)
            && runtime != *declared
            && self.write_as_indexed(value, &runtime, generator)?
        {
            tracing::trace!(%declared, %runtime, "Wrote instance as its runtime class");
            return Ok(());
        }
        self.write_untyped(value, generator)
    }

    /// Write `value` as an instance of `class`, `false` when the index cannot describe it
    ///
    /// An interface is read through its concrete implementor after a checked cast, the same
    /// way a generated object function reads it.
    fn write_as_indexed(
        &self,
        value: &Value,
        class: &ClassName,
        generator: &mut dyn JsonGenerator,
    ) -> Result<bool> {
        match self.inspector.index().class(class) {
            Some(info) if info.is_enum() => {
                host::write_scalar(generator, value, ScalarKind::EnumConstant)?;
                Ok(true)
            }
            Some(_) => {
                let inspection = self.inspector.inspect(class)?;
                if !inspection.is_possible() {
                    return Ok(false);
                }
                let instance = match &inspection.concrete_class {
                    Some(concrete) => host::checked_cast(value, concrete)?,
                    None => value,
                };
                let properties = ordered_properties(&inspection, &self.config);
                self.write_properties(instance, &properties, generator)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write_properties(
        &self,
        instance: &Value,
        properties: &[Property],
        generator: &mut dyn JsonGenerator,
    ) -> Result<()> {
        generator.write_start_object()?;
        for property in properties {
            let member = match &property.accessor {
                Accessor::Getter(method) => host::invoke_getter(instance, method)?,
                Accessor::Field(field) => host::read_field(instance, field)?,
            };
            let ty = &property.type_descriptor;

            let absent = member.is_null()
                || (ty.kind() == TypeKind::Optional && host::optional_content(member)?.is_none());
            if absent && !ty.is_primitive() {
                if property.nillable {
                    generator.write_key(&property.final_name)?;
                    generator.write_null()?;
                }
                continue;
            }

            generator.write_key(&property.final_name)?;
            self.write_value(member, ty, Some(&property.annotations), generator)?;
        }
        generator.write_end_object()
    }

    /// Write a value of unknown type by its JSON shape
    ///
    /// Object keys that look like getters are decapitalized, `@type` is dropped and members
    /// follow the configured key order. Null members follow the global null policy.
    fn write_untyped(&self, value: &Value, generator: &mut dyn JsonGenerator) -> Result<()> {
        match value {
            Value::Null => generator.write_null(),
            Value::Bool(flag) => generator.write_bool(*flag),
            Value::Number(number) => generator.write_number(number),
            Value::String(text) => generator.write_string(text),
            Value::Array(items) => {
                generator.write_start_array()?;
                for item in items {
                    self.write_untyped(item, generator)?;
                }
                generator.write_end_array()
            }
            Value::Object(_) if host::is_optional(value) => match host::optional_content(value)? {
                Some(content) => self.write_untyped(content, generator),
                None => generator.write_null(),
            },
            Value::Object(members) => {
                let mut named: Vec<(String, &Value)> = members
                    .iter()
                    .filter(|(key, _)| key.as_str() != TYPE_MARKER)
                    .filter(|(_, member)| self.config.serialize_null_values || !member.is_null())
                    .map(|(key, member)| (untyped_key(key), member))
                    .collect();
                named.sort_by(|(left, _), (right, _)| left.cmp(right));
                if self.config.property_order_strategy.is_reverse() {
                    named.reverse();
                }

                generator.write_start_object()?;
                for (key, member) in named {
                    generator.write_key(&key)?;
                    self.write_untyped(member, generator)?;
                }
                generator.write_end_object()
            }
        }
    }
}

fn scalar_kind(declared: &TypeDescriptor) -> ScalarKind {
    match declared {
        TypeDescriptor::Primitive(PrimitiveType::Boolean) => ScalarKind::Boolean,
        TypeDescriptor::Primitive(PrimitiveType::Char) => ScalarKind::Text,
        TypeDescriptor::Class(name) if name.as_str() == TYPE_BOOLEAN => ScalarKind::Boolean,
        TypeDescriptor::Class(name) if name.as_str() == TYPE_CHARACTER => ScalarKind::Text,
        _ => ScalarKind::Number,
    }
}

fn untyped_key(key: &str) -> String {
    [GETTER_PREFIX, BOOLEAN_GETTER_PREFIX]
        .iter()
        .find_map(|prefix| {
            key.strip_prefix(prefix)
                .filter(|suffix| suffix.chars().next().is_some_and(char::is_uppercase))
        })
        .map_or_else(|| key.to_string(), decapitalize)
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::runtime::CompactJsonGenerator;
    use crate::type_index::TypeIndex;

    fn serializer(index: serde_json::Value, config: GlobalSerializationConfig) -> ReflectiveSerializer {
        let index = TypeIndex::from_value(index).expect("index should load");
        ReflectiveSerializer::new(
            Arc::new(Inspector::new(Arc::new(index))),
            Arc::new(config),
        )
    }

    fn write(serializer: &ReflectiveSerializer, value: &Value, declared: &str) -> String {
        let declared = TypeDescriptor::try_from(declared).expect("signature should parse");
        let mut generator = CompactJsonGenerator::new();
        serializer
            .serialize(value, &declared, &mut generator)
            .expect("value should serialize");
        generator.finish().expect("document should be complete")
    }

    #[test]
    fn test_untyped_object_uses_property_names() {
        let serializer = serializer(json!({ "classes": [] }), GlobalSerializationConfig::default());
        let value = json!({
            "@type": "com.other.Unknown",
            "getZeta": 1,
            "isActive": true,
            "getURL": "u",
            "alpha": null,
        });
        assert_eq!(
            write(&serializer, &value, "com.other.Unknown"),
            r#"{"URL":"u","active":true,"zeta":1}"#
        );
    }

    #[test]
    fn test_class_instance_skips_null_properties() {
        let serializer = serializer(
            json!({
                "classes": [{
                    "name": "com.acme.Person",
                    "methods": [
                        { "name": "getName", "return_type": "java.lang.String" },
                        { "name": "getAge", "return_type": "int" },
                        { "name": "getNickname", "return_type": "java.util.Optional<java.lang.String>" },
                    ],
                }],
            }),
            GlobalSerializationConfig::default(),
        );
        let value = json!({ "getName": null, "getAge": 3, "getNickname": { "@optional": null } });
        assert_eq!(write(&serializer, &value, "com.acme.Person"), r#"{"age":3}"#);

        let value = json!({ "getName": "Ada", "getAge": 3, "getNickname": { "@optional": "A" } });
        assert_eq!(
            write(&serializer, &value, "com.acme.Person"),
            r#"{"age":3,"name":"Ada","nickname":"A"}"#
        );
    }

    #[test]
    fn test_null_primitive_is_an_error() {
        let serializer = serializer(json!({ "classes": [] }), GlobalSerializationConfig::default());
        let mut generator = CompactJsonGenerator::new();
        let result = serializer.serialize(
            &Value::Null,
            &TypeDescriptor::Primitive(PrimitiveType::Int),
            &mut generator,
        );
        assert!(result.is_err());
    }
}
