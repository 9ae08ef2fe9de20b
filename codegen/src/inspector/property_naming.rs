//! Accessor naming conventions
//!
//! A getter is `getXxx` with a non-void return (never `getClass`) or `isXxx` returning
//! primitive `boolean`. The property name is the suffix decapitalized the way bean
//! introspection does it: only the first character is lowered, and names starting with two
//! capitals (`getURL`) keep their case.

use crate::type_descriptor::constants::{BOOLEAN_GETTER_PREFIX, GET_CLASS_METHOD, GETTER_PREFIX};
use crate::type_descriptor::{PrimitiveType, TypeDescriptor};
use crate::type_index::{MethodInfo, Visibility};

/// Lower the first character unless the first two are both upper case
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

/// The property name a method exposes, if it is a getter
#[must_use]
pub fn getter_property_name(method: &MethodInfo) -> Option<String> {
    if method.visibility != Visibility::Public
        || method.is_static
        || !method.parameters.is_empty()
        || method.name == GET_CLASS_METHOD
    {
        return None;
    }

    let suffix = if let Some(suffix) = method.name.strip_prefix(GETTER_PREFIX)
        && method.return_type != TypeDescriptor::Primitive(PrimitiveType::Void)
    {
        suffix
    } else if let Some(suffix) = method.name.strip_prefix(BOOLEAN_GETTER_PREFIX)
        && method.return_type == TypeDescriptor::Primitive(PrimitiveType::Boolean)
    {
        suffix
    } else {
        return None;
    };

    // `get()` and `is()` name no property; `getter()` is not `get` + `ter`
    let first = suffix.chars().next()?;
    if !first.is_uppercase() && first != '_' {
        return None;
    }
    Some(decapitalize(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_descriptor::ClassName;

    fn method(name: &str, return_type: TypeDescriptor) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            return_type,
            parameters: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            annotations: Vec::new(),
            declaring_class: ClassName::from("com.acme.Item"),
        }
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("X"), "x");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_getter_names() {
        let string = TypeDescriptor::class("java.lang.String");
        let boolean = TypeDescriptor::Primitive(PrimitiveType::Boolean);
        let boxed_boolean = TypeDescriptor::class("java.lang.Boolean");

        assert_eq!(
            getter_property_name(&method("getName", string.clone())).as_deref(),
            Some("name")
        );
        assert_eq!(
            getter_property_name(&method("isActive", boolean)).as_deref(),
            Some("active")
        );
        assert_eq!(getter_property_name(&method("isActive", boxed_boolean)), None);
        assert_eq!(getter_property_name(&method("getClass", string.clone())), None);
        assert_eq!(getter_property_name(&method("getter", string.clone())), None);
        assert_eq!(getter_property_name(&method("get", string)), None);
        assert_eq!(
            getter_property_name(&method(
                "getNothing",
                TypeDescriptor::Primitive(PrimitiveType::Void)
            )),
            None
        );
    }

    #[test]
    fn test_non_public_or_static_methods_are_not_getters() {
        let mut hidden = method("getSecret", TypeDescriptor::class("java.lang.String"));
        hidden.visibility = Visibility::Private;
        assert_eq!(getter_property_name(&hidden), None);

        let mut shared = method("getShared", TypeDescriptor::class("java.lang.String"));
        shared.is_static = true;
        assert_eq!(getter_property_name(&shared), None);

        let mut with_argument = method("getItem", TypeDescriptor::class("java.lang.String"));
        with_argument.parameters = vec![TypeDescriptor::Primitive(PrimitiveType::Int)];
        assert_eq!(getter_property_name(&with_argument), None);
    }
}
