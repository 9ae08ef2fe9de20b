//! Class metadata index
//!
//! The index is the only view of the host type system the generator has. It is loaded
//! from a JSON document produced by the external scanner and is immutable afterwards.

mod annotations;

use std::collections::{HashMap, HashSet};
use std::path::Path;

pub use annotations::{
    AnnotationInstance, AnnotationKind, AnnotationSet, AnnotationSource, NILLABLE_ATTRIBUTE,
    VALUE_ATTRIBUTE,
};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{Error, Result};
use crate::type_descriptor::{ClassName, PrimitiveType, TypeDescriptor};

/// Declared kind of an indexed class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClassKind {
    /// Concrete or abstract class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Enum type with named constants
    Enum,
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to subclasses and the package
    Protected,
    /// Visible within the package
    #[default]
    Package,
    /// Visible only inside the class
    Private,
}

const fn public() -> Visibility { Visibility::Public }

const fn private() -> Visibility { Visibility::Private }

fn void() -> TypeDescriptor { TypeDescriptor::Primitive(PrimitiveType::Void) }

/// A method declared on an indexed class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name
    pub name:            String,
    /// Declared return type, `void` when omitted
    #[serde(default = "void")]
    pub return_type:     TypeDescriptor,
    /// Parameter types in declaration order
    #[serde(default)]
    pub parameters:      Vec<TypeDescriptor>,
    /// Declared visibility, public when omitted
    #[serde(default = "public")]
    pub visibility:      Visibility,
    /// Whether the method is static
    #[serde(default)]
    pub is_static:       bool,
    /// Annotations on the method
    #[serde(default)]
    pub annotations:     Vec<AnnotationInstance>,
    /// Filled in when the index is built
    #[serde(skip)]
    pub declaring_class: ClassName,
}

/// A field declared on an indexed class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name
    pub name:            String,
    /// Declared field type
    #[serde(rename = "type")]
    pub field_type:      TypeDescriptor,
    /// Declared visibility, private when omitted
    #[serde(default = "private")]
    pub visibility:      Visibility,
    /// Whether the field is static
    #[serde(default)]
    pub is_static:       bool,
    /// Whether the field is transient
    #[serde(default)]
    pub is_transient:    bool,
    /// Annotations on the field
    #[serde(default)]
    pub annotations:     Vec<AnnotationInstance>,
    /// Filled in when the index is built
    #[serde(skip)]
    pub declaring_class: ClassName,
}

/// Metadata for one class, interface or enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Fully qualified class name
    pub name:            ClassName,
    /// Class, interface or enum
    #[serde(default)]
    pub kind:            ClassKind,
    /// Whether the class is abstract
    #[serde(default)]
    pub is_abstract:     bool,
    /// Direct superclass, `None` when none is declared
    #[serde(default)]
    pub superclass:      Option<ClassName>,
    /// Directly implemented interfaces
    #[serde(default)]
    pub interfaces:      Vec<ClassName>,
    /// Names of declared type variables
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Annotations on the class
    #[serde(default)]
    pub annotations:     Vec<AnnotationInstance>,
    /// Declared methods, inherited ones excluded
    #[serde(default)]
    pub methods:         Vec<MethodInfo>,
    /// Declared fields, inherited ones excluded
    #[serde(default)]
    pub fields:          Vec<FieldInfo>,
}

impl ClassInfo {
    /// Whether instances of exactly this class can exist
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        matches!(self.kind, ClassKind::Class) && !self.is_abstract
    }

    /// Whether this is an interface
    #[must_use]
    pub const fn is_interface(&self) -> bool { matches!(self.kind, ClassKind::Interface) }

    /// Whether this is an enum
    #[must_use]
    pub const fn is_enum(&self) -> bool { matches!(self.kind, ClassKind::Enum) }

    /// The declared field called `name`
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Package-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name
    pub name:        String,
    /// Annotations on the package
    #[serde(default)]
    pub annotations: Vec<AnnotationInstance>,
}

/// An externally discovered endpoint whose return type may need a serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// Endpoint name, empty when unknown
    #[serde(default)]
    pub name:        String,
    /// Type the endpoint returns
    pub return_type: TypeDescriptor,
}

/// User-declared serializers reported by the host framework
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHandlers {
    /// A handler for the whole output contract was declared; nothing is generated
    #[serde(default)]
    pub contract: bool,
    /// Types with their own user-supplied serializer
    #[serde(default)]
    pub types:    Vec<ClassName>,
}

/// On-disk layout of the index
#[derive(Debug, Default, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    classes:         Vec<ClassInfo>,
    #[serde(default)]
    packages:        Vec<PackageInfo>,
    #[serde(default)]
    endpoints:       Vec<EndpointInfo>,
    #[serde(default)]
    custom_handlers: CustomHandlers,
}

/// Immutable lookup structure over all known classes
#[derive(Debug, Default)]
pub struct TypeIndex {
    classes:         HashMap<ClassName, ClassInfo>,
    packages:        HashMap<String, PackageInfo>,
    endpoints:       Vec<EndpointInfo>,
    custom_handlers: CustomHandlers,
    /// Direct subclasses and implementors keyed by supertype
    subtypes:        HashMap<ClassName, Vec<ClassName>>,
}

impl TypeIndex {
    /// Load the index from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the file cannot be read
    /// - its contents are not a valid index document
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Report::new(Error::io_failed("read type index", path, e)))?;
        Self::from_json_str(&contents).attach(format!("Index file: {}", path.display()))
    }

    /// Parse the index from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not a valid index document or a signature does not parse.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: IndexDocument = serde_json::from_str(json)
            .change_context(Error::TypeIndex("Malformed type index document".to_string()))?;
        Self::from_document(document)
    }

    /// Build the index from an in-memory JSON value
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not a valid index document or a signature does not parse.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let document: IndexDocument = serde_json::from_value(value)
            .change_context(Error::TypeIndex("Malformed type index document".to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: IndexDocument) -> Result<Self> {
        let mut classes = HashMap::with_capacity(document.classes.len());
        let mut subtypes: HashMap<ClassName, Vec<ClassName>> = HashMap::new();

        for mut class in document.classes {
            let type_parameters = class.type_parameters.clone();
            for method in &mut class.methods {
                method.declaring_class = class.name.clone();
                method.return_type = method
                    .return_type
                    .clone()
                    .resolve_type_variables(&type_parameters);
                method.parameters = std::mem::take(&mut method.parameters)
                    .into_iter()
                    .map(|p| p.resolve_type_variables(&type_parameters))
                    .collect();
            }
            for field in &mut class.fields {
                field.declaring_class = class.name.clone();
                field.field_type = field
                    .field_type
                    .clone()
                    .resolve_type_variables(&type_parameters);
            }

            for supertype in class.superclass.iter().chain(class.interfaces.iter()) {
                subtypes
                    .entry(supertype.clone())
                    .or_default()
                    .push(class.name.clone());
            }

            if let Some(previous) = classes.insert(class.name.clone(), class) {
                return Err(Report::new(Error::TypeIndex(format!(
                    "Class {} declared more than once",
                    previous.name
                ))));
            }
        }

        for children in subtypes.values_mut() {
            children.sort();
        }

        let packages = document
            .packages
            .into_iter()
            .map(|package| (package.name.clone(), package))
            .collect();

        tracing::debug!(classes = classes.len(), "Built type index");

        Ok(Self {
            classes,
            packages,
            endpoints: document.endpoints,
            custom_handlers: document.custom_handlers,
            subtypes,
        })
    }

    /// Look up a class
    #[must_use]
    pub fn class(&self, name: &ClassName) -> Option<&ClassInfo> { self.classes.get(name) }

    /// Look up a class, failing when it is missing
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] when the class is missing.
    pub fn require_class(&self, name: &ClassName) -> Result<&ClassInfo> {
        self.class(name)
            .ok_or_else(|| Report::new(Error::class_not_found(name)))
    }

    /// Package metadata for the package of `class`
    #[must_use]
    pub fn package_of(&self, class: &ClassName) -> Option<&PackageInfo> {
        class.package().and_then(|package| self.packages.get(package))
    }

    /// Superclasses of `class` that are present in the index, nearest first
    ///
    /// The walk stops at the first superclass missing from the index (typically a
    /// platform class) and at any cycle.
    #[must_use]
    pub fn superclasses(&self, class: &ClassInfo) -> Vec<&ClassInfo> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([&class.name]);
        let mut next = class.superclass.as_ref();
        while let Some(name) = next {
            if !seen.insert(name) {
                tracing::warn!(class = %class.name, "Cyclic superclass chain in type index");
                break;
            }
            let Some(superclass) = self.class(name) else {
                break;
            };
            chain.push(superclass);
            next = superclass.superclass.as_ref();
        }
        chain
    }

    /// Whether the superclass chain of `class` loops back on itself
    #[must_use]
    pub fn has_cyclic_hierarchy(&self, class: &ClassInfo) -> bool {
        let mut seen = HashSet::from([&class.name]);
        let mut next = class.superclass.as_ref();
        while let Some(name) = next {
            if !seen.insert(name) {
                return true;
            }
            next = self.class(name).and_then(|c| c.superclass.as_ref());
        }
        false
    }

    /// All interfaces implemented by `class` directly or through supertypes
    #[must_use]
    pub fn all_interfaces(&self, class: &ClassInfo) -> Vec<&ClassInfo> {
        let mut result: Vec<&ClassInfo> = Vec::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<&ClassName> = std::iter::once(class)
            .chain(self.superclasses(class))
            .flat_map(|c| c.interfaces.iter())
            .collect();
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(interface) = self.class(name) {
                pending.extend(interface.interfaces.iter());
                result.push(interface);
            }
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Every concrete class that is a (transitive) subtype of `supertype`
    #[must_use]
    pub fn concrete_implementors(&self, supertype: &ClassName) -> Vec<&ClassInfo> {
        let mut result: Vec<&ClassInfo> = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![supertype];
        while let Some(name) = pending.pop() {
            for child in self.subtypes.get(name).into_iter().flatten() {
                if !seen.insert(child) {
                    continue;
                }
                pending.push(child);
                if let Some(info) = self.class(child)
                    && info.is_concrete()
                {
                    result.push(info);
                }
            }
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Endpoints recorded by the scanner
    #[must_use]
    pub fn endpoints(&self) -> &[EndpointInfo] { &self.endpoints }

    /// User-declared handlers recorded by the scanner
    #[must_use]
    pub const fn custom_handlers(&self) -> &CustomHandlers { &self.custom_handlers }

    /// Number of indexed classes
    #[must_use]
    pub fn len(&self) -> usize { self.classes.len() }

    /// Whether no class is indexed
    #[must_use]
    pub fn is_empty(&self) -> bool { self.classes.is_empty() }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_index() -> Result<TypeIndex> {
        TypeIndex::from_value(json!({
            "classes": [
                { "name": "com.acme.Shape", "kind": "interface" },
                { "name": "com.acme.Polygon", "kind": "interface", "interfaces": ["com.acme.Shape"] },
                { "name": "com.acme.AbstractShape", "is_abstract": true, "interfaces": ["com.acme.Polygon"] },
                { "name": "com.acme.Square", "superclass": "com.acme.AbstractShape" },
                {
                    "name": "com.acme.Box",
                    "type_parameters": ["T"],
                    "fields": [{ "name": "content", "type": "T" }],
                    "methods": [{ "name": "getContent", "return_type": "java.util.List<T>" }]
                }
            ],
            "packages": [{ "name": "com.acme", "annotations": [{ "name": "JsonbNillable" }] }]
        }))
    }

    #[test]
    fn test_concrete_implementors_are_transitive() {
        let index = sample_index();
        let names: Vec<String> = index
            .as_ref()
            .map(|index| {
                index
                    .concrete_implementors(&ClassName::from("com.acme.Shape"))
                    .into_iter()
                    .map(|c| c.name.to_string())
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(names, vec!["com.acme.Square".to_string()]);
    }

    #[test]
    fn test_type_variables_resolved_and_declaring_class_set() {
        let index = sample_index().ok();
        let boxed = index
            .as_ref()
            .and_then(|index| index.class(&ClassName::from("com.acme.Box")));
        let field = boxed.and_then(|c| c.field("content"));
        assert_eq!(
            field.map(|f| f.field_type.clone()),
            Some(TypeDescriptor::TypeVariable("T".to_string()))
        );
        assert_eq!(
            field.map(|f| f.declaring_class.to_string()),
            Some("com.acme.Box".to_string())
        );
        assert!(
            boxed
                .and_then(|c| c.methods.first())
                .is_some_and(|m| m.return_type.contains_unresolved())
        );
    }

    #[test]
    fn test_package_and_interfaces() {
        let index = sample_index().expect("index should build");
        let square = index.class(&ClassName::from("com.acme.Square"));
        assert!(
            index
                .package_of(&ClassName::from("com.acme.Square"))
                .is_some()
        );
        let interfaces: Vec<&str> = square
            .map(|s| index.all_interfaces(s))
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(interfaces, vec!["com.acme.Polygon", "com.acme.Shape"]);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let result = TypeIndex::from_value(json!({
            "classes": [{ "name": "com.acme.A" }, { "name": "com.acme.A" }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_class_is_reported() {
        let index = TypeIndex::default();
        let error = index.require_class(&ClassName::from("com.acme.Missing"));
        assert!(matches!(
            error.as_ref().map_err(|report| report.current_context()),
            Err(Error::ClassNotFound { .. })
        ));
    }
}
