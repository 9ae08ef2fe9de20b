//! Class metadata inspector
//!
//! [`Inspector::inspect`] turns the raw [`ClassInfo`] of a type into an [`InspectionResult`]:
//! whether the type can be analysed statically at all, which properties it exposes through
//! getters and public fields, and the effective class-level annotations. Results are memoized
//! per class name for the lifetime of the inspector and computed at most once, even when
//! several threads ask for the same class concurrently.

mod property_naming;

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
pub use property_naming::{decapitalize, getter_property_name};
use serde::Serialize;

use crate::error::Result;
use crate::type_descriptor::ClassName;
use crate::type_index::{
    AnnotationInstance, AnnotationKind, AnnotationSet, AnnotationSource, ClassInfo, FieldInfo,
    MethodInfo, TypeIndex, Visibility,
};

/// Why a class cannot be serialized by generated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Impossibility {
    /// Interface with no concrete implementor in the index
    NoConcreteImplementor,
    /// Interface with several concrete implementors
    AmbiguousImplementors {
        /// The candidates, in index order
        implementors: Vec<ClassName>,
    },
    /// Abstract class
    Abstract,
    /// Enums are written as their constant name, never as objects
    Enum,
    /// Generic class whose type parameters are only known at runtime
    Generic {
        /// Declared parameter names
        type_parameters: Vec<String>,
    },
    /// Superclass chain loops back on itself
    CyclicHierarchy,
}

impl Display for Impossibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoConcreteImplementor => write!(f, "interface has no concrete implementor"),
            Self::AmbiguousImplementors { implementors } => write!(
                f,
                "interface has {} concrete implementors",
                implementors.len()
            ),
            Self::Abstract => write!(f, "class is abstract"),
            Self::Enum => write!(f, "type is an enum"),
            Self::Generic { type_parameters } => write!(
                f,
                "class declares type parameters <{}>",
                type_parameters.join(", ")
            ),
            Self::CyclicHierarchy => write!(f, "class hierarchy is cyclic"),
        }
    }
}

/// A property exposed through a getter, with its backing field when one exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetterProperty {
    /// Property name derived from the getter
    pub name:   String,
    /// The zero-argument getter
    pub getter: MethodInfo,
    /// Non-static field of the same name anywhere in the hierarchy
    pub field:  Option<FieldInfo>,
}

/// A public field that has no getter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProperty {
    /// The field name
    pub name:  String,
    /// The field itself
    pub field: FieldInfo,
}

/// Memoized analysis of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionResult {
    /// The class that was inspected
    pub class_name:        ClassName,
    /// The implementor to read properties from when `class_name` is an interface
    pub concrete_class:    Option<ClassName>,
    /// Set when the class cannot be analysed statically
    pub impossibility:     Option<Impossibility>,
    /// Getter-backed properties, most derived class first, in declaration order
    pub getters:           Vec<GetterProperty>,
    /// Field-backed properties without a getter
    pub fields:            Vec<FieldProperty>,
    /// Class, inherited and package annotations in priority order
    pub class_annotations: AnnotationSet,
}

impl InspectionResult {
    fn impossible(class_name: ClassName, impossibility: Impossibility) -> Self {
        Self {
            class_name,
            concrete_class: None,
            impossibility: Some(impossibility),
            getters: Vec::new(),
            fields: Vec::new(),
            class_annotations: AnnotationSet::default(),
        }
    }

    /// Whether generated code can serialize the class
    #[must_use]
    pub const fn is_possible(&self) -> bool { self.impossibility.is_none() }

    /// The class whose instances are actually read
    #[must_use]
    pub fn effective_class(&self) -> &ClassName {
        self.concrete_class.as_ref().unwrap_or(&self.class_name)
    }
}

/// Memoizing inspector over a shared [`TypeIndex`]
pub struct Inspector {
    index: Arc<TypeIndex>,
    cache: DashMap<ClassName, Arc<OnceCell<Arc<InspectionResult>>>>,
}

impl Inspector {
    /// Inspector with an empty cache
    #[must_use]
    pub fn new(index: Arc<TypeIndex>) -> Self {
        Self {
            index,
            cache: DashMap::new(),
        }
    }

    /// The inspected index
    #[must_use]
    pub fn index(&self) -> &TypeIndex { &self.index }

    /// Inspect a class, computing the result on first use
    ///
    /// Repeated calls return the same `Arc`. A class missing from the index is an
    /// [`Error::ClassNotFound`](crate::error::Error::ClassNotFound); failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error when `name` is missing from the index.
    pub fn inspect(&self, name: &ClassName) -> Result<Arc<InspectionResult>> {
        // Clone the cell out so no shard lock is held while computing
        let cell = Arc::clone(&self.cache.entry(name.clone()).or_default());
        cell.get_or_try_init(|| self.compute(name).map(Arc::new))
            .cloned()
    }

    /// Number of classes with a cached inspection
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn compute(&self, name: &ClassName) -> Result<InspectionResult> {
        let class = self.index.require_class(name)?;

        let target = match self.resolve_target(class) {
            Ok(target) => target,
            Err(impossibility) => {
                tracing::debug!(class = %name, %impossibility, "Class cannot be inspected statically");
                return Ok(InspectionResult::impossible(name.clone(), impossibility));
            }
        };

        let hierarchy: Vec<&ClassInfo> = std::iter::once(target)
            .chain(self.index.superclasses(target))
            .collect();

        let (getters, fields) = collect_properties(&hierarchy);
        let class_annotations = self.class_annotations(target, &hierarchy);
        let concrete_class = (target.name != *name).then(|| target.name.clone());

        tracing::debug!(
            class = %name,
            concrete = ?concrete_class,
            getters = getters.len(),
            fields = fields.len(),
            "Inspected class"
        );

        Ok(InspectionResult {
            class_name: name.clone(),
            concrete_class,
            impossibility: None,
            getters,
            fields,
            class_annotations,
        })
    }

    /// Pick the class whose members are read, or explain why there is none
    fn resolve_target<'a>(
        &'a self,
        class: &'a ClassInfo,
    ) -> std::result::Result<&'a ClassInfo, Impossibility> {
        if class.is_enum() {
            return Err(Impossibility::Enum);
        }

        let target = if class.is_interface() {
            let implementors = self.index.concrete_implementors(&class.name);
            match implementors.as_slice() {
                [] => return Err(Impossibility::NoConcreteImplementor),
                [single] => *single,
                many => {
                    return Err(Impossibility::AmbiguousImplementors {
                        implementors: many.iter().map(|c| c.name.clone()).collect(),
                    });
                }
            }
        } else if class.is_abstract {
            return Err(Impossibility::Abstract);
        } else {
            class
        };

        if !target.type_parameters.is_empty() {
            return Err(Impossibility::Generic {
                type_parameters: target.type_parameters.clone(),
            });
        }
        if self.index.has_cyclic_hierarchy(target) {
            return Err(Impossibility::CyclicHierarchy);
        }
        Ok(target)
    }

    fn class_annotations(&self, target: &ClassInfo, hierarchy: &[&ClassInfo]) -> AnnotationSet {
        let mut set = AnnotationSet::default();
        set.push_all(AnnotationSource::Class, &target.annotations);
        for superclass in hierarchy.iter().skip(1) {
            set.push_all(AnnotationSource::Inherited, &superclass.annotations);
        }
        for interface in self.index.all_interfaces(target) {
            set.push_all(AnnotationSource::Inherited, &interface.annotations);
        }
        if let Some(package) = self.index.package_of(&target.name) {
            set.push_all(AnnotationSource::Package, &package.annotations);
        }
        set
    }
}

fn is_transient(annotations: &[AnnotationInstance]) -> bool {
    annotations
        .iter()
        .any(|annotation| annotation.kind == AnnotationKind::Transient)
}

/// Walk the hierarchy (most derived first) collecting getter and field properties
///
/// The first definition of a property name wins. A name claimed by a getter is never
/// reported as a field property, even when the getter itself is excluded as transient.
fn collect_properties(hierarchy: &[&ClassInfo]) -> (Vec<GetterProperty>, Vec<FieldProperty>) {
    let backing_field = |name: &str| {
        hierarchy
            .iter()
            .flat_map(|class| class.fields.iter())
            .find(|field| field.name == name && !field.is_static)
            .cloned()
    };

    let mut claimed = HashSet::new();
    let mut getters = Vec::new();
    for method in hierarchy.iter().flat_map(|class| class.methods.iter()) {
        let Some(name) = getter_property_name(method) else {
            continue;
        };
        if !claimed.insert(name.clone()) {
            continue;
        }
        let field = backing_field(&name);
        let transient = is_transient(&method.annotations)
            || field
                .as_ref()
                .is_some_and(|field| is_transient(&field.annotations));
        if transient {
            tracing::trace!(property = %name, "Skipping transient getter property");
            continue;
        }
        getters.push(GetterProperty {
            name,
            getter: method.clone(),
            field,
        });
    }

    let mut fields = Vec::new();
    for field in hierarchy.iter().flat_map(|class| class.fields.iter()) {
        if field.visibility != Visibility::Public
            || field.is_static
            || field.is_transient
            || is_transient(&field.annotations)
        {
            continue;
        }
        if !claimed.insert(field.name.clone()) {
            continue;
        }
        fields.push(FieldProperty {
            name:  field.name.clone(),
            field: field.clone(),
        });
    }

    (getters, fields)
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    fn inspector(value: serde_json::Value) -> Inspector {
        Inspector::new(Arc::new(
            TypeIndex::from_value(value).expect("test index should build"),
        ))
    }

    fn hierarchy_index() -> Inspector {
        inspector(json!({
            "classes": [
                {
                    "name": "com.acme.Base",
                    "annotations": [{ "name": "JsonbNillable" }],
                    "fields": [
                        { "name": "id", "type": "long" },
                        { "name": "version", "type": "int", "visibility": "public" }
                    ],
                    "methods": [
                        { "name": "getId", "return_type": "long" },
                        { "name": "getLabel", "return_type": "java.lang.String" }
                    ]
                },
                {
                    "name": "com.acme.Person",
                    "superclass": "com.acme.Base",
                    "interfaces": ["com.acme.Named"],
                    "fields": [
                        { "name": "name", "type": "java.lang.String" },
                        { "name": "nickname", "type": "java.lang.String", "visibility": "public" },
                        { "name": "cache", "type": "java.lang.String", "visibility": "public", "is_transient": true },
                        { "name": "COUNT", "type": "int", "visibility": "public", "is_static": true },
                        {
                            "name": "secret",
                            "type": "java.lang.String",
                            "annotations": [{ "name": "JsonbTransient" }]
                        }
                    ],
                    "methods": [
                        { "name": "getName", "return_type": "java.lang.String" },
                        { "name": "getLabel", "return_type": "java.lang.String" },
                        { "name": "getSecret", "return_type": "java.lang.String" },
                        { "name": "isAdult", "return_type": "boolean" },
                        { "name": "setName", "parameters": ["java.lang.String"] }
                    ]
                },
                { "name": "com.acme.Named", "kind": "interface" }
            ]
        }))
    }

    #[test]
    fn test_property_discovery() {
        let inspector = hierarchy_index();
        let result = inspector
            .inspect(&ClassName::from("com.acme.Person"))
            .expect("person is indexed");

        assert!(result.is_possible());
        let getters: Vec<(&str, &str)> = result
            .getters
            .iter()
            .map(|g| (g.name.as_str(), g.getter.declaring_class.as_str()))
            .collect();
        assert_eq!(getters, vec![
            ("name", "com.acme.Person"),
            ("label", "com.acme.Person"),
            ("adult", "com.acme.Person"),
            ("id", "com.acme.Base"),
        ]);

        let id = result.getters.iter().find(|g| g.name == "id");
        assert_eq!(
            id.and_then(|g| g.field.as_ref())
                .map(|f| f.declaring_class.as_str()),
            Some("com.acme.Base")
        );

        let fields: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["nickname", "version"]);
    }

    #[test]
    fn test_class_annotations_include_inherited() {
        let inspector = hierarchy_index();
        let result = inspector
            .inspect(&ClassName::from("com.acme.Person"))
            .expect("person is indexed");
        assert_eq!(
            result
                .class_annotations
                .source_of(&AnnotationKind::Nillable),
            Some(AnnotationSource::Inherited)
        );
    }

    #[test]
    fn test_memoized_result_is_shared() {
        let inspector = hierarchy_index();
        let name = ClassName::from("com.acme.Person");
        let first = inspector.inspect(&name).expect("indexed");
        let second = inspector.inspect(&name).expect("indexed");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(inspector.cached_len(), 1);
    }

    #[test]
    fn test_interface_with_single_implementor_is_narrowed() {
        let inspector = inspector(json!({
            "classes": [
                { "name": "com.acme.Shape", "kind": "interface" },
                {
                    "name": "com.acme.Circle",
                    "interfaces": ["com.acme.Shape"],
                    "methods": [{ "name": "getRadius", "return_type": "double" }]
                }
            ]
        }));
        let result = inspector
            .inspect(&ClassName::from("com.acme.Shape"))
            .expect("shape is indexed");
        assert!(result.is_possible());
        assert_eq!(result.effective_class().as_str(), "com.acme.Circle");
        assert_eq!(result.getters.len(), 1);
    }

    #[test]
    fn test_impossible_shapes() {
        let inspector = inspector(json!({
            "classes": [
                { "name": "com.acme.Shape", "kind": "interface" },
                { "name": "com.acme.Square", "interfaces": ["com.acme.Shape"] },
                { "name": "com.acme.Circle", "interfaces": ["com.acme.Shape"] },
                { "name": "com.acme.Lonely", "kind": "interface" },
                { "name": "com.acme.Base", "is_abstract": true },
                { "name": "com.acme.Color", "kind": "enum" },
                { "name": "com.acme.Page", "type_parameters": ["T"] },
                { "name": "com.acme.Loop", "superclass": "com.acme.Loop2" },
                { "name": "com.acme.Loop2", "superclass": "com.acme.Loop" }
            ]
        }));
        let reason = |name: &str| {
            inspector
                .inspect(&ClassName::from(name))
                .expect("indexed")
                .impossibility
                .clone()
        };

        assert!(matches!(
            reason("com.acme.Shape"),
            Some(Impossibility::AmbiguousImplementors { .. })
        ));
        assert_eq!(
            reason("com.acme.Lonely"),
            Some(Impossibility::NoConcreteImplementor)
        );
        assert_eq!(reason("com.acme.Base"), Some(Impossibility::Abstract));
        assert_eq!(reason("com.acme.Color"), Some(Impossibility::Enum));
        assert!(matches!(
            reason("com.acme.Page"),
            Some(Impossibility::Generic { .. })
        ));
        assert_eq!(reason("com.acme.Loop"), Some(Impossibility::CyclicHierarchy));
    }

    #[test]
    fn test_missing_class_is_not_cached() {
        let inspector = hierarchy_index();
        let error = inspector
            .inspect(&ClassName::from("com.acme.Ghost"))
            .expect_err("ghost is not indexed");
        assert!(matches!(
            error.current_context(),
            Error::ClassNotFound { .. }
        ));
        assert_eq!(inspector.cached_len(), 0);
    }
}
