//! Serializer unit construction for a single root type

use std::fmt::Display;

use error_stack::Report;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::generator::{
    EmitState, GenerateContext, GeneratorRegistry, SupportLevel, ValueRef, build_object_function,
};
use crate::ir::{UnitIr, ValueExpr};
use crate::type_descriptor::TypeDescriptor;

/// Fully-qualified identifier of a generated unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Wrap an already-qualified identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    /// The identifier as written in the manifest
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Last dot-separated segment
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Name of the emitted source file without extension
    ///
    /// Lowercase, so two ids differing only in case share a stem. Unit naming keeps stems
    /// unique within a run.
    #[must_use]
    pub fn file_stem(&self) -> String { self.0.replace(['.', '$'], "_").to_lowercase() }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// A generated serializer for one root type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializerUnit {
    /// Unique unit id
    pub id:        UnitId,
    /// Root type written by the unit
    pub root_type: TypeDescriptor,
    /// Never [`SupportLevel::Unsupported`]
    pub support:   SupportLevel,
    /// Routine lowered by a backend
    pub ir:        UnitIr,
}

impl SerializerUnit {
    /// Whether some leaf is written by the reflective writer at runtime
    #[must_use]
    pub const fn needs_reflection(&self) -> bool { self.support.needs_reflection() }
}

/// Builds serializer units against a shared registry
pub struct UnitBuilder<'a> {
    registry: &'a GeneratorRegistry,
}

impl<'a> UnitBuilder<'a> {
    /// Builder resolving generators through `registry`
    #[must_use]
    pub const fn new(registry: &'a GeneratorRegistry) -> Self { Self { registry } }

    /// Build the unit for `root`, or `None` when it cannot be serialized statically
    ///
    /// A root class missing from the type index aborts with
    /// [`Error::ClassNotFound`]; any other unsupported root is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the root class is missing from the type index
    /// - generation disagrees with the support decision for some nested type
    pub fn build(&self, root: &TypeDescriptor, id: UnitId) -> Result<Option<SerializerUnit>> {
        if let TypeDescriptor::Class(name) = root
            && !name.is_platform()
            && self.registry.index().class(name).is_none()
        {
            return Err(
                Report::new(Error::class_not_found(name)).attach(format!("Root type of unit {id}"))
            );
        }

        let resolution = self.registry.resolve(root)?;
        if let Some(reason) = resolution.support.reason() {
            tracing::debug!(root = %root, %reason, "Root type is not statically serializable");
            return Ok(None);
        }
        let generator = resolution
            .generator
            .ok_or_else(|| Report::new(Error::generator_mismatch("root", root)))?
            .generator();

        let value = ValueRef::new(ValueExpr::Root, root.clone());
        let ctx = GenerateContext::for_root(root, &value, self.registry);
        let mut state = EmitState::default();
        let entry = generator.generate_not_null(&ctx, &mut state)?;

        let mut functions = Vec::new();
        while let Some(class) = state.next_pending() {
            functions.push(build_object_function(&class, &ctx, &mut state)?);
        }

        let ir = UnitIr { entry, functions };
        let support = resolution.support.level();
        if (ir.unhandled_count() > 0) != support.needs_reflection() {
            return Err(Report::new(Error::InternalConsistency(format!(
                "Unit {id} has {} reflective leaves but support level {support}",
                ir.unhandled_count()
            ))));
        }

        tracing::debug!(
            unit = %id,
            root = %root,
            %support,
            functions = ir.functions.len(),
            "Built serializer unit"
        );
        Ok(Some(SerializerUnit {
            id,
            root_type: root.clone(),
            support,
            ir,
        }))
    }
}
