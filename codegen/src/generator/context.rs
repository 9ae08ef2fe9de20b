//! Context types for serializer generation
//!
//! [`GenerateContext`] is the read-only view a generator works against: the root type, the
//! value currently being written, the registry and the global configuration. [`EmitState`]
//! is the mutable side of building one unit (local numbering and the queue of object types
//! that still need a function).

use std::collections::{HashSet, VecDeque};

use super::registry::GeneratorRegistry;
use crate::config::{DateFormat, GlobalSerializationConfig};
use crate::error::Result;
use crate::ir::{LocalId, ValueExpr};
use crate::type_descriptor::{ClassName, TypeDescriptor};
use crate::type_index::{AnnotationKind, AnnotationSet, VALUE_ATTRIBUTE};

/// The value being serialized: how to read it and what it is known to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRef {
    /// How the value is read
    pub expr:     ValueExpr,
    /// Declared (static) type of the value
    pub declared: TypeDescriptor,
    /// Runtime-confirmed class narrower than `declared`, after a checked cast
    pub narrowed: Option<ClassName>,
}

impl ValueRef {
    /// An unnarrowed value
    #[must_use]
    pub const fn new(expr: ValueExpr, declared: TypeDescriptor) -> Self {
        Self {
            expr,
            declared,
            narrowed: None,
        }
    }

    /// Rebind onto a checked cast to `class`
    #[must_use]
    pub fn narrowed_to(self, class: ClassName) -> Self {
        Self {
            expr:     self.expr.cast(class.clone()),
            declared: self.declared,
            narrowed: Some(class),
        }
    }

    /// The class downstream steps should read members from
    #[must_use]
    pub fn effective_class(&self) -> Option<&ClassName> {
        self.narrowed.as_ref().or_else(|| self.declared.class_name())
    }
}

/// Read-only generation context
#[derive(Clone, Copy)]
pub struct GenerateContext<'a> {
    /// Root type of the unit being built
    pub root_type:      &'a TypeDescriptor,
    /// The value being written
    pub value:          &'a ValueRef,
    /// Registry resolving nested types
    pub registry:       &'a GeneratorRegistry,
    /// Global configuration of the build
    pub config:         &'a GlobalSerializationConfig,
    /// Whether the current value can never be null here
    pub known_non_null: bool,
    /// Annotations of the property being written, if any
    pub annotations:    Option<&'a AnnotationSet>,
}

impl<'a> GenerateContext<'a> {
    /// Context for the (non-null) root value of a unit
    #[must_use]
    pub fn for_root(
        root_type: &'a TypeDescriptor,
        value: &'a ValueRef,
        registry: &'a GeneratorRegistry,
    ) -> Self {
        Self {
            root_type,
            value,
            registry,
            config: registry.config(),
            known_non_null: true,
            annotations: None,
        }
    }

    /// Same context, different value
    #[must_use]
    pub fn with_value<'b>(&self, value: &'b ValueRef, known_non_null: bool) -> GenerateContext<'b>
    where
        'a: 'b,
    {
        GenerateContext {
            root_type: self.root_type,
            value,
            registry: self.registry,
            config: self.config,
            known_non_null: known_non_null || value.declared.is_primitive(),
            annotations: self.annotations,
        }
    }

    /// Context for one property of an object
    #[must_use]
    pub fn for_property<'b>(
        &self,
        value: &'b ValueRef,
        annotations: &'b AnnotationSet,
    ) -> GenerateContext<'b>
    where
        'a: 'b,
    {
        GenerateContext {
            annotations: Some(annotations),
            ..self.with_value(value, false)
        }
    }

    /// Date format from the property annotations, else the global one
    ///
    /// # Errors
    ///
    /// Returns an error when an annotation carries an invalid date pattern.
    pub fn date_format(&self) -> Result<DateFormat> {
        date_format_for(self.annotations, self.config)
    }
}

/// Resolve the date format for a value written under `annotations`
///
/// # Errors
///
/// Returns an error when an annotation carries an invalid date pattern.
pub fn date_format_for(
    annotations: Option<&AnnotationSet>,
    config: &GlobalSerializationConfig,
) -> Result<DateFormat> {
    annotations
        .and_then(|set| set.get(&AnnotationKind::DateFormat))
        .and_then(|annotation| annotation.string_value(VALUE_ATTRIBUTE))
        .map_or_else(|| Ok(config.date_format.clone()), DateFormat::parse)
}

/// Mutable state of the unit under construction
#[derive(Debug, Default)]
pub struct EmitState {
    next_local: u32,
    pending:    VecDeque<ClassName>,
    requested:  HashSet<ClassName>,
}

impl EmitState {
    /// Allocate a fresh local
    pub const fn local(&mut self) -> LocalId {
        let id = LocalId(self.next_local);
        self.next_local += 1;
        id
    }

    /// Make sure a function is generated for `class`
    pub fn request_object(&mut self, class: &ClassName) {
        if self.requested.insert(class.clone()) {
            self.pending.push_back(class.clone());
        }
    }

    /// Next object type still waiting for its function
    pub fn next_pending(&mut self) -> Option<ClassName> { self.pending.pop_front() }
}
