//! Type-serializer generators
//!
//! Each variant answers two questions about a type: can it be serialized statically
//! ([`TypeSerializerGenerator::supports`]) and what statements write a value of it
//! ([`TypeSerializerGenerator::generate`]). The set of variants is closed and probed in the
//! fixed order of [`GENERATOR_ORDER`].

mod context;
mod property;
mod registry;
mod support_level;
mod variants;


pub use context::{EmitState, GenerateContext, ValueRef, date_format_for};
pub use property::{Accessor, Property, ordered_properties, resolve_nillable};
pub use registry::{GeneratorRegistry, Probe, Resolution};
use serde::Serialize;
use strum::Display;
pub use support_level::{Support, SupportLevel, UnsupportedReason, aggregate_support};
pub use variants::build_object_function;
use variants::{
    BoxedGenerator, CollectionGenerator, DateGenerator, MapGenerator, ObjectGenerator,
    OptionalGenerator, PrimitiveGenerator, StringGenerator, UnhandledGenerator,
};

use crate::error::Result;
use crate::ir::{Stmt, ValueExpr};
use crate::type_descriptor::TypeDescriptor;

/// The closed set of generator variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeneratorKind {
    /// Primitive types
    Primitive,
    /// Boxed primitives and the arbitrary-precision numbers
    Boxed,
    /// String-like platform classes and enum constants
    String,
    /// Date and time classes
    Date,
    /// `Optional<T>` and the primitive optionals
    Optional,
    /// Arrays and collections
    Collection,
    /// Maps keyed by strings, boxed primitives or enum constants
    Map,
    /// Classes described by the type index
    Object,
    /// Generic leaf writer; never selected by probing, only for deferred properties
    Unhandled,
}

/// Probe order; the first variant that does not report `Unsupported` wins
pub const GENERATOR_ORDER: [GeneratorKind; 8] = [
    GeneratorKind::Primitive,
    GeneratorKind::Boxed,
    GeneratorKind::String,
    GeneratorKind::Date,
    GeneratorKind::Optional,
    GeneratorKind::Collection,
    GeneratorKind::Map,
    GeneratorKind::Object,
];

impl GeneratorKind {
    /// The implementation of this variant
    #[must_use]
    pub fn generator(self) -> &'static dyn TypeSerializerGenerator {
        match self {
            Self::Primitive => &PrimitiveGenerator,
            Self::Boxed => &BoxedGenerator,
            Self::String => &StringGenerator,
            Self::Date => &DateGenerator,
            Self::Optional => &OptionalGenerator,
            Self::Collection => &CollectionGenerator,
            Self::Map => &MapGenerator,
            Self::Object => &ObjectGenerator,
            Self::Unhandled => &UnhandledGenerator,
        }
    }
}

/// Behaviour shared by every generator variant
pub trait TypeSerializerGenerator: Sync {
    /// Probe whether `ty` can be serialized by this variant
    ///
    /// Types whose shape this variant does not handle at all report
    /// [`UnsupportedReason::NoMatchingGenerator`].
    ///
    /// # Errors
    ///
    /// Returns an error when a class involved in `ty` cannot be inspected.
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support>;

    /// Statements writing the current value, which is known to be non-null
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`](crate::error::Error::InternalConsistency) when
    /// the value does not have the shape this variant reported support for.
    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        state: &mut EmitState,
    ) -> Result<Vec<Stmt>>;

    /// Statements writing the current value, writing `null` when it is null
    ///
    /// # Errors
    ///
    /// Returns an error as [`Self::generate_not_null`] does.
    fn generate(&self, ctx: &GenerateContext<'_>, state: &mut EmitState) -> Result<Vec<Stmt>> {
        if ctx.known_non_null {
            return self.generate_not_null(ctx, state);
        }

        let (binding, bound) = bind(ctx.value, state);
        let then = self.generate_not_null(&ctx.with_value(&bound, true), state)?;
        let mut statements: Vec<Stmt> = binding.into_iter().collect();
        statements.push(Stmt::IfNotNull {
            value: bound.expr,
            then,
            otherwise: vec![Stmt::WriteNull],
        });
        Ok(statements)
    }
}

/// Bind a value to a local unless it already is one
///
/// Returns the `Let` statement (if any) and the reference to use afterwards.
pub fn bind(value: &ValueRef, state: &mut EmitState) -> (Option<Stmt>, ValueRef) {
    match value.expr {
        ValueExpr::Root | ValueExpr::Local(_) => (None, value.clone()),
        _ => {
            let local = state.local();
            let binding = Stmt::Let {
                local,
                value: value.expr.clone(),
            };
            let bound = ValueRef {
                expr:     ValueExpr::Local(local),
                declared: value.declared.clone(),
                narrowed: value.narrowed.clone(),
            };
            (Some(binding), bound)
        }
    }
}
