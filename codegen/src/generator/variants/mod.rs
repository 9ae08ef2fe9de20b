//! Generator variants, one per type shape

mod boxed;
mod collection;
mod date;
mod map;
mod object;
mod optional;
mod primitive;
mod string;
mod unhandled;

pub use boxed::BoxedGenerator;
pub use collection::CollectionGenerator;
pub use date::DateGenerator;
use error_stack::Report;
pub use map::MapGenerator;
pub use object::{ObjectGenerator, build_object_function};
pub use optional::OptionalGenerator;
pub use primitive::PrimitiveGenerator;
pub use string::StringGenerator;
pub use unhandled::UnhandledGenerator;

use super::context::ValueRef;
use super::registry::GeneratorRegistry;
use super::{GeneratorKind, TypeSerializerGenerator};
use crate::error::{Error, Result};
use crate::type_descriptor::TypeDescriptor;

/// The generator for a nested type that probing already reported as supported
fn required_generator(
    registry: &GeneratorRegistry,
    ty: &TypeDescriptor,
    what: &str,
) -> Result<&'static dyn TypeSerializerGenerator> {
    registry
        .corresponding_generator(ty)?
        .map(GeneratorKind::generator)
        .ok_or_else(|| Report::new(Error::generator_mismatch(what, ty)))
}

/// Element type of the container held by `value`
fn element_of(value: &ValueRef) -> Result<TypeDescriptor> {
    value
        .declared
        .element_type()
        .ok_or_else(|| Report::new(Error::generator_mismatch("element", &value.declared)))
}
