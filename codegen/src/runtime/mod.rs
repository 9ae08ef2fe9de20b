//! Runtime support shared by generated and interpreted serializers

pub mod host;
mod json_generator;
mod reflective;

use error_stack::Report;
pub use json_generator::{CompactJsonGenerator, JsonGenerator};
pub use reflective::ReflectiveSerializer;
use serde_json::Value;

use crate::error::Result;
use crate::type_descriptor::TypeDescriptor;

/// Output target plus the reflective writer for deferred leaves
pub struct SerializationContext<'a> {
    generator:   &'a mut dyn JsonGenerator,
    leaf_writer: &'a ReflectiveSerializer,
}

impl<'a> SerializationContext<'a> {
    /// Pair a generator with the writer for deferred leaves
    #[must_use]
    pub fn new(generator: &'a mut dyn JsonGenerator, leaf_writer: &'a ReflectiveSerializer) -> Self {
        Self {
            generator,
            leaf_writer,
        }
    }

    /// The output target
    pub fn generator(&mut self) -> &mut dyn JsonGenerator { &mut *self.generator }

    /// Write a deferred leaf through the reflective writer
    ///
    /// # Errors
    ///
    /// Returns an error when `value` does not match `declared` or the generator rejects a write.
    pub fn write_unhandled(&mut self, value: &Value, declared: &TypeDescriptor) -> Result<()> {
        self.leaf_writer.serialize(value, declared, &mut *self.generator)
    }

    /// Same as [`Self::write_unhandled`] with the declared type as a signature string
    ///
    /// # Errors
    ///
    /// Returns an error when `signature` does not parse, otherwise as [`Self::write_unhandled`].
    pub fn write_unhandled_signature(&mut self, value: &Value, signature: &str) -> Result<()> {
        let declared = TypeDescriptor::try_from(signature).map_err(Report::new)?;
        self.write_unhandled(value, &declared)
    }
}
