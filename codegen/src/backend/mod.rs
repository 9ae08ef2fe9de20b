//! Backends lowering serializer units
//!
//! A backend turns the IR of a [`SerializerUnit`] into something that writes JSON: the
//! [`Interpreter`] executes the statements against host values directly, the
//! [`RustSourceBackend`] emits a Rust module calling the same runtime helpers.

mod interpreter;
mod rust_source;

use std::collections::HashSet;

use error_stack::Report;
pub use interpreter::{InterpretedUnit, Interpreter};
pub use rust_source::{RustSource, RustSourceBackend};

use crate::error::{Error, Result};
use crate::ir::Stmt;
use crate::unit_builder::SerializerUnit;

/// Lowers a serializer unit into an executable or emittable form
pub trait Backend {
    /// The lowered form of one unit
    type Output;

    /// Lower `unit`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lowering`] when an object call has no matching function or a class
    /// has two functions.
    fn lower(&self, unit: &SerializerUnit) -> Result<Self::Output>;
}

/// Check that every object call in a unit targets a function of the unit
fn check_call_targets(unit: &SerializerUnit) -> Result<()> {
    let mut defined = HashSet::new();
    for function in &unit.ir.functions {
        if !defined.insert(&function.class) {
            return Err(Report::new(Error::Lowering(format!(
                "unit {} defines {} twice",
                unit.id, function.class
            ))));
        }
    }
    for stmt in unit.ir.statements() {
        if let Stmt::CallObject { class, .. } = stmt
            && !defined.contains(class)
        {
            return Err(Report::new(Error::Lowering(format!(
                "unit {} calls {class} without defining it",
                unit.id
            ))));
        }
    }
    Ok(())
}
