use error_stack::Report;

use crate::error::{Error, Result};
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
};
use crate::ir::{ScalarKind, Stmt};
use crate::type_descriptor::{PrimitiveType, TypeDescriptor};

/// `boolean`, `char` and the numeric primitives
pub struct PrimitiveGenerator;

impl TypeSerializerGenerator for PrimitiveGenerator {
    fn supports(&self, ty: &TypeDescriptor, _probe: &mut Probe<'_>) -> Result<Support> {
        Ok(match ty {
            TypeDescriptor::Primitive(PrimitiveType::Void) => {
                Support::Unsupported(UnsupportedReason::Void)
            }
            TypeDescriptor::Primitive(_) => Support::Fully,
            _ => Support::Unsupported(UnsupportedReason::NoMatchingGenerator),
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        _state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        let kind = match &ctx.value.declared {
            TypeDescriptor::Primitive(PrimitiveType::Boolean) => ScalarKind::Boolean,
            TypeDescriptor::Primitive(PrimitiveType::Char) => ScalarKind::Text,
            TypeDescriptor::Primitive(primitive) if primitive.is_numeric() => ScalarKind::Number,
            other => {
                return Err(Report::new(Error::generator_mismatch(
                    "primitive value",
                    other,
                )));
            }
        };
        Ok(vec![Stmt::WriteScalar {
            value: ctx.value.expr.clone(),
            kind,
        }])
    }
}
