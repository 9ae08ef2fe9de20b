use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
};
use crate::ir::{ScalarKind, Stmt};
use crate::type_descriptor::TypeDescriptor;
use crate::type_descriptor::constants::{BOXED_TYPES, TYPE_BOOLEAN, TYPE_CHARACTER};

/// Boxed primitives and the arbitrary-precision numbers
pub struct BoxedGenerator;

impl TypeSerializerGenerator for BoxedGenerator {
    fn supports(&self, ty: &TypeDescriptor, _probe: &mut Probe<'_>) -> Result<Support> {
        Ok(match ty {
            TypeDescriptor::Class(name) if BOXED_TYPES.contains(&name.as_str()) => Support::Fully,
            _ => Support::Unsupported(UnsupportedReason::NoMatchingGenerator),
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        _state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        let kind = match ctx.value.declared.class_name().map(|name| name.as_str()) {
            Some(TYPE_BOOLEAN) => ScalarKind::Boolean,
            Some(TYPE_CHARACTER) => ScalarKind::Text,
            _ => ScalarKind::Number,
        };
        Ok(vec![Stmt::WriteScalar {
            value: ctx.value.expr.clone(),
            kind,
        }])
    }
}
