use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
};
use crate::ir::Stmt;
use crate::type_descriptor::TypeDescriptor;
use crate::type_descriptor::constants::DATE_TYPES;

/// Temporal values, written through the property's or the global date format
pub struct DateGenerator;

impl TypeSerializerGenerator for DateGenerator {
    fn supports(&self, ty: &TypeDescriptor, _probe: &mut Probe<'_>) -> Result<Support> {
        Ok(match ty {
            TypeDescriptor::Class(name) if DATE_TYPES.contains(&name.as_str()) => Support::Fully,
            _ => Support::Unsupported(UnsupportedReason::NoMatchingGenerator),
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        _state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        Ok(vec![Stmt::WriteDate {
            value:  ctx.value.expr.clone(),
            format: ctx.date_format()?,
        }])
    }
}
