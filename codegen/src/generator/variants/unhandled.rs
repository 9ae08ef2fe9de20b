use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
};
use crate::ir::Stmt;
use crate::type_descriptor::TypeDescriptor;

/// Hands a deferred value to the reflective writer at runtime
///
/// Never chosen by probing; the object variant selects it for properties whose type has no
/// generator but may be deferred. The reflective writer handles null itself.
pub struct UnhandledGenerator;

impl TypeSerializerGenerator for UnhandledGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        Ok(if probe.registry().is_deferrable(ty) {
            Support::WithUnhandled
        } else {
            Support::Unsupported(UnsupportedReason::NoMatchingGenerator)
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        _state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        Ok(vec![Stmt::WriteUnhandled {
            value:         ctx.value.expr.clone(),
            declared_type: ctx.value.declared.clone(),
        }])
    }

    fn generate(&self, ctx: &GenerateContext<'_>, state: &mut EmitState) -> Result<Vec<Stmt>> {
        self.generate_not_null(ctx, state)
    }
}
