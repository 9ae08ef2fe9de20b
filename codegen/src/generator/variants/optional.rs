use super::{element_of, required_generator};
use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
    ValueRef,
};
use crate::ir::{LocalId, Stmt, ValueExpr};
use crate::type_descriptor::{TypeDescriptor, TypeKind};

/// `Optional<T>` and the primitive optionals; an empty optional is written as `null`
pub struct OptionalGenerator;

impl TypeSerializerGenerator for OptionalGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        if ty.kind() != TypeKind::Optional {
            return Ok(Support::Unsupported(UnsupportedReason::NoMatchingGenerator));
        }
        let Some(element) = ty.element_type() else {
            return Ok(Support::Unsupported(UnsupportedReason::GenericClass(
                ty.clone(),
            )));
        };

        Ok(match probe.resolve(&element)?.support {
            Support::Unsupported(reason) => {
                Support::Unsupported(UnsupportedReason::UnsupportedElement {
                    container: ty.clone(),
                    element:   Box::new(reason),
                })
            }
            supported => supported,
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        let inner = state.local();
        let then = present_statements(ctx, inner, state)?;
        Ok(vec![Stmt::IfPresent {
            optional: ctx.value.expr.clone(),
            inner,
            then,
            otherwise: vec![Stmt::WriteNull],
        }])
    }
}

/// Statements writing the content of the optional held by `ctx`, bound to `inner`
///
/// The content of a present optional is never null.
pub(super) fn present_statements(
    ctx: &GenerateContext<'_>,
    inner: LocalId,
    state: &mut EmitState,
) -> Result<Vec<Stmt>> {
    let element_type = element_of(ctx.value)?;
    let generator = required_generator(ctx.registry, &element_type, "optional content")?;
    let content = ValueRef::new(ValueExpr::Local(inner), element_type);
    generator.generate_not_null(&ctx.with_value(&content, true), state)
}
