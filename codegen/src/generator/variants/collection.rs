use super::{element_of, required_generator};
use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
    ValueRef,
};
use crate::ir::{Stmt, ValueExpr};
use crate::type_descriptor::{TypeDescriptor, TypeKind};

/// Arrays and collections, written as JSON arrays; null elements are written as `null`
pub struct CollectionGenerator;

impl TypeSerializerGenerator for CollectionGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        if !matches!(ty.kind(), TypeKind::Collection | TypeKind::Array) {
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
        let element_type = element_of(ctx.value)?;
        let generator = required_generator(ctx.registry, &element_type, "collection element")?;
        let element = state.local();
        let element_ref = ValueRef::new(ValueExpr::Local(element), element_type);
        let body = generator.generate(&ctx.with_value(&element_ref, false), state)?;

        Ok(vec![
            Stmt::BeginArray,
            Stmt::ForEachElement {
                iterable: ctx.value.expr.clone(),
                element,
                body,
            },
            Stmt::EndArray,
        ])
    }
}
