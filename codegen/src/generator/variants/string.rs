use crate::error::Result;
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
};
use crate::ir::{ScalarKind, Stmt};
use crate::type_descriptor::constants::STRING_TYPES;
use crate::type_descriptor::{ClassName, TypeDescriptor};
use crate::type_index::TypeIndex;

/// String-like platform types and enum constants
pub struct StringGenerator;

fn is_enum(index: &TypeIndex, name: &ClassName) -> bool {
    index.class(name).is_some_and(|class| class.is_enum())
}

impl TypeSerializerGenerator for StringGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        Ok(match ty {
            TypeDescriptor::Class(name)
                if STRING_TYPES.contains(&name.as_str())
                    || is_enum(probe.registry().index(), name) =>
            {
                Support::Fully
            }
            _ => Support::Unsupported(UnsupportedReason::NoMatchingGenerator),
        })
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        _state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        let kind = match ctx.value.declared.class_name() {
            Some(name) if is_enum(ctx.registry.index(), name) => ScalarKind::EnumConstant,
            _ => ScalarKind::Text,
        };
        Ok(vec![Stmt::WriteScalar {
            value: ctx.value.expr.clone(),
            kind,
        }])
    }
}
