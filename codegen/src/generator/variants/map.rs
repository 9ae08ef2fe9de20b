use error_stack::Report;

use super::required_generator;
use crate::error::{Error, Result};
use crate::generator::{
    EmitState, GenerateContext, Probe, Support, TypeSerializerGenerator, UnsupportedReason,
    ValueRef,
};
use crate::ir::{Stmt, ValueExpr};
use crate::type_descriptor::constants::{BOXED_TYPES, STRING_TYPES};
use crate::type_descriptor::{TypeDescriptor, TypeKind};
use crate::type_index::TypeIndex;

/// Maps with string-like keys, written as JSON objects
pub struct MapGenerator;

/// Keys are written through their string form: strings, boxed primitives and enum constants
fn is_writable_key(index: &TypeIndex, key: &TypeDescriptor) -> bool {
    match key {
        TypeDescriptor::Class(name) => {
            STRING_TYPES.contains(&name.as_str())
                || BOXED_TYPES.contains(&name.as_str())
                || index.class(name).is_some_and(|class| class.is_enum())
        }
        _ => false,
    }
}

impl TypeSerializerGenerator for MapGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        if ty.kind() != TypeKind::Map {
            return Ok(Support::Unsupported(UnsupportedReason::NoMatchingGenerator));
        }
        let (Some(key), Some(value)) = (ty.key_type(), ty.value_type()) else {
            return Ok(Support::Unsupported(UnsupportedReason::GenericClass(
                ty.clone(),
            )));
        };
        if !is_writable_key(probe.registry().index(), key) {
            return Ok(Support::Unsupported(UnsupportedReason::UnsupportedMapKey {
                map: ty.clone(),
                key: key.clone(),
            }));
        }

        Ok(match probe.resolve(value)?.support {
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
        let value_type = ctx
            .value
            .declared
            .value_type()
            .cloned()
            .ok_or_else(|| Report::new(Error::generator_mismatch("map value", &ctx.value.declared)))?;
        let generator = required_generator(ctx.registry, &value_type, "map value")?;

        let key = state.local();
        let value = state.local();
        let value_ref = ValueRef::new(ValueExpr::Local(value), value_type);
        let mut body = vec![Stmt::WriteDynamicKey(ValueExpr::Local(key))];
        body.extend(generator.generate(&ctx.with_value(&value_ref, false), state)?);

        Ok(vec![
            Stmt::BeginObject,
            Stmt::ForEachEntry {
                map: ctx.value.expr.clone(),
                key,
                value,
                body,
            },
            Stmt::EndObject,
        ])
    }
}
