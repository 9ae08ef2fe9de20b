//! User-defined classes
//!
//! Every user type gets one [`ObjectFunction`] per unit; a value of the type is written by
//! calling that function. Properties come from [`ordered_properties`], so keys, order and the
//! null policy are settled before any statement is built.
//!
//! Per property:
//! - primitives are always written
//! - nillable properties write `null` for a null value (or an empty optional)
//! - other properties are skipped entirely when null (or empty)

use error_stack::Report;

use super::optional::present_statements;
use crate::error::{Error, Result};
use crate::generator::{
    EmitState, GenerateContext, GeneratorKind, Probe, Property, Support,
    TypeSerializerGenerator, UnsupportedReason, ValueRef, aggregate_support, ordered_properties,
};
use crate::ir::{ObjectFunction, Stmt, ValueExpr};
use crate::type_descriptor::{ClassName, TypeDescriptor};

/// Non-platform classes present in the type index
pub struct ObjectGenerator;

impl TypeSerializerGenerator for ObjectGenerator {
    fn supports(&self, ty: &TypeDescriptor, probe: &mut Probe<'_>) -> Result<Support> {
        let TypeDescriptor::Class(name) = ty else {
            return Ok(Support::Unsupported(UnsupportedReason::NoMatchingGenerator));
        };
        if name.is_platform() {
            return Ok(Support::Unsupported(UnsupportedReason::NoMatchingGenerator));
        }

        let registry = probe.registry();
        if registry.index().class(name).is_none() {
            tracing::warn!(class = %name, "Referenced class is missing from the type index");
            return Ok(Support::Unsupported(UnsupportedReason::MissingClass(
                name.clone(),
            )));
        }

        let inspection = registry.inspector().inspect(name)?;
        if let Some(impossibility) = &inspection.impossibility {
            return Ok(Support::Unsupported(UnsupportedReason::NotPossible {
                class_name:    name.clone(),
                impossibility: impossibility.clone(),
            }));
        }

        let properties = ordered_properties(&inspection, registry.config());
        itertools::process_results(
            properties
                .into_iter()
                .map(|property| property_support(name, property, probe)),
            |supports| aggregate_support(supports),
        )
    }

    fn generate_not_null(
        &self,
        ctx: &GenerateContext<'_>,
        state: &mut EmitState,
    ) -> Result<Vec<Stmt>> {
        let class = ctx
            .value
            .declared
            .class_name()
            .ok_or_else(|| Report::new(Error::generator_mismatch("object", &ctx.value.declared)))?;
        state.request_object(class);
        Ok(vec![Stmt::CallObject {
            class: class.clone(),
            value: ctx.value.expr.clone(),
        }])
    }
}

/// Support of one property, unsupported deferrable types counting as unhandled leaves
fn property_support(owner: &ClassName, property: Property, resolver: &mut Probe<'_>) -> Result<Support> {
    let registry = resolver.registry();
    let support = match resolver.resolve(&property.type_descriptor)?.support {
        Support::Unsupported(_) if registry.is_deferrable(&property.type_descriptor) => {
            tracing::trace!(
                class = %owner,
                property = %property.final_name,
                "Deferring property to the reflective writer"
            );
            Support::WithUnhandled
        }
        Support::Unsupported(reason) => Support::Unsupported(UnsupportedReason::UnsupportedProperty {
            owner:    owner.clone(),
            property: property.final_name,
            reason:   Box::new(reason),
        }),
        supported => supported,
    };
    Ok(support)
}

/// Build the function writing a non-null value of `class`
///
/// An interface is read through its concrete implementor after a checked cast.
///
/// # Errors
///
/// Returns an error if:
/// - `class` is missing from the type index or cannot be written as an object
/// - a property type has no generator or its generation fails
pub fn build_object_function(
    class: &ClassName,
    ctx: &GenerateContext<'_>,
    state: &mut EmitState,
) -> Result<ObjectFunction> {
    let inspection = ctx.registry.inspector().inspect(class)?;
    if !inspection.is_possible() {
        return Err(Report::new(Error::generator_mismatch("object", class)));
    }

    let mut body = Vec::new();
    let mut target = ValueRef::new(ValueExpr::Root, TypeDescriptor::Class(class.clone()));
    if let Some(concrete) = &inspection.concrete_class {
        let narrowed = target.narrowed_to(concrete.clone());
        let local = state.local();
        body.push(Stmt::Let {
            local,
            value: narrowed.expr.clone(),
        });
        target = ValueRef {
            expr: ValueExpr::Local(local),
            ..narrowed
        };
    }

    let object_ctx = ctx.with_value(&target, true);
    body.push(Stmt::BeginObject);
    for property in ordered_properties(&inspection, ctx.config) {
        body.extend(property_statements(&object_ctx, &property, state)?);
    }
    body.push(Stmt::EndObject);

    tracing::debug!(class = %class, statements = body.len(), "Built object function");
    Ok(ObjectFunction {
        class: class.clone(),
        body,
    })
}

fn property_statements(
    owner: &GenerateContext<'_>,
    property: &Property,
    state: &mut EmitState,
) -> Result<Vec<Stmt>> {
    let ty = &property.type_descriptor;
    let kind = owner.registry.generator_for_property(ty)?.ok_or_else(|| {
        Report::new(Error::generator_mismatch(
            &format!("property `{}`", property.final_name),
            owner.value.declared.to_string(),
        ))
    })?;
    let generator = kind.generator();
    let read = property.accessor.read(owner.value.expr.clone());
    let key = Stmt::WriteKey(property.final_name.clone());

    if ty.is_primitive() {
        let value = ValueRef::new(read, ty.clone());
        let mut statements = vec![key];
        statements.extend(generator.generate_not_null(
            &owner.for_property(&value, &property.annotations),
            state,
        )?);
        return Ok(statements);
    }

    let local = state.local();
    let value = ValueRef::new(ValueExpr::Local(local), ty.clone());
    let binding = Stmt::Let { local, value: read };
    let property_ctx = owner.for_property(&value, &property.annotations);

    if property.nillable {
        let mut statements = vec![binding, key];
        statements.extend(generator.generate(&property_ctx, state)?);
        return Ok(statements);
    }

    let present = property_ctx.with_value(&value, true);
    let then = if kind == GeneratorKind::Optional {
        let inner = state.local();
        let mut content = vec![key];
        content.extend(present_statements(&present, inner, state)?);
        vec![Stmt::IfPresent {
            optional: ValueExpr::Local(local),
            inner,
            then: content,
            otherwise: Vec::new(),
        }]
    } else {
        let mut then = vec![key];
        then.extend(generator.generate_not_null(&present, state)?);
        then
    };

    Ok(vec![binding, Stmt::IfNotNull {
        value: ValueExpr::Local(local),
        then,
        otherwise: Vec::new(),
    }])
}
