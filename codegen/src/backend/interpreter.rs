use std::any::Any;
use std::collections::HashMap;

use error_stack::Report;
use serde_json::Value;

use super::{Backend, check_call_targets};
use crate::error::{Error, Result};
use crate::ir::{LocalId, ObjectFunction, Stmt, ValueExpr};
use crate::runtime::{SerializationContext, host};
use crate::type_descriptor::ClassName;
use crate::unit_builder::{SerializerUnit, UnitId};

/// Backend executing the IR directly
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Backend for Interpreter {
    type Output = InterpretedUnit;

    fn lower(&self, unit: &SerializerUnit) -> Result<InterpretedUnit> {
        check_call_targets(unit)?;
        let functions = unit
            .ir
            .functions
            .iter()
            .enumerate()
            .map(|(position, function)| (function.class.clone(), position))
            .collect();
        Ok(InterpretedUnit {
            unit: unit.clone(),
            functions,
        })
    }
}

/// A unit ready to run
#[derive(Debug, Clone)]
pub struct InterpretedUnit {
    unit:      SerializerUnit,
    functions: HashMap<ClassName, usize>,
}

/// What a local holds
#[derive(Debug, Clone, Copy)]
enum Bound<'v> {
    Value(&'v Value),
    /// A map key, written with `WriteDynamicKey`
    Key(&'v str),
}

type Frame<'v> = HashMap<LocalId, Bound<'v>>;

impl InterpretedUnit {
    /// Id of the lowered unit
    #[must_use]
    pub const fn id(&self) -> &UnitId { &self.unit.id }

    /// The lowered unit
    #[must_use]
    pub const fn unit(&self) -> &SerializerUnit { &self.unit }

    /// Write a non-null value of the root type
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `value` is null
    /// - some part of `value` does not match the shape of its declared type
    /// - the generator rejects a write
    pub fn serialize(&self, value: &Value, ctx: &mut SerializationContext<'_>) -> Result<()> {
        if value.is_null() {
            return Err(Report::new(Error::shape_mismatch(
                &format!("a non-null `{}`", self.unit.root_type),
                value,
            )));
        }
        let mut frame = Frame::new();
        self.execute(&self.unit.ir.entry, value, &mut frame, ctx)
    }

    /// Type-erased bridge; the value must be a host [`Value`]
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is not a host value, otherwise as [`Self::serialize`].
    pub fn serialize_erased(&self, value: &dyn Any, ctx: &mut SerializationContext<'_>) -> Result<()> {
        let value = value.downcast_ref::<Value>().ok_or_else(|| {
            Report::new(Error::Serialization(format!(
                "unit {} received a value that is not a host value",
                self.unit.id
            )))
        })?;
        self.serialize(value, ctx)
    }

    fn function(&self, class: &ClassName) -> Result<&ObjectFunction> {
        self.functions
            .get(class)
            .and_then(|&position| self.unit.ir.functions.get(position))
            .ok_or_else(|| {
                Report::new(Error::Lowering(format!(
                    "unit {} has no function for {class}",
                    self.unit.id
                )))
            })
    }

    fn execute<'v>(
        &self,
        block: &[Stmt],
        root: &'v Value,
        frame: &mut Frame<'v>,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<()> {
        for stmt in block {
            self.step(stmt, root, frame, ctx)?;
        }
        Ok(())
    }

    fn step<'v>(
        &self,
        stmt: &Stmt,
        root: &'v Value,
        frame: &mut Frame<'v>,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<()> {
        match stmt {
            Stmt::BeginObject => ctx.generator().write_start_object(),
            Stmt::EndObject => ctx.generator().write_end_object(),
            Stmt::BeginArray => ctx.generator().write_start_array(),
            Stmt::EndArray => ctx.generator().write_end_array(),
            Stmt::WriteKey(key) => ctx.generator().write_key(key),
            Stmt::WriteDynamicKey(expr) => match expr {
                ValueExpr::Local(local) => match frame.get(local) {
                    Some(Bound::Key(key)) => ctx.generator().write_key(key),
                    Some(Bound::Value(Value::String(key))) => ctx.generator().write_key(key),
                    _ => Err(Report::new(Error::Serialization(format!(
                        "local {local} does not hold a key"
                    )))),
                },
                other => {
                    let value = eval(other, root, frame)?;
                    let key = value
                        .as_str()
                        .ok_or_else(|| Report::new(Error::shape_mismatch("a key", value)))?;
                    ctx.generator().write_key(key)
                }
            },
            Stmt::WriteNull => ctx.generator().write_null(),
            Stmt::WriteScalar { value, kind } => {
                let value = eval(value, root, frame)?;
                host::write_scalar(ctx.generator(), value, *kind)
            }
            Stmt::WriteDate { value, format } => {
                let value = eval(value, root, frame)?;
                host::write_date(ctx.generator(), value, format)
            }
            Stmt::Let { local, value } => {
                let value = eval(value, root, frame)?;
                frame.insert(*local, Bound::Value(value));
                Ok(())
            }
            Stmt::IfNotNull {
                value,
                then,
                otherwise,
            } => {
                if eval(value, root, frame)?.is_null() {
                    self.execute(otherwise, root, frame, ctx)
                } else {
                    self.execute(then, root, frame, ctx)
                }
            }
            Stmt::IfPresent {
                optional,
                inner,
                then,
                otherwise,
            } => match host::optional_content(eval(optional, root, frame)?)? {
                Some(content) => {
                    frame.insert(*inner, Bound::Value(content));
                    self.execute(then, root, frame, ctx)
                }
                None => self.execute(otherwise, root, frame, ctx),
            },
            Stmt::ForEachElement {
                iterable,
                element,
                body,
            } => {
                for item in host::elements(eval(iterable, root, frame)?)? {
                    frame.insert(*element, Bound::Value(item));
                    self.execute(body, root, frame, ctx)?;
                }
                Ok(())
            }
            Stmt::ForEachEntry {
                map,
                key,
                value,
                body,
            } => {
                for (name, entry) in host::entries(eval(map, root, frame)?)? {
                    frame.insert(*key, Bound::Key(name));
                    frame.insert(*value, Bound::Value(entry));
                    self.execute(body, root, frame, ctx)?;
                }
                Ok(())
            }
            Stmt::CallObject { class, value } => {
                let target = eval(value, root, frame)?;
                let function = self.function(class)?;
                let mut callee = Frame::new();
                self.execute(&function.body, target, &mut callee, ctx)
            }
            Stmt::WriteUnhandled {
                value,
                declared_type,
            } => {
                let value = eval(value, root, frame)?;
                ctx.write_unhandled(value, declared_type)
            }
        }
    }
}

fn eval<'v>(expr: &ValueExpr, root: &'v Value, frame: &Frame<'v>) -> Result<&'v Value> {
    match expr {
        ValueExpr::Root => Ok(root),
        ValueExpr::Local(local) => match frame.get(local) {
            Some(&Bound::Value(value)) => Ok(value),
            Some(Bound::Key(_)) | None => Err(Report::new(Error::Serialization(format!(
                "local {local} is not bound to a value"
            )))),
        },
        ValueExpr::Getter { target, method } => {
            host::invoke_getter(eval(target, root, frame)?, method)
        }
        ValueExpr::Field { target, name } => host::read_field(eval(target, root, frame)?, name),
        ValueExpr::Cast { target, class } => host::checked_cast(eval(target, root, frame)?, class),
    }
}
