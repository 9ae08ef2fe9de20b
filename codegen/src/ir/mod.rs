//! Serializer intermediate representation
//!
//! Generators never produce target code directly. They build a small statement tree that a
//! [`Backend`](crate::backend::Backend) lowers afterwards. Every user type reached from a root
//! gets its own [`ObjectFunction`]; nested objects are written through [`Stmt::CallObject`],
//! which keeps recursive type graphs finite.

use std::fmt::Display;

use serde::Serialize;

use crate::config::DateFormat;
use crate::type_descriptor::{ClassName, TypeDescriptor};

/// A local binding inside one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocalId(pub u32);

impl Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "v{}", self.0) }
}

/// An expression yielding a host value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    /// The value handed to the enclosing function
    Root,
    /// A previously bound local
    Local(LocalId),
    /// Invoke a zero-argument getter
    Getter {
        /// Receiver of the call
        target: Box<Self>,
        /// Getter method name
        method: String,
    },
    /// Read a public field
    Field {
        /// Object holding the field
        target: Box<Self>,
        /// Field name
        name:   String,
    },
    /// Checked cast onto a narrower class
    Cast {
        /// Value being narrowed
        target: Box<Self>,
        /// Class cast onto
        class:  ClassName,
    },
}

impl ValueExpr {
    /// Call `method` on this value
    #[must_use]
    pub fn getter(self, method: impl Into<String>) -> Self {
        Self::Getter {
            target: Box::new(self),
            method: method.into(),
        }
    }

    /// Read field `name` of this value
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        Self::Field {
            target: Box::new(self),
            name:   name.into(),
        }
    }

    /// Narrow this value onto `class`
    #[must_use]
    pub fn cast(self, class: ClassName) -> Self {
        Self::Cast {
            target: Box::new(self),
            class,
        }
    }
}

impl Display for ValueExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => write!(f, "value"),
            Self::Local(id) => write!(f, "{id}"),
            Self::Getter { target, method } => write!(f, "{target}.{method}()"),
            Self::Field { target, name } => write!(f, "{target}.{name}"),
            Self::Cast { target, class } => write!(f, "(({class}) {target})"),
        }
    }
}

/// How a scalar host value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// `true` or `false`
    Boolean,
    /// Integral and floating point numbers, boxed or primitive
    Number,
    /// Strings, characters and string-like platform values
    Text,
    /// The constant name of an enum value
    EnumConstant,
}

/// One step of a serialization routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Open a JSON object
    BeginObject,
    /// Close the innermost object
    EndObject,
    /// Open a JSON array
    BeginArray,
    /// Close the innermost array
    EndArray,
    /// Write a constant object key
    WriteKey(String),
    /// Write the string held by a local as an object key
    WriteDynamicKey(ValueExpr),
    /// Write a JSON `null`
    WriteNull,
    /// Write a non-null scalar
    WriteScalar {
        /// Value written
        value: ValueExpr,
        /// How the value is rendered
        kind:  ScalarKind,
    },
    /// Write a date as formatted text
    WriteDate {
        /// Date value written
        value:  ValueExpr,
        /// Pattern applied to the date
        format: DateFormat,
    },
    /// Bind a value once so it is not re-read
    Let {
        /// Binding introduced
        local: LocalId,
        /// Value bound
        value: ValueExpr,
    },
    /// Branch on whether a value is null
    IfNotNull {
        /// Value tested
        value:     ValueExpr,
        /// Run when the value is present
        then:      Vec<Self>,
        /// Run when the value is null
        otherwise: Vec<Self>,
    },
    /// Branch on an optional, binding its content when present
    IfPresent {
        /// Optional tested
        optional:  ValueExpr,
        /// Binding for the content
        inner:     LocalId,
        /// Run when the optional holds a value
        then:      Vec<Self>,
        /// Run when the optional is empty
        otherwise: Vec<Self>,
    },
    /// Run `body` once per element of an array or collection
    ForEachElement {
        /// Array or collection iterated
        iterable: ValueExpr,
        /// Binding for the current element
        element:  LocalId,
        /// Statements run per element
        body:     Vec<Self>,
    },
    /// Run `body` once per map entry
    ForEachEntry {
        /// Map iterated
        map:   ValueExpr,
        /// Binding for the entry key
        key:   LocalId,
        /// Binding for the entry value
        value: LocalId,
        /// Statements run per entry
        body:  Vec<Self>,
    },
    /// Delegate a non-null value to the function generated for `class`
    CallObject {
        /// Class whose function is called
        class: ClassName,
        /// Value handed over
        value: ValueExpr,
    },
    /// Hand a value to the generic reflective leaf writer
    WriteUnhandled {
        /// Value handed over
        value:         ValueExpr,
        /// Type the value was declared with
        declared_type: TypeDescriptor,
    },
}

impl Stmt {
    /// Visit this statement and every nested one
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::IfNotNull {
                then, otherwise, ..
            }
            | Self::IfPresent {
                then, otherwise, ..
            } => {
                for stmt in then.iter().chain(otherwise) {
                    stmt.walk(visit);
                }
            }
            Self::ForEachElement { body, .. } | Self::ForEachEntry { body, .. } => {
                for stmt in body {
                    stmt.walk(visit);
                }
            }
            _ => {}
        }
    }
}

/// Serialization routine for one object type
///
/// The function receives a non-null value of `class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectFunction {
    /// Class this function writes
    pub class: ClassName,
    /// Statements writing one value, enclosing braces included
    pub body:  Vec<Stmt>,
}

/// The complete IR of one serializer unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitIr {
    /// Statements run against the (non-null) root value
    pub entry:     Vec<Stmt>,
    /// One function per object type reached, in discovery order
    pub functions: Vec<ObjectFunction>,
}

impl UnitIr {
    /// The function generated for `class`, if any
    #[must_use]
    pub fn function(&self, class: &ClassName) -> Option<&ObjectFunction> {
        self.functions.iter().find(|function| &function.class == class)
    }

    /// Every statement in the unit, depth first
    #[must_use]
    pub fn statements(&self) -> Vec<&Stmt> {
        let mut all = Vec::new();
        let blocks = std::iter::once(&self.entry).chain(self.functions.iter().map(|f| &f.body));
        for block in blocks {
            for stmt in block {
                stmt.walk(&mut |s| all.push(s));
            }
        }
        all
    }

    /// Number of leaves handed to the reflective writer
    #[must_use]
    pub fn unhandled_count(&self) -> usize {
        self.statements()
            .into_iter()
            .filter(|stmt| matches!(stmt, Stmt::WriteUnhandled { .. }))
            .count()
    }

    /// Constant keys written by the function for `class`, in emission order
    #[must_use]
    pub fn keys_of(&self, class: &ClassName) -> Vec<&str> {
        let Some(function) = self.function(class) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        for stmt in &function.body {
            stmt.walk(&mut |s| {
                if let Stmt::WriteKey(key) = s {
                    keys.push(key.as_str());
                }
            });
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_expr_display() {
        let expr = ValueExpr::Root
            .cast(ClassName::from("com.acme.Circle"))
            .getter("getRadius");
        assert_eq!(expr.to_string(), "((com.acme.Circle) value).getRadius()");
    }

    #[test]
    fn test_walk_reaches_nested_statements() {
        let ir = UnitIr {
            entry:     vec![Stmt::CallObject {
                class: ClassName::from("com.acme.Item"),
                value: ValueExpr::Root,
            }],
            functions: vec![ObjectFunction {
                class: ClassName::from("com.acme.Item"),
                body:  vec![
                    Stmt::BeginObject,
                    Stmt::Let {
                        local: LocalId(0),
                        value: ValueExpr::Root.getter("getTag"),
                    },
                    Stmt::IfNotNull {
                        value:     ValueExpr::Local(LocalId(0)),
                        then:      vec![
                            Stmt::WriteKey("tag".to_string()),
                            Stmt::WriteUnhandled {
                                value:         ValueExpr::Local(LocalId(0)),
                                declared_type: TypeDescriptor::class("com.acme.Tag"),
                            },
                        ],
                        otherwise: Vec::new(),
                    },
                    Stmt::EndObject,
                ],
            }],
        };

        assert_eq!(ir.unhandled_count(), 1);
        assert_eq!(ir.keys_of(&ClassName::from("com.acme.Item")), vec!["tag"]);
        assert_eq!(ir.statements().len(), 7);
    }
}
