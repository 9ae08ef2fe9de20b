//! Canonical type representation used by every analysis stage
//!
//! A [`TypeDescriptor`] mirrors the shape of a declared type (primitive, class reference,
//! array, parameterized type, type variable, wildcard) without tying it to any reflection
//! API. [`TypeKind`] is the coarse classification the generator registry dispatches on.

mod class_name;
pub(crate) mod constants;
mod type_parser;

use std::fmt::Display;

pub use class_name::ClassName;
use constants::{
    BOXED_TYPES, COLLECTION_TYPES, MAP_TYPES, TYPE_OPTIONAL, TYPE_OPTIONAL_DOUBLE,
    TYPE_OPTIONAL_INT, TYPE_OPTIONAL_LONG,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
pub use type_parser::parse_type_signature;

use crate::error::Error;

/// Primitive (non-nullable) value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// UTF-16 code unit, written as a one-character string
    Char,
    /// No value
    Void,
}

impl PrimitiveType {
    /// Whether values of this primitive are written as JSON numbers
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }
}

/// Classification of a [`TypeDescriptor`] used for generator dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TypeKind {
    /// `int`, `boolean`, ...
    Primitive,
    /// `java.lang.Integer`, `java.math.BigDecimal`, ...
    Boxed,
    /// `T[]`
    Array,
    /// `List<T>`, `Set<T>`, ...
    Collection,
    /// `Map<K, V>`
    Map,
    /// `Optional<T>`, `OptionalInt`, ...
    Optional,
    /// Any other non-parameterized class reference
    PlainClass,
    /// A parameterized type that is not a known container
    Generic,
    /// Type variables and wildcards
    Unresolved,
}

/// Structural representation of a declared type
///
/// Immutable once constructed; cheap to clone and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    /// A primitive type
    Primitive(PrimitiveType),
    /// A non-parameterized class reference
    Class(ClassName),
    /// An array of the component type
    Array(Box<TypeDescriptor>),
    /// A parameterized class reference
    Parameterized {
        /// The raw (erased) class
        raw:       ClassName,
        /// The type arguments, in declaration order
        arguments: Vec<TypeDescriptor>,
    },
    /// A reference to a declared type parameter
    TypeVariable(String),
    /// `?`, `? extends X`, `? super X`
    Wildcard,
}

impl PartialOrd for PrimitiveType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

impl Ord for PrimitiveType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering { self.as_ref().cmp(other.as_ref()) }
}

impl TypeDescriptor {
    /// Shorthand for a class reference
    #[must_use]
    pub fn class(name: impl Into<ClassName>) -> Self { Self::Class(name.into()) }

    /// Shorthand for a parameterized class reference
    #[must_use]
    pub fn parameterized(raw: impl Into<ClassName>, arguments: Vec<Self>) -> Self {
        Self::Parameterized {
            raw: raw.into(),
            arguments,
        }
    }

    /// Shorthand for an array type
    #[must_use]
    pub fn array_of(component: Self) -> Self { Self::Array(Box::new(component)) }

    /// The erased class name, if this type refers to a class
    #[must_use]
    pub const fn class_name(&self) -> Option<&ClassName> {
        match self {
            Self::Class(name) | Self::Parameterized { raw: name, .. } => Some(name),
            Self::Primitive(_) | Self::Array(_) | Self::TypeVariable(_) | Self::Wildcard => None,
        }
    }

    /// Fully-qualified name of this type as it appears in signatures
    #[must_use]
    pub fn name(&self) -> String { self.to_string() }

    /// Classify this type for generator dispatch
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Primitive(_) => TypeKind::Primitive,
            Self::Array(_) => TypeKind::Array,
            Self::TypeVariable(_) | Self::Wildcard => TypeKind::Unresolved,
            Self::Class(name) => {
                let name = name.as_str();
                if BOXED_TYPES.contains(&name) {
                    TypeKind::Boxed
                } else if [TYPE_OPTIONAL_INT, TYPE_OPTIONAL_LONG, TYPE_OPTIONAL_DOUBLE]
                    .contains(&name)
                {
                    TypeKind::Optional
                } else {
                    TypeKind::PlainClass
                }
            }
            Self::Parameterized { raw, .. } => {
                let raw = raw.as_str();
                if COLLECTION_TYPES.contains(&raw) {
                    TypeKind::Collection
                } else if MAP_TYPES.contains(&raw) {
                    TypeKind::Map
                } else if raw == TYPE_OPTIONAL {
                    TypeKind::Optional
                } else {
                    TypeKind::Generic
                }
            }
        }
    }

    /// Element type of a collection, array or optional
    #[must_use]
    pub fn element_type(&self) -> Option<Self> {
        match (self, self.kind()) {
            (Self::Array(component), _) => Some((**component).clone()),
            (Self::Parameterized { arguments, .. }, TypeKind::Collection | TypeKind::Optional) => {
                arguments.first().cloned()
            }
            (Self::Class(name), TypeKind::Optional) => Some(Self::Primitive(
                match name.as_str() {
                    TYPE_OPTIONAL_INT => PrimitiveType::Int,
                    TYPE_OPTIONAL_LONG => PrimitiveType::Long,
                    _ => PrimitiveType::Double,
                },
            )),
            _ => None,
        }
    }

    /// Key type of a map
    #[must_use]
    pub fn key_type(&self) -> Option<&Self> {
        match (self, self.kind()) {
            (Self::Parameterized { arguments, .. }, TypeKind::Map) => arguments.first(),
            _ => None,
        }
    }

    /// Value type of a map
    #[must_use]
    pub fn value_type(&self) -> Option<&Self> {
        match (self, self.kind()) {
            (Self::Parameterized { arguments, .. }, TypeKind::Map) => arguments.get(1),
            _ => None,
        }
    }

    /// Innermost component of a (possibly nested) array
    #[must_use]
    pub fn innermost_component(&self) -> &Self {
        match self {
            Self::Array(component) => component.innermost_component(),
            other => other,
        }
    }

    /// Whether a type variable or wildcard appears anywhere in this type
    #[must_use]
    pub fn contains_unresolved(&self) -> bool {
        match self {
            Self::TypeVariable(_) | Self::Wildcard => true,
            Self::Array(component) => component.contains_unresolved(),
            Self::Parameterized { arguments, .. } => arguments.iter().any(Self::contains_unresolved),
            Self::Primitive(_) | Self::Class(_) => false,
        }
    }

    /// Whether the value can never be null
    #[must_use]
    pub const fn is_primitive(&self) -> bool { matches!(self, Self::Primitive(_)) }

    /// Rewrite class references naming one of `parameters` into type variables
    ///
    /// Signatures in the index are parsed without knowing which bare names are
    /// declared type parameters of the enclosing class.
    #[must_use]
    pub fn resolve_type_variables(self, parameters: &[String]) -> Self {
        if parameters.is_empty() {
            return self;
        }
        match self {
            Self::Class(name) if parameters.iter().any(|p| p == name.as_str()) => {
                Self::TypeVariable(name.into())
            }
            Self::Array(component) => {
                Self::Array(Box::new(component.resolve_type_variables(parameters)))
            }
            Self::Parameterized { raw, arguments } => Self::Parameterized {
                raw,
                arguments: arguments
                    .into_iter()
                    .map(|argument| argument.resolve_type_variables(parameters))
                    .collect(),
            },
            other => other,
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(f, "{primitive}"),
            Self::Class(name) => write!(f, "{name}"),
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Parameterized { raw, arguments } => {
                write!(f, "{raw}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ">")
            }
            Self::TypeVariable(name) => write!(f, "{name}"),
            Self::Wildcard => write!(f, "?"),
        }
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = Error;

    fn try_from(signature: String) -> Result<Self, Self::Error> { parse_type_signature(&signature) }
}

impl TryFrom<&str> for TypeDescriptor {
    type Error = Error;

    fn try_from(signature: &str) -> Result<Self, Self::Error> { parse_type_signature(signature) }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> Self { descriptor.to_string() }
}
