//! Support status types for generator probing
//!
//! [`UnsupportedReason`] plays the same role for probing that a structured error plays for
//! I/O: it is not a failure of the build, it is the explanation attached to a type that is
//! left to the reflective fallback. Reasons surface in debug logs and in the manifest.

use std::fmt::Display;

use serde::Serialize;

use crate::inspector::Impossibility;
use crate::type_descriptor::{ClassName, TypeDescriptor};

/// Tri-state outcome of probing a type, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportLevel {
    /// No static serializer can be built
    Unsupported,
    /// A static serializer can be built but some leaves use the reflective writer
    WithUnhandled,
    /// A static serializer with no residual reflection
    Fully,
}

impl SupportLevel {
    /// Whether a unit can be built at this level
    #[must_use]
    pub const fn is_supported(self) -> bool { !matches!(self, Self::Unsupported) }

    /// Whether some leaf is left to the reflective writer
    #[must_use]
    pub const fn needs_reflection(self) -> bool { matches!(self, Self::WithUnhandled) }
}

impl Display for SupportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "UNSUPPORTED"),
            Self::WithUnhandled => write!(f, "WITH_UNHANDLED"),
            Self::Fully => write!(f, "FULLY"),
        }
    }
}

/// Why no static serializer can be built for a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// The shape of the type is not handled by the probed variant
    NoMatchingGenerator,
    /// Type variables and wildcards have no static shape
    UnresolvedType(TypeDescriptor),
    /// Platform class without a dedicated generator
    PlatformClass(ClassName),
    /// Parameterized class that is not a known container
    GenericClass(TypeDescriptor),
    /// The class is referenced but absent from the type index
    MissingClass(ClassName),
    /// Inspection found the class unanalysable
    NotPossible {
        /// The class that was inspected
        class_name:    ClassName,
        /// What made inspection give up
        impossibility: Impossibility,
    },
    /// Container whose element or value type has no generator
    UnsupportedElement {
        /// The array, collection, map or optional
        container: TypeDescriptor,
        /// Why its element or value type is unsupported
        element:   Box<Self>,
    },
    /// Map whose key cannot be written as an object key
    UnsupportedMapKey {
        /// The map type
        map: TypeDescriptor,
        /// Its key type
        key: TypeDescriptor,
    },
    /// A property whose type is neither supported nor deferrable
    UnsupportedProperty {
        /// Class declaring the property
        owner:    ClassName,
        /// Output key of the property
        property: String,
        /// Why the property type is unsupported
        reason:   Box<Self>,
    },
    /// Primitive `void` is never a value
    Void,
}

impl UnsupportedReason {
    /// The innermost type responsible for the failure
    #[must_use]
    pub fn deepest_failing_type(&self) -> String {
        match self {
            Self::UnresolvedType(ty) | Self::GenericClass(ty) => ty.to_string(),
            Self::PlatformClass(name)
            | Self::MissingClass(name)
            | Self::NotPossible {
                class_name: name, ..
            } => name.to_string(),
            Self::UnsupportedMapKey { key, .. } => key.to_string(),
            Self::UnsupportedElement { element, .. } => element.deepest_failing_type(),
            Self::UnsupportedProperty { reason, .. } => reason.deepest_failing_type(),
            Self::Void => "void".to_string(),
            Self::NoMatchingGenerator => "unknown".to_string(),
        }
    }
}

impl Display for UnsupportedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedType(ty) => write!(f, "type `{ty}` is not resolved statically"),
            Self::PlatformClass(name) => write!(f, "platform class `{name}` has no generator"),
            Self::GenericClass(ty) => write!(f, "generic type `{ty}` has no generator"),
            Self::MissingClass(name) => write!(f, "class `{name}` is missing from the type index"),
            Self::NotPossible {
                class_name,
                impossibility,
            } => write!(f, "`{class_name}` cannot be inspected: {impossibility}"),
            Self::UnsupportedElement { container, element } => {
                write!(f, "`{container}` has an unsupported element: {element}")
            }
            Self::UnsupportedMapKey { map, key } => {
                write!(f, "`{map}` has key type `{key}` that cannot be an object key")
            }
            Self::UnsupportedProperty {
                owner,
                property,
                reason,
            } => write!(f, "property `{property}` of `{owner}`: {reason}"),
            Self::Void => write!(f, "void has no value"),
            Self::NoMatchingGenerator => write!(f, "no generator matches"),
        }
    }
}

/// Support level together with the reason when unsupported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Support {
    /// A static serializer with no residual reflection
    Fully,
    /// A static serializer with reflectively written leaves
    WithUnhandled,
    /// No static serializer, with the reason
    Unsupported(UnsupportedReason),
}

impl Support {
    /// The level without the reason
    #[must_use]
    pub const fn level(&self) -> SupportLevel {
        match self {
            Self::Fully => SupportLevel::Fully,
            Self::WithUnhandled => SupportLevel::WithUnhandled,
            Self::Unsupported(_) => SupportLevel::Unsupported,
        }
    }

    /// Whether a unit can be built
    #[must_use]
    pub const fn is_supported(&self) -> bool { self.level().is_supported() }

    /// Why the type is unsupported
    #[must_use]
    pub const fn reason(&self) -> Option<&UnsupportedReason> {
        match self {
            Self::Unsupported(reason) => Some(reason),
            Self::Fully | Self::WithUnhandled => None,
        }
    }

    /// The weaker of two results; the first unsupported reason is kept
    #[must_use]
    pub fn weaker(self, other: Self) -> Self {
        if other.level() < self.level() {
            other
        } else {
            self
        }
    }
}

/// Aggregate the support of every required part of a composite type
///
/// - Any `Unsupported` part makes the whole `Unsupported`
/// - Else any `WithUnhandled` part makes the whole `WithUnhandled`
/// - Else `Fully`
///
/// Parts after the first `Unsupported` one are not consumed.
#[must_use]
pub fn aggregate_support(parts: impl IntoIterator<Item = Support>) -> Support {
    let mut aggregated = Support::Fully;
    for part in parts {
        aggregated = aggregated.weaker(part);
        if !aggregated.is_supported() {
            break;
        }
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(SupportLevel::Unsupported < SupportLevel::WithUnhandled);
        assert!(SupportLevel::WithUnhandled < SupportLevel::Fully);
        assert_eq!(aggregate_support(Vec::new()), Support::Fully);
    }

    #[test]
    fn test_aggregate_keeps_first_reason() {
        let first = UnsupportedReason::MissingClass(ClassName::from("com.acme.A"));
        let second = UnsupportedReason::MissingClass(ClassName::from("com.acme.B"));
        let aggregated = aggregate_support([
            Support::WithUnhandled,
            Support::Unsupported(first.clone()),
            Support::Fully,
            Support::Unsupported(second),
        ]);
        assert_eq!(aggregated, Support::Unsupported(first));
        assert_eq!(
            aggregate_support([Support::Fully, Support::WithUnhandled]).level(),
            SupportLevel::WithUnhandled
        );
    }

    #[test]
    fn test_aggregate_stops_at_first_unsupported() {
        let mut consumed = 0;
        let parts = [
            Support::WithUnhandled,
            Support::Unsupported(UnsupportedReason::Void),
            Support::Fully,
        ];
        let aggregated = aggregate_support(parts.into_iter().inspect(|_| consumed += 1));
        assert_eq!(aggregated, Support::Unsupported(UnsupportedReason::Void));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_deepest_failing_type() {
        let reason = UnsupportedReason::UnsupportedProperty {
            owner:    ClassName::from("com.acme.Order"),
            property: "lines".to_string(),
            reason:   Box::new(UnsupportedReason::UnsupportedElement {
                container: TypeDescriptor::parameterized("java.util.List", vec![
                    TypeDescriptor::TypeVariable("T".to_string()),
                ]),
                element:   Box::new(UnsupportedReason::UnresolvedType(
                    TypeDescriptor::TypeVariable("T".to_string()),
                )),
            }),
        };
        assert_eq!(reason.deepest_failing_type(), "T");
        assert!(reason.to_string().contains("property `lines` of `com.acme.Order`"));
    }
}
