//! A newtype wrapper for fully-qualified class names
//!
//! Class names are dotted (`com.acme.model.Person`) and may contain `$` for nested
//! classes (`com.acme.Outer$Inner`).

use serde::{Deserialize, Serialize};

/// A fully-qualified class name used as the identity key for classes in the index,
/// the inspector cache and the generated manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    /// Get the underlying string reference
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Get the simple name (last segment after `.` and `$`)
    /// For example: `com.acme.Outer$Inner` returns `Inner`
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(&self.0)
    }

    /// Get the package portion, `None` for the default package
    #[must_use]
    pub fn package(&self) -> Option<&str> { self.0.rsplit_once('.').map(|(package, _)| package) }

    /// Whether the class lives in one of the platform namespaces (`java.*`, `javax.*`)
    #[must_use]
    pub fn is_platform(&self) -> bool { self.0.starts_with("java.") || self.0.starts_with("javax.") }

    /// The name with every separator replaced by `_`, usable as an identifier
    #[must_use]
    pub fn mangled(&self) -> String { self.0.replace(['.', '$'], "_") }
}

impl From<&str> for ClassName {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for ClassName {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&String> for ClassName {
    fn from(s: &String) -> Self { Self(s.clone()) }
}

impl From<ClassName> for String {
    fn from(name: ClassName) -> Self { name.0 }
}

impl std::borrow::Borrow<str> for ClassName {
    fn borrow(&self) -> &str { &self.0 }
}

impl std::fmt::Display for ClassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_segments() {
        let name = ClassName::from("com.acme.Outer$Inner");
        assert_eq!(name.simple_name(), "Inner");
        assert_eq!(name.package(), Some("com.acme"));
        assert_eq!(name.mangled(), "com_acme_Outer_Inner");
        assert!(!name.is_platform());

        let default_package = ClassName::from("Widget");
        assert_eq!(default_package.simple_name(), "Widget");
        assert_eq!(default_package.package(), None);
    }

    #[test]
    fn test_platform_detection() {
        assert!(ClassName::from("java.lang.String").is_platform());
        assert!(!ClassName::from("com.java.Widget").is_platform());
        assert!(ClassName::from("java.util.List").is_platform());
        assert!(ClassName::from("javax.money.MonetaryAmount").is_platform());
    }
}
