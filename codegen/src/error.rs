//! Error type shared by every stage of generation

use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";

/// Result type for the `jsonb_codegen` library
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Error categories raised while generating serializers
#[derive(Error)]
pub enum Error {
    /// A root class absent from the type index
    #[error("Class not found in type index: {class_name}")]
    ClassNotFound {
        /// Fully-qualified name that was looked up
        class_name: String,
    },

    /// Invalid settings or command-line arguments
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading an input or writing generated output failed
    #[error("File operation failed: {0}")]
    FileOperation(String),

    /// Generation disagreed with an earlier support decision
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// A type signature in the index did not parse
    #[error("Invalid type signature `{signature}`: {reason}")]
    InvalidTypeSignature {
        /// The signature as written
        signature: String,
        /// Parser diagnostic
        reason:    String,
    },

    /// A unit could not be lowered by a backend
    #[error("Backend lowering failed: {0}")]
    Lowering(String),

    /// A host value did not match its declared shape at runtime
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The type index is malformed
    #[error("Type index error: {0}")]
    TypeIndex(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassNotFound { class_name } => f
                .debug_struct("ClassNotFound")
                .field("class_name", class_name)
                .finish(),
            Self::Configuration(s) => f.debug_tuple("Configuration").field(s).finish(),
            Self::FileOperation(s) => f.debug_tuple("FileOperation").field(s).finish(),
            Self::InternalConsistency(s) => f.debug_tuple("InternalConsistency").field(s).finish(),
            Self::InvalidTypeSignature { signature, reason } => f
                .debug_struct("InvalidTypeSignature")
                .field("signature", signature)
                .field("reason", reason)
                .finish(),
            Self::Lowering(s) => f.debug_tuple("Lowering").field(s).finish(),
            Self::Serialization(s) => f.debug_tuple("Serialization").field(s).finish(),
            Self::TypeIndex(s) => f.debug_tuple("TypeIndex").field(s).finish(),
        }
    }
}

impl Error {
    /// Create a "Failed to X" file error
    #[must_use]
    pub fn io_failed(
        operation: &str,
        path: &std::path::Path,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::FileOperation(format!(
            "{MSG_FAILED_TO_PREFIX} {operation} {}: {error}",
            path.display()
        ))
    }

    /// Create an "Invalid X" configuration error
    #[must_use]
    pub fn invalid_config(what: &str, details: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create a class lookup error
    #[must_use]
    pub fn class_not_found(class_name: impl std::fmt::Display) -> Self {
        Self::ClassNotFound {
            class_name: class_name.to_string(),
        }
    }

    /// Create an error for a probe/generate disagreement
    #[must_use]
    pub fn generator_mismatch(what: &str, owner: impl std::fmt::Display) -> Self {
        Self::InternalConsistency(format!(
            "Could not generate serializer for {what} of type {owner} after support was reported"
        ))
    }

    /// Create an error for a runtime value that does not match the declared shape
    #[must_use]
    pub fn shape_mismatch(expected: &str, found: &serde_json::Value) -> Self {
        Self::Serialization(format!("expected {expected}, found `{found}`"))
    }
}
