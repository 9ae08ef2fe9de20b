//! Candidate root types taken from endpoint return types

use super::CandidateSource;
use crate::type_descriptor::{TypeDescriptor, TypeKind};
use crate::type_index::TypeIndex;

/// Candidates derived from the endpoints recorded in the type index
///
/// A plain class return type is a candidate itself. A collection return type contributes
/// its element class; the collection stays with the default serializer. Platform classes
/// (`java.lang` and the rest of `java.*`), primitives and everything else are left alone.
pub struct ReturnTypeCandidates<'a> {
    index: &'a TypeIndex,
}

impl<'a> ReturnTypeCandidates<'a> {
    /// Candidates of `index`
    #[must_use]
    pub const fn new(index: &'a TypeIndex) -> Self { Self { index } }
}

fn needs_serializer(ty: &TypeDescriptor) -> bool {
    matches!(ty, TypeDescriptor::Class(name) if !name.is_platform())
        && ty.kind() == TypeKind::PlainClass
}

impl CandidateSource for ReturnTypeCandidates<'_> {
    fn candidate_root_types(&self) -> Vec<TypeDescriptor> {
        self.index
            .endpoints()
            .iter()
            .filter_map(|endpoint| {
                let return_type = &endpoint.return_type;
                if needs_serializer(return_type) {
                    return Some(return_type.clone());
                }
                if return_type.kind() == TypeKind::Collection {
                    return return_type.element_type().filter(needs_serializer);
                }
                tracing::trace!(endpoint = %endpoint.name, %return_type, "Return type is not a candidate");
                None
            })
            .collect()
    }

    fn has_custom_contract_handler(&self) -> bool { self.index.custom_handlers().contract }

    fn has_custom_type_handler(&self, ty: &TypeDescriptor) -> bool {
        ty.class_name()
            .is_some_and(|name| self.index.custom_handlers().types.contains(name))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_candidates_from_return_types() {
        let index = TypeIndex::from_value(json!({
            "endpoints": [
                { "name": "person", "return_type": "com.acme.Person" },
                { "name": "people", "return_type": "java.util.List<com.acme.Address>" },
                { "name": "names", "return_type": "java.util.List<java.lang.String>" },
                { "name": "count", "return_type": "int" },
                { "name": "message", "return_type": "java.lang.String" },
                { "name": "lookup", "return_type": "java.util.Map<java.lang.String, com.acme.Person>" },
                { "name": "matrix", "return_type": "com.acme.Cell[]" },
            ],
            "custom_handlers": { "types": ["com.acme.Person"] },
        }))
        .expect("index should load");

        let source = ReturnTypeCandidates::new(&index);
        assert_eq!(source.candidate_root_types(), vec![
            TypeDescriptor::class("com.acme.Person"),
            TypeDescriptor::class("com.acme.Address"),
        ]);
        assert!(source.has_custom_type_handler(&TypeDescriptor::class("com.acme.Person")));
        assert!(!source.has_custom_type_handler(&TypeDescriptor::class("com.acme.Address")));
        assert!(!source.has_custom_contract_handler());
    }
}
