//! Unit identifiers for root types

use std::collections::HashSet;

use itertools::Itertools;

use crate::type_descriptor::TypeDescriptor;
use crate::type_descriptor::constants::UNIT_SUFFIX;
use crate::unit_builder::UnitId;

fn simple_name(ty: &TypeDescriptor) -> String {
    ty.class_name()
        .map_or_else(|| ty.to_string(), |name| name.simple_name().to_string())
}

fn mangled_name(ty: &TypeDescriptor) -> String {
    ty.class_name().map_or_else(
        || ty.to_string().replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        |name| name.mangled(),
    )
}

/// First id for `base` whose file stem is not taken yet, numbered from 2 on a clash
fn claim(prefix: &str, base: &str, taken: &mut HashSet<String>) -> UnitId {
    let plain = UnitId::new(format!("{prefix}{base}{UNIT_SUFFIX}"));
    if taken.insert(plain.file_stem()) {
        return plain;
    }
    (2_usize..)
        .map(|counter| UnitId::new(format!("{prefix}{base}{UNIT_SUFFIX}{counter}")))
        .find(|id| taken.insert(id.file_stem()))
        .unwrap_or(plain)
}

/// Assign `<prefix><SimpleName>Serializer` to every root
///
/// When several roots share a simple name, each of them uses its mangled fully-qualified name
/// instead. Ids whose file stems still clash, because mangling or lowercasing merged two
/// names, get a counter appended in root order.
#[must_use]
pub fn assign_unit_ids(roots: &[TypeDescriptor], prefix: &str) -> Vec<(TypeDescriptor, UnitId)> {
    let occurrences = roots.iter().map(simple_name).counts();
    let mut taken = HashSet::with_capacity(roots.len());

    roots
        .iter()
        .map(|root| {
            let simple = simple_name(root);
            let base = if occurrences.get(&simple).copied().unwrap_or_default() > 1 {
                tracing::debug!(root = %root, %simple, "Simple name collision, using mangled name");
                mangled_name(root)
            } else {
                simple
            };
            let id = claim(prefix, &base, &mut taken);
            if !id.simple_name().ends_with(UNIT_SUFFIX) {
                tracing::debug!(root = %root, unit = %id, "Unit id clash, numbered");
            }
            (root.clone(), id)
        })
        .collect()
}
