//! Generator registry with memoized, cycle-aware support probing
//!
//! The registry walks [`GENERATOR_ORDER`] and picks the first variant whose probe does not
//! report `Unsupported`. Probing recurses through element, value and property types; a type
//! reached again while it is still being probed (a recursive type graph) is assumed supported.
//! Results computed under such an assumption are only cached once the type that introduced
//! the assumption has finished, so every cached entry is final.

use std::sync::Arc;

use dashmap::DashMap;

use super::support_level::{Support, UnsupportedReason};
use super::{GENERATOR_ORDER, GeneratorKind};
use crate::config::GlobalSerializationConfig;
use crate::error::Result;
use crate::inspector::Inspector;
use crate::type_descriptor::{PrimitiveType, TypeDescriptor, TypeKind};
use crate::type_index::TypeIndex;

/// Outcome of resolving a type against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The selected variant; `None` when no variant matched
    pub generator: Option<GeneratorKind>,
    /// Support reported by the selected variant
    pub support:   Support,
}

impl Resolution {
    const fn unsupported(reason: UnsupportedReason) -> Self {
        Self {
            generator: None,
            support:   Support::Unsupported(reason),
        }
    }
}

/// Ordered dispatch table from types to generator variants
pub struct GeneratorRegistry {
    inspector:   Arc<Inspector>,
    config:      Arc<GlobalSerializationConfig>,
    resolutions: DashMap<TypeDescriptor, Resolution>,
}

impl GeneratorRegistry {
    /// Empty registry over a shared inspector
    #[must_use]
    pub fn new(inspector: Arc<Inspector>, config: Arc<GlobalSerializationConfig>) -> Self {
        Self {
            inspector,
            config,
            resolutions: DashMap::new(),
        }
    }

    /// Inspector used for user classes
    #[must_use]
    pub fn inspector(&self) -> &Inspector { &self.inspector }

    /// Type index behind the inspector
    #[must_use]
    pub fn index(&self) -> &TypeIndex { self.inspector.index() }

    /// Global configuration of the build
    #[must_use]
    pub fn config(&self) -> &GlobalSerializationConfig { &self.config }

    /// Shared handle to the inspector
    #[must_use]
    pub const fn inspector_arc(&self) -> &Arc<Inspector> { &self.inspector }

    /// Shared handle to the configuration
    #[must_use]
    pub const fn config_arc(&self) -> &Arc<GlobalSerializationConfig> { &self.config }

    /// Probe a type
    ///
    /// # Errors
    ///
    /// Returns an error when a class referenced by `ty` cannot be inspected.
    pub fn supports(&self, ty: &TypeDescriptor) -> Result<Support> {
        Ok(self.resolve(ty)?.support)
    }

    /// The variant that serializes `ty`, only when it is supported
    ///
    /// # Errors
    ///
    /// Returns an error when a class referenced by `ty` cannot be inspected.
    pub fn corresponding_generator(&self, ty: &TypeDescriptor) -> Result<Option<GeneratorKind>> {
        let resolution = self.resolve(ty)?;
        Ok(resolution
            .generator
            .filter(|_| resolution.support.is_supported()))
    }

    /// The variant used for a property of type `ty`: its own generator when supported, the
    /// unhandled leaf writer when the type may be deferred, otherwise none
    ///
    /// # Errors
    ///
    /// Returns an error when a class referenced by `ty` cannot be inspected.
    pub fn generator_for_property(&self, ty: &TypeDescriptor) -> Result<Option<GeneratorKind>> {
        Ok(self
            .corresponding_generator(ty)?
            .or_else(|| self.is_deferrable(ty).then_some(GeneratorKind::Unhandled)))
    }

    /// Resolve a type from scratch (or from the cache)
    ///
    /// # Errors
    ///
    /// Returns an error when a class referenced by `ty` cannot be inspected.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Result<Resolution> { Probe::new(self).resolve(ty) }

    /// Whether `ty` may be written by the generic leaf writer when it has no generator
    ///
    /// Plain class references qualify unless the deferral policy is `none`. Arrays qualify
    /// under `classes-and-arrays` when their innermost element mentions no type variable or
    /// wildcard.
    #[must_use]
    pub fn is_deferrable(&self, ty: &TypeDescriptor) -> bool {
        let policy = self.config.deferral_policy;
        match ty {
            TypeDescriptor::Class(_) => policy.defers_classes(),
            TypeDescriptor::Array(_) => {
                policy.defers_arrays() && !ty.innermost_component().contains_unresolved()
            }
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Parameterized { .. }
            | TypeDescriptor::TypeVariable(_)
            | TypeDescriptor::Wildcard => false,
        }
    }
}

/// State of one probing walk
pub struct Probe<'a> {
    registry:          &'a GeneratorRegistry,
    /// Types currently being probed, outermost first
    in_progress:       Vec<TypeDescriptor>,
    /// Outermost in-progress position assumed supported since the innermost probe began
    lowest_assumption: Option<usize>,
}

impl<'a> Probe<'a> {
    const fn new(registry: &'a GeneratorRegistry) -> Self {
        Self {
            registry,
            in_progress: Vec::new(),
            lowest_assumption: None,
        }
    }

    /// Registry this walk resolves against
    #[must_use]
    pub const fn registry(&self) -> &'a GeneratorRegistry { self.registry }

    /// Resolve a nested type within this walk
    ///
    /// # Errors
    ///
    /// Returns an error when a class referenced by `ty` cannot be inspected.
    pub fn resolve(&mut self, ty: &TypeDescriptor) -> Result<Resolution> {
        if let Some(cached) = self.registry.resolutions.get(ty) {
            return Ok(cached.clone());
        }

        if let Some(position) = self.in_progress.iter().position(|t| t == ty) {
            tracing::trace!(type_name = %ty, "Recursive reference, assuming supported");
            self.lowest_assumption = Some(
                self.lowest_assumption
                    .map_or(position, |lowest| lowest.min(position)),
            );
            return Ok(Resolution {
                generator: Some(GeneratorKind::Object),
                support:   Support::Fully,
            });
        }

        let depth = self.in_progress.len();
        let outer_assumption = self.lowest_assumption.take();
        self.in_progress.push(ty.clone());
        let result = self.dispatch(ty);
        self.in_progress.pop();
        let inner_assumption = self.lowest_assumption.take();
        let resolution = result?;

        // Assumptions about this very type are settled now; older ones are still open
        let open_assumption = inner_assumption.filter(|&position| position < depth);
        if open_assumption.is_none() || !resolution.support.is_supported() {
            self.registry
                .resolutions
                .insert(ty.clone(), resolution.clone());
        }
        self.lowest_assumption = match (outer_assumption, open_assumption) {
            (Some(outer), Some(open)) => Some(outer.min(open)),
            (outer, open) => outer.or(open),
        };

        Ok(resolution)
    }

    fn dispatch(&mut self, ty: &TypeDescriptor) -> Result<Resolution> {
        let mut rejection = None;
        for kind in GENERATOR_ORDER {
            match kind.generator().supports(ty, self)? {
                Support::Unsupported(UnsupportedReason::NoMatchingGenerator) => {}
                Support::Unsupported(reason) => {
                    rejection.get_or_insert(reason);
                }
                support => {
                    tracing::trace!(type_name = %ty, generator = %kind, level = %support.level(), "Selected generator");
                    return Ok(Resolution {
                        generator: Some(kind),
                        support,
                    });
                }
            }
        }

        let reason = rejection.unwrap_or_else(|| unmatched_reason(ty));
        tracing::debug!(type_name = %ty, %reason, "No generator supports type");
        Ok(Resolution::unsupported(reason))
    }
}

/// Explain a type no variant claimed
fn unmatched_reason(ty: &TypeDescriptor) -> UnsupportedReason {
    match ty {
        TypeDescriptor::Primitive(PrimitiveType::Void) => UnsupportedReason::Void,
        TypeDescriptor::Class(name) if name.is_platform() => {
            UnsupportedReason::PlatformClass(name.clone())
        }
        _ if ty.kind() == TypeKind::Unresolved => UnsupportedReason::UnresolvedType(ty.clone()),
        _ => UnsupportedReason::GenericClass(ty.clone()),
    }
}
