//! Root-type driver
//!
//! Turns the candidate root types of a build into serializer units and a manifest:
//!
//! 1. nothing happens when generation is disabled or a custom contract handler exists
//! 2. candidates are deduplicated and sorted
//! 3. candidates with a user-supplied serializer are skipped
//! 4. every remaining candidate is built, sequentially or on the blocking pool
//!
//! The outcome does not depend on the order in which concurrent builds finish.

mod candidates;
mod sink;
mod unit_naming;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub use candidates::ReturnTypeCandidates;
use error_stack::ResultExt;
use serde::Serialize;
pub use sink::{FileSystemSink, MANIFEST_FILE_NAME, RegistrationSink};
pub use unit_naming::assign_unit_ids;

use crate::config::GlobalSerializationConfig;
use crate::error::{Error, Result};
use crate::generator::GeneratorRegistry;
use crate::inspector::Inspector;
use crate::runtime::ReflectiveSerializer;
use crate::type_descriptor::TypeDescriptor;
use crate::type_index::TypeIndex;
use crate::unit_builder::{SerializerUnit, UnitBuilder, UnitId};

/// Supplies candidate root types and the custom-handler escape hatches
pub trait CandidateSource {
    /// Root types that may get a generated serializer; duplicates are allowed
    fn candidate_root_types(&self) -> Vec<TypeDescriptor>;

    /// A user-supplied handler owns the whole output contract
    fn has_custom_contract_handler(&self) -> bool;

    /// A user-supplied serializer exists for `ty`
    fn has_custom_type_handler(&self, ty: &TypeDescriptor) -> bool;
}

/// Why a candidate got no unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    /// Human-readable explanation
    pub reason:       String,
    /// The innermost type responsible
    pub failing_type: String,
}

/// Summary of a generation run, handed to the sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationManifest {
    /// Generation was enabled for the run
    pub enabled:                  bool,
    /// A custom contract handler suppressed generation
    pub contract_handler_present: bool,
    /// Root type name to unit id
    pub generated:                BTreeMap<String, UnitId>,
    /// Generated roots that need no reflection at runtime
    pub without_reflection:       Vec<String>,
    /// Generated roots with leaves written reflectively
    pub with_reflection:          Vec<String>,
    /// Root type name to the reason it got no unit
    pub not_generated:            BTreeMap<String, Exclusion>,
    /// Roots with a user-supplied serializer
    pub skipped_custom:           Vec<String>,
}

/// Units plus manifest of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Sorted by root type
    pub units:    Vec<SerializerUnit>,
    /// Summary of the run
    pub manifest: GenerationManifest,
}

/// Roots to build, already named
struct Plan {
    roots:    Vec<(TypeDescriptor, UnitId)>,
    manifest: GenerationManifest,
}

/// Drives unit generation over a shared registry
pub struct Driver {
    registry: Arc<GeneratorRegistry>,
}

impl Driver {
    /// Driver over `index` with a validated configuration
    #[must_use]
    pub fn new(index: Arc<TypeIndex>, config: GlobalSerializationConfig) -> Self {
        let inspector = Arc::new(Inspector::new(index));
        Self {
            registry: Arc::new(GeneratorRegistry::new(inspector, Arc::new(config))),
        }
    }

    /// The registry shared by every build of this driver
    #[must_use]
    pub fn registry(&self) -> &GeneratorRegistry { &self.registry }

    /// The configuration of this driver
    #[must_use]
    pub fn config(&self) -> &GlobalSerializationConfig { self.registry.config() }

    /// The reflective writer matching this driver's configuration
    #[must_use]
    pub fn reflective_serializer(&self) -> ReflectiveSerializer {
        ReflectiveSerializer::new(
            Arc::clone(self.registry.inspector_arc()),
            Arc::clone(self.registry.config_arc()),
        )
    }

    /// Build every candidate on the current thread
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a root class is missing from the type index
    /// - generation disagrees with the support decision for some type
    pub fn run(&self, source: &dyn CandidateSource) -> Result<GenerationOutcome> {
        let Some(plan) = self.plan(source) else {
            return Ok(self.inactive_outcome(source));
        };

        let builder = UnitBuilder::new(&self.registry);
        let mut built = Vec::with_capacity(plan.roots.len());
        for (root, id) in plan.roots {
            let unit = builder.build(&root, id)?;
            built.push((root, unit));
        }
        self.finish(plan.manifest, built)
    }

    /// Build every candidate on the blocking pool, one task per candidate
    ///
    /// Produces the same outcome as [`Self::run`].
    ///
    /// # Errors
    ///
    /// Returns an error as [`Self::run`] does, or when a generation task panics.
    pub async fn run_concurrent(&self, source: &dyn CandidateSource) -> Result<GenerationOutcome> {
        let Some(plan) = self.plan(source) else {
            return Ok(self.inactive_outcome(source));
        };

        let handles: Vec<_> = plan
            .roots
            .into_iter()
            .map(|(root, id)| {
                let registry = Arc::clone(&self.registry);
                tokio::task::spawn_blocking(move || {
                    let unit = UnitBuilder::new(&registry).build(&root, id);
                    (root, unit)
                })
            })
            .collect();

        let mut built = Vec::with_capacity(handles.len());
        for handle in handles {
            let (root, unit) = handle.await.change_context(Error::InternalConsistency(
                "Generation task did not complete".to_string(),
            ))?;
            built.push((root, unit?));
        }
        self.finish(plan.manifest, built)
    }

    /// Hand an outcome to a sink
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink.
    pub fn publish(outcome: &GenerationOutcome, sink: &mut dyn RegistrationSink) -> Result<()> {
        for unit in &outcome.units {
            sink.register_unit(unit)?;
        }
        for type_name in &outcome.manifest.without_reflection {
            sink.register_without_reflection(type_name)?;
        }
        sink.finish(&outcome.manifest)
    }

    fn inactive_outcome(&self, source: &dyn CandidateSource) -> GenerationOutcome {
        GenerationOutcome {
            units:    Vec::new(),
            manifest: GenerationManifest {
                enabled: self.config().enabled,
                contract_handler_present: self.config().enabled
                    && source.has_custom_contract_handler(),
                ..GenerationManifest::default()
            },
        }
    }

    fn plan(&self, source: &dyn CandidateSource) -> Option<Plan> {
        if !self.config().enabled {
            tracing::info!("Serializer generation is disabled");
            return None;
        }
        if source.has_custom_contract_handler() {
            tracing::info!("Custom contract handler declared, generating nothing");
            return None;
        }

        let candidates: BTreeSet<TypeDescriptor> =
            source.candidate_root_types().into_iter().collect();
        let mut manifest = GenerationManifest {
            enabled: true,
            ..GenerationManifest::default()
        };
        let (custom, roots): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|root| source.has_custom_type_handler(root));
        for root in custom {
            tracing::debug!(root = %root, "Skipping type with a custom serializer");
            manifest.skipped_custom.push(root.to_string());
        }

        Some(Plan {
            roots: assign_unit_ids(&roots, &self.config().unit_prefix),
            manifest,
        })
    }

    fn finish(
        &self,
        mut manifest: GenerationManifest,
        built: Vec<(TypeDescriptor, Option<SerializerUnit>)>,
    ) -> Result<GenerationOutcome> {
        let mut units = Vec::new();
        for (root, unit) in built {
            let type_name = root.to_string();
            match unit {
                Some(unit) => {
                    manifest.generated.insert(type_name.clone(), unit.id.clone());
                    if unit.needs_reflection() {
                        manifest.with_reflection.push(type_name);
                    } else {
                        manifest.without_reflection.push(type_name);
                    }
                    units.push(unit);
                }
                None => {
                    let support = self.registry.supports(&root)?;
                    let exclusion = support.reason().map_or_else(
                        || Exclusion {
                            reason:       "not generated".to_string(),
                            failing_type: type_name.clone(),
                        },
                        |reason| Exclusion {
                            reason:       reason.to_string(),
                            failing_type: reason.deepest_failing_type(),
                        },
                    );
                    manifest.not_generated.insert(type_name, exclusion);
                }
            }
        }

        tracing::info!(
            generated = manifest.generated.len(),
            without_reflection = manifest.without_reflection.len(),
            with_reflection = manifest.with_reflection.len(),
            not_generated = manifest.not_generated.len(),
            skipped_custom = manifest.skipped_custom.len(),
            "Serializer generation finished"
        );
        Ok(GenerationOutcome { units, manifest })
    }
}
