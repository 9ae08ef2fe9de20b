//! # `jsonb_codegen`
//!
//! Ahead-of-time JSON serializer generation from class metadata.
//!
//! For every candidate root type the generator decides whether a fully static serialization
//! routine can be built. When it can, the routine is produced as a [`SerializerUnit`] whose
//! intermediate representation is lowered by a [`Backend`]: either executed directly by the
//! [`Interpreter`] or emitted as Rust source by the [`RustSourceBackend`]. Leaves that cannot
//! be handled statically are written by the [`ReflectiveSerializer`] at runtime, and the
//! [`GenerationManifest`] records which roots still depend on it.
//!
//! [`Backend`]: backend::Backend
//! [`Interpreter`]: backend::Interpreter
//! [`RustSourceBackend`]: backend::RustSourceBackend
//! [`ReflectiveSerializer`]: runtime::ReflectiveSerializer
//! [`GenerationManifest`]: driver::GenerationManifest
//! [`SerializerUnit`]: unit_builder::SerializerUnit

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod generator;
pub mod inspector;
pub mod ir;
pub mod logging;
pub mod runtime;
pub mod type_descriptor;
pub mod type_index;
pub mod unit_builder;
