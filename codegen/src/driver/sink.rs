//! Registration sinks receiving the generated units

use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};

use super::GenerationManifest;
use crate::backend::{Backend, RustSourceBackend};
use crate::error::{Error, Result};
use crate::unit_builder::SerializerUnit;

/// File holding the serialized manifest
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Receives the result of a generation run
pub trait RegistrationSink {
    /// Register a generated unit
    ///
    /// # Errors
    ///
    /// Returns an error when the unit cannot be lowered or stored.
    fn register_unit(&mut self, unit: &SerializerUnit) -> Result<()>;

    /// Mark a type as serializable without runtime reflection
    ///
    /// # Errors
    ///
    /// Returns an error when the registration cannot be recorded.
    fn register_without_reflection(&mut self, type_name: &str) -> Result<()>;

    /// Called once after every unit was registered
    ///
    /// # Errors
    ///
    /// Returns an error when the manifest cannot be stored.
    fn finish(&mut self, manifest: &GenerationManifest) -> Result<()>;
}

/// Writes one Rust source file per unit and the manifest into a directory
pub struct FileSystemSink {
    out_dir: PathBuf,
    backend: RustSourceBackend,
    written: Vec<PathBuf>,
}

impl FileSystemSink {
    /// Create the sink, creating `out_dir` when missing
    ///
    /// # Errors
    ///
    /// Returns an error when `out_dir` cannot be created.
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir)
            .map_err(|e| Report::new(Error::io_failed("create output directory", &out_dir, e)))?;
        Ok(Self {
            out_dir,
            backend: RustSourceBackend,
            written: Vec::new(),
        })
    }

    /// Directory receiving the files
    #[must_use]
    pub fn out_dir(&self) -> &Path { &self.out_dir }

    /// Files written so far, in write order
    #[must_use]
    pub fn written(&self) -> &[PathBuf] { &self.written }

    /// Refuses a path already written by this sink, files from earlier runs are replaced
    fn write(&mut self, file_name: &str, contents: &str) -> Result<()> {
        let path = self.out_dir.join(file_name);
        if self.written.contains(&path) {
            return Err(Report::new(Error::io_failed(
                "write",
                &path,
                "file was already written in this run",
            )));
        }
        std::fs::write(&path, contents)
            .map_err(|e| Report::new(Error::io_failed("write", &path, e)))?;
        tracing::debug!(path = %path.display(), "Wrote generated file");
        self.written.push(path);
        Ok(())
    }
}

impl RegistrationSink for FileSystemSink {
    fn register_unit(&mut self, unit: &SerializerUnit) -> Result<()> {
        let source = self
            .backend
            .lower(unit)
            .attach(format!("Unit: {}", unit.id))?;
        self.write(&source.file_name, &source.code)
    }

    fn register_without_reflection(&mut self, type_name: &str) -> Result<()> {
        tracing::trace!(type_name, "Registered type without reflection");
        Ok(())
    }

    fn finish(&mut self, manifest: &GenerationManifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)
            .change_context(Error::Serialization("Failed to serialize manifest".to_string()))?;
        self.write(MANIFEST_FILE_NAME, &json)
    }
}
