//! Output tree layout and script writing.
//!
//! ```text
//! <root>/00_<database>.sql
//! <root>/01_<schema>/00_<schema>.sql
//! <root>/01_<schema>/<order>_<type>/00_<object>.sql
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::descriptor::ObjectTypeDescriptor;
use crate::core::identifier::is_safe_path_segment;
use crate::error::{ReverseError, Result};

/// First line of every script: lets SnowSQL expand `&{VAR}` references.
pub const SCRIPT_PREAMBLE: &str = "!set variable_substitution=true;";

/// Computes artifact paths under a run root.
#[derive(Debug, Clone)]
pub struct LayoutPlanner {
    root: PathBuf,
}

impl LayoutPlanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/00_<database>.sql`
    pub fn database_file(&self, database: &str) -> Result<PathBuf> {
        let database = checked_segment(database)?;
        Ok(self.root.join(format!("00_{}.sql", database)))
    }

    /// `<root>/01_<schema>`
    pub fn schema_dir(&self, schema: &str) -> Result<PathBuf> {
        let schema = checked_segment(schema)?;
        Ok(self.root.join(format!("01_{}", schema)))
    }

    /// `<root>/01_<schema>/00_<schema>.sql`
    pub fn schema_file(&self, schema: &str) -> Result<PathBuf> {
        Ok(self.schema_dir(schema)?.join(format!("00_{}.sql", schema)))
    }

    /// `<root>/01_<schema>/<order>_<type>/00_<object>.sql`
    pub fn object_file(
        &self,
        schema: &str,
        descriptor: &ObjectTypeDescriptor,
        object: &str,
    ) -> Result<PathBuf> {
        let object = checked_segment(object)?;
        Ok(self
            .schema_dir(schema)?
            .join(descriptor.folder_name())
            .join(format!("00_{}.sql", object)))
    }

    /// Remove the root (if present) and recreate it empty.
    pub fn reset_root(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!("Removed previous output folder {:?}", self.root),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ReverseError::OutputRoot {
                    path: self.root.clone(),
                    source: e,
                })
            }
        }
        std::fs::create_dir_all(&self.root).map_err(|e| ReverseError::OutputRoot {
            path: self.root.clone(),
            source: e,
        })
    }
}

fn checked_segment(name: &str) -> Result<&str> {
    if is_safe_path_segment(name) {
        Ok(name)
    } else {
        Err(ReverseError::UnsafeObjectName(name.to_string()))
    }
}

/// Write one script: the preamble line, then the payload.
///
/// Returns `Ok(false)` without touching the file system when the payload
/// is empty. Parent directories are created on demand and an existing file
/// is overwritten. The content goes to a sibling `.tmp` file first and is
/// renamed into place, so a reader never sees a half-written script.
pub fn write_artifact(path: &Path, payload: &str) -> Result<bool> {
    if payload.is_empty() {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = format!("{}\n{}\n", SCRIPT_PREAMBLE, payload);
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    debug!("Wrote {:?}", path);
    Ok(true)
}
