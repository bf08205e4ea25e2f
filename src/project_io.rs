//! Project persistence.
//!
//! A saved project is a JSON envelope around the serialized
//! [`ProjectState`]:
//!
//! ```json
//! { "format": "graphsmith-project", "schema_version": 1, "project": { ... } }
//! ```
//!
//! The envelope is checked before the project body is decoded, so files
//! written by a newer release are rejected with [`ProjectIoError::SchemaVersion`]
//! instead of failing somewhere inside the body. Saving goes through a
//! temporary file in the destination directory which is then renamed over
//! the target, so a failed save never leaves a truncated project behind.

use crate::project::ProjectState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// Value of the envelope's `format` field
pub const FORMAT_MARKER: &str = "graphsmith-project";

/// Schema version written by this release
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ProjectIoError {
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported project schema version {found} (this release reads version {supported})")]
    SchemaVersion { found: u32, supported: u32 },

    #[error("Not a project file: {0}")]
    Format(String),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ProjectIoResult<T> = Result<T, ProjectIoError>;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'static str,
    schema_version: u32,
    project: &'a ProjectState,
}

#[derive(Deserialize)]
struct Envelope {
    project: ProjectState,
}

/// Serialize a project to pretty JSON text
pub fn serialize(project: &ProjectState) -> ProjectIoResult<String> {
    let envelope = EnvelopeRef {
        format: FORMAT_MARKER,
        schema_version: CURRENT_SCHEMA_VERSION,
        project,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse project text produced by [`serialize`]
pub fn deserialize(text: &str) -> ProjectIoResult<ProjectState> {
    let value: Value = serde_json::from_str(text)?;
    check_envelope(&value)?;
    let envelope: Envelope = serde_json::from_value(value)?;
    Ok(envelope.project)
}

fn check_envelope(value: &Value) -> ProjectIoResult<()> {
    let Some(object) = value.as_object() else {
        return Err(ProjectIoError::Format("expected a JSON object".to_string()));
    };
    match object.get("format").and_then(Value::as_str) {
        Some(FORMAT_MARKER) => {}
        Some(other) => return Err(ProjectIoError::Format(format!("unknown format {other:?}"))),
        None => return Err(ProjectIoError::Format("missing format marker".to_string())),
    }
    let found = object
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| ProjectIoError::Format("missing schema version".to_string()))?;
    let found = u32::try_from(found).unwrap_or(u32::MAX);
    if found == 0 || found > CURRENT_SCHEMA_VERSION {
        return Err(ProjectIoError::SchemaVersion {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    if !object.contains_key("project") {
        return Err(ProjectIoError::Format("missing project body".to_string()));
    }
    Ok(())
}

/// Write `project` to `path`, replacing any existing file atomically
pub fn save_to_file(project: &ProjectState, path: &Path) -> ProjectIoResult<()> {
    let text = serialize(project)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| ProjectIoError::Io {
        operation: "create directory",
        path: dir.to_path_buf(),
        source,
    })?;

    let io_error = |operation: &'static str| {
        move |source| ProjectIoError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error("create temporary file for"))?;
    file.write_all(text.as_bytes()).map_err(io_error("write"))?;
    file.as_file().sync_all().map_err(io_error("sync"))?;
    file.persist(path).map_err(|e| ProjectIoError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        rows = project.dataset.row_count(),
        transforms = project.transforms.len(),
        "Saved project to {}",
        path.display()
    );
    Ok(())
}

pub fn load_from_file(path: &Path) -> ProjectIoResult<ProjectState> {
    let text = fs::read_to_string(path).map_err(|source| ProjectIoError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source,
    })?;
    let project = deserialize(&text)?;
    info!(rows = project.dataset.row_count(), "Loaded project from {}", path.display());
    Ok(project)
}
