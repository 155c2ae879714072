//! Document Loading
//!
//! Reads JSON documents by repository-relative path. No resolution, no
//! validation and no caching happen here; callers that need memoization keep
//! their own.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{CorpusError, Result};

/// A parsed schema or sample document
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    /// Repository-relative path the document was loaded from
    pub path: PathBuf,
    /// Declared top-level `$id`, if any
    pub id: Option<String>,
    /// Parsed content
    pub content: Value,
}

impl SchemaDocument {
    /// Wrap an already parsed value, picking up its `$id`
    pub fn new(path: impl Into<PathBuf>, content: Value) -> Self {
        let id = content
            .get("$id")
            .and_then(Value::as_str)
            .map(String::from);
        Self {
            path: path.into(),
            id,
            content,
        }
    }

    /// File name of the document, used in console output
    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads documents relative to a repository root
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
}

impl DocumentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root all paths are joined onto
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and parse the document at `path`
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = path.as_ref();
        let full = self.root.join(path);
        debug!(path = %path.display(), "loading document");

        let text = fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CorpusError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => CorpusError::Io(e),
        })?;

        let content: Value = serde_json::from_str(&text).map_err(|source| CorpusError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(SchemaDocument::new(path, content))
    }
}
