//! Reference Resolution
//!
//! Maps `$ref` strings onto repository-relative document paths. Only the two
//! reference shapes the corpus actually produces are supported:
//!
//! ```text
//! ./defs/common.json#/$defs/uri                          -> <definitions_root>/defs/common.json
//! https://example.invalid/schemas/v0.1/defs/common.json  -> <corpus_root>/defs/common.json
//! ```
//!
//! Anything else is rejected. There is deliberately no base-URL algebra: a
//! relative reference always lands under the definitions root, no matter
//! which document it appears in.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{CorpusError, Result};

/// Same-directory marker that introduces a relative reference
pub const RELATIVE_MARKER: &str = "./";

/// How a reference string was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceForm {
    /// `./path[#fragment]`
    Relative,
    /// `<anything><root marker>path[#fragment]`
    Absolute,
}

/// Resolves reference strings to repository-relative paths
#[derive(Debug, Clone)]
pub struct RefResolver {
    /// Directory relative references are resolved against
    definitions_root: PathBuf,
    /// Directory the text after the root marker is resolved against
    corpus_root: PathBuf,
    /// Substring identifying the corpus root inside absolute identifiers
    root_marker: String,
}

impl RefResolver {
    pub fn new(
        definitions_root: impl Into<PathBuf>,
        corpus_root: impl Into<PathBuf>,
        root_marker: impl Into<String>,
    ) -> Self {
        Self {
            definitions_root: definitions_root.into(),
            corpus_root: corpus_root.into(),
            root_marker: root_marker.into(),
        }
    }

    pub fn definitions_root(&self) -> &Path {
        &self.definitions_root
    }

    pub fn corpus_root(&self) -> &Path {
        &self.corpus_root
    }

    pub fn root_marker(&self) -> &str {
        &self.root_marker
    }

    /// Classify `reference` and return the form plus the path tail it names
    pub fn classify<'r>(&self, reference: &'r str) -> Option<(ReferenceForm, &'r str)> {
        let location = reference.split('#').next().unwrap_or_default();

        if let Some(rest) = location.strip_prefix(RELATIVE_MARKER) {
            return Some((ReferenceForm::Relative, rest));
        }

        if !self.root_marker.is_empty() {
            if let Some(idx) = location.find(&self.root_marker) {
                return Some((ReferenceForm::Absolute, &location[idx + self.root_marker.len()..]));
            }
        }

        None
    }

    /// Resolve `reference` to the repository-relative path of its document.
    ///
    /// The fragment is discarded; pointer resolution inside the document is
    /// the validation engine's job.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let unsupported = || CorpusError::UnsupportedReference {
            reference: reference.to_string(),
        };

        let (form, tail) = self.classify(reference).ok_or_else(unsupported)?;

        let tail = Path::new(tail);
        let plain = tail.components().all(|c| matches!(c, Component::Normal(_)));
        if tail.as_os_str().is_empty() || !plain {
            return Err(unsupported());
        }

        let base = match form {
            ReferenceForm::Relative => &self.definitions_root,
            ReferenceForm::Absolute => &self.corpus_root,
        };
        let path = base.join(tail);
        debug!(reference, ?form, path = %path.display(), "resolved reference");
        Ok(path)
    }
}
