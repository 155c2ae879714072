//! Reference Loading
//!
//! The callback the validation engine uses whenever it meets a `$ref` it
//! cannot satisfy from its own store. Lookup order:
//!
//! 1. the preloaded [`SchemaRegistry`] (no I/O)
//! 2. documents already fetched for this validator
//! 3. [`RefResolver`] + [`DocumentLoader`]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::document::DocumentLoader;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::resolver::RefResolver;

/// Turns a reference string into the document it designates
pub trait ReferenceLoader: Send + Sync {
    fn resolve_and_load(&self, reference: &str) -> Result<Arc<Value>>;
}

impl<L: ReferenceLoader + ?Sized> ReferenceLoader for Arc<L> {
    fn resolve_and_load(&self, reference: &str) -> Result<Arc<Value>> {
        (**self).resolve_and_load(reference)
    }
}

/// [`ReferenceLoader`] backed by the corpus on disk.
///
/// One instance is created per compiled validator, so its cache lives exactly
/// as long as that validator.
pub struct CorpusRetriever {
    registry: Arc<SchemaRegistry>,
    resolver: RefResolver,
    loader: DocumentLoader,
    cache: Mutex<HashMap<PathBuf, Arc<Value>>>,
}

impl CorpusRetriever {
    pub fn new(registry: Arc<SchemaRegistry>, resolver: RefResolver, loader: DocumentLoader) -> Self {
        Self {
            registry,
            resolver,
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of documents fetched from disk so far
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl ReferenceLoader for CorpusRetriever {
    fn resolve_and_load(&self, reference: &str) -> Result<Arc<Value>> {
        if let Some(document) = self.registry.get(reference) {
            debug!(reference, "registry hit");
            return Ok(Arc::new(document.content.clone()));
        }

        let path = self.resolver.resolve(reference)?;

        // A poisoned lock only means another lookup panicked; the map is still usable.
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(document) = cache.get(&path) {
            debug!(reference, path = %path.display(), "cache hit");
            return Ok(Arc::clone(document));
        }

        let document = Arc::new(self.loader.load(&path)?.content);
        cache.insert(path, Arc::clone(&document));
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SchemaDocument;
    use crate::error::CorpusError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("schemas/v0.1/defs")).unwrap();
        fs::write(
            dir.path().join("schemas/v0.1/defs/common.json"),
            r#"{"$defs": {"uri": {"type": "string", "format": "uri"}}}"#,
        )
        .unwrap();
        dir
    }

    fn retriever(dir: &TempDir, registry: SchemaRegistry) -> CorpusRetriever {
        CorpusRetriever::new(
            Arc::new(registry),
            RefResolver::new("schemas/v0.1", "schemas/v0.1", "/schemas/v0.1/"),
            DocumentLoader::new(dir.path()),
        )
    }

    #[test]
    fn test_loads_from_disk_once() {
        let dir = corpus();
        let retriever = retriever(&dir, SchemaRegistry::new());

        let first = retriever.resolve_and_load("./defs/common.json#/$defs/uri").unwrap();
        assert_eq!(retriever.cached(), 1);

        // Remove the file: the second lookup must come from the cache.
        fs::remove_file(dir.path().join("schemas/v0.1/defs/common.json")).unwrap();
        let second = retriever
            .resolve_and_load("https://example.invalid/schemas/v0.1/defs/common.json")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_registry_checked_before_resolver() {
        let dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new();
        registry
            .register(SchemaDocument::new(
                "defs/privacy.json",
                json!({"$id": "urn:corpus:privacy", "type": "object"}),
            ))
            .unwrap();
        let retriever = retriever(&dir, registry);

        // Neither reference form matches, so only the registry can answer.
        let doc = retriever.resolve_and_load("urn:corpus:privacy#/x").unwrap();
        assert_eq!(doc["type"], "object");
        assert_eq!(retriever.cached(), 0);
    }

    #[test]
    fn test_unsupported_reference_propagates() {
        let dir = corpus();
        let retriever = retriever(&dir, SchemaRegistry::new());

        assert!(matches!(
            retriever.resolve_and_load("common.json"),
            Err(CorpusError::UnsupportedReference { .. })
        ));
    }
}
