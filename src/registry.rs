//! Schema Registry
//!
//! Holds the shared definition documents, keyed by their declared `$id`.
//! Built once before any case runs and read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::document::{DocumentLoader, SchemaDocument};
use crate::error::{CorpusError, Result};

/// Registry of shared definition documents
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Documents in registration order
    documents: Vec<SchemaDocument>,
    /// Normalized identifier -> index into `documents`
    by_id: HashMap<String, usize>,
}

/// Normalize a schema identifier the way the validation engine keys its store.
///
/// Identifiers that parse as URLs lose their fragment; anything else only has a
/// trailing `#...` stripped.
pub fn normalize_id(id: &str) -> String {
    match Url::parse(id) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.into()
        }
        Err(_) => id.split('#').next().unwrap_or_default().to_string(),
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and register every path, in order.
    ///
    /// Either all definitions are registered or an error is returned; a
    /// partially populated registry never escapes.
    pub fn preload<P: AsRef<Path>>(loader: &DocumentLoader, paths: &[P]) -> Result<Self> {
        let mut registry = Self::new();
        for path in paths {
            let document = loader.load(path)?;
            registry.register(document)?;
        }
        info!(definitions = registry.len(), "preloaded shared definitions");
        Ok(registry)
    }

    /// Add a document under its declared identifier
    pub fn register(&mut self, document: SchemaDocument) -> Result<()> {
        let id = match &document.id {
            Some(id) => normalize_id(id),
            None => {
                return Err(CorpusError::MissingIdentifier {
                    path: document.path,
                })
            }
        };

        if let Some(&existing) = self.by_id.get(&id) {
            return Err(CorpusError::DuplicateIdentifier {
                id,
                first: self.documents[existing].path.clone(),
                second: document.path,
            });
        }

        debug!(%id, path = %document.path.display(), "registered definition");
        self.by_id.insert(id, self.documents.len());
        self.documents.push(document);
        Ok(())
    }

    /// Look up a document by identifier; any fragment is ignored
    pub fn get(&self, id: &str) -> Option<&SchemaDocument> {
        self.by_id
            .get(&normalize_id(id))
            .map(|&idx| &self.documents[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Registered documents in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.documents.iter()
    }

    /// `(identifier, content)` pairs to hand to the validation engine
    pub fn engine_documents(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.documents.iter().filter_map(|doc| {
            doc.id
                .as_deref()
                .map(|id| (normalize_id(id), doc.content.clone()))
        })
    }
}
