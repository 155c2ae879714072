//! Validation Engine Glue
//!
//! Compiles schema documents with the `jsonschema` crate and runs them against
//! samples. The engine evaluates keywords; this module only feeds it the
//! preloaded definitions and a [`ReferenceLoader`] for everything else.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, SchemaResolver, SchemaResolverError, ValidationError};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::audit::collect_refs;
use crate::config::CorpusConfig;
use crate::document::{DocumentLoader, SchemaDocument};
use crate::error::{CorpusError, Result};
use crate::registry::SchemaRegistry;
use crate::resolver::RefResolver;
use crate::retrieve::{CorpusRetriever, ReferenceLoader};

/// A single validation violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the offending value in the sample
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that rejected it
    pub schema_path: String,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Outcome of running one validator against one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Pass,
    Fail(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, ValidationResult::Pass)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Pass => &[],
            ValidationResult::Fail(violations) => violations,
        }
    }
}

/// Adapts any [`ReferenceLoader`] to the engine's resolver interface
pub struct EngineResolver<L> {
    loader: L,
}

impl<L: ReferenceLoader> EngineResolver<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

impl<L: ReferenceLoader> SchemaResolver for EngineResolver<L> {
    fn resolve(
        &self,
        _root_schema: &Value,
        url: &Url,
        original_reference: &str,
    ) -> std::result::Result<Arc<Value>, SchemaResolverError> {
        load_reference(&self.loader, original_reference, url.as_str()).map_err(Into::into)
    }
}

/// Load the document behind a reference.
///
/// The reference as written is classified first. `joined`, the reference
/// joined onto its document's base URI, is only a fallback for refs that need
/// an absolute `$id` base. When neither classifies, the error names the
/// written form.
fn load_reference<L: ReferenceLoader + ?Sized>(loader: &L, written: &str, joined: &str) -> Result<Arc<Value>> {
    match loader.resolve_and_load(written) {
        Ok(document) => Ok(document),
        Err(first @ CorpusError::UnsupportedReference { .. }) => match loader.resolve_and_load(joined) {
            Ok(document) => Ok(document),
            Err(CorpusError::UnsupportedReference { .. }) => Err(first),
            Err(other) => Err(other),
        },
        Err(other) => Err(other),
    }
}

/// Base URI the engine assumes for documents without an `$id`
const DEFAULT_BASE: &str = "json-schema:///";

fn document_base(document: &Value, fallback: &Url) -> Url {
    document
        .get("$id")
        .and_then(Value::as_str)
        .and_then(|id| fallback.join(id).ok())
        .unwrap_or_else(|| fallback.clone())
}

/// Resolve every external reference reachable from `schema`, transitively,
/// and check that each fragment pointer lands on something.
///
/// The engine only follows a `$ref` when a sample reaches it, so without this
/// pass a broken reference on an untaken branch would go unnoticed.
fn resolve_eagerly<L: ReferenceLoader + ?Sized>(loader: &L, schema: &SchemaDocument) -> Result<()> {
    let compilation = |reason: String| CorpusError::SchemaCompilation {
        schema: schema.path.clone(),
        reason,
    };

    let root_base = Url::parse(DEFAULT_BASE).map_err(|e| compilation(e.to_string()))?;
    let mut pending = vec![(document_base(&schema.content, &root_base), Arc::new(schema.content.clone()))];
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(pending[0].0.as_str().to_string());

    while let Some((base, document)) = pending.pop() {
        let mut refs = Vec::new();
        collect_refs(&document, &mut refs);

        for reference in refs {
            let mut target = base.join(&reference).unwrap_or_else(|_| base.clone());
            target.set_fragment(None);

            let loaded = load_reference(loader, &reference, target.as_str())?;

            if let Some((_, fragment)) = reference.split_once('#') {
                if fragment.starts_with('/') && loaded.pointer(fragment).is_none() {
                    return Err(compilation(format!("{reference}: no such fragment in referenced document")));
                }
            }

            let nested_base = document_base(&loaded, &target);
            if visited.insert(nested_base.as_str().to_string()) {
                pending.push((nested_base, loaded));
            }
        }
    }

    debug!(schema = %schema.path.display(), documents = visited.len(), "resolved references");
    Ok(())
}

/// Shared, read-only state every compilation needs.
///
/// Built once per process; the registry is only ever read after construction.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    registry: Arc<SchemaRegistry>,
    resolver: RefResolver,
    loader: DocumentLoader,
    validate_formats: bool,
}

impl ValidationContext {
    pub fn new(registry: SchemaRegistry, resolver: RefResolver, loader: DocumentLoader) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver,
            loader,
            validate_formats: true,
        }
    }

    /// Build the loader and resolver from configuration and preload the definitions
    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        let loader = DocumentLoader::new(config.repository_root());
        let resolver = config.resolver();
        let registry = SchemaRegistry::preload(&loader, &config.definitions)?;
        Ok(Self::new(registry, resolver, loader).with_format_validation(config.validation.validate_formats))
    }

    /// Whether `format` is asserted (default) or treated as an annotation
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &RefResolver {
        &self.resolver
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Compile `schema` into an executable validator
    pub fn compile(&self, schema: &SchemaDocument) -> Result<CompiledSchema> {
        let retriever = Arc::new(CorpusRetriever::new(
            Arc::clone(&self.registry),
            self.resolver.clone(),
            self.loader.clone(),
        ));

        let mut options = JSONSchema::options();
        options
            .with_draft(Draft::Draft202012)
            .should_validate_formats(self.validate_formats)
            .with_resolver(EngineResolver::new(Arc::clone(&retriever)));
        for (id, document) in self.registry.engine_documents() {
            options.with_document(id, document);
        }

        let validator = options
            .compile(&schema.content)
            .map_err(|e| engine_error(&schema.path, e))?;
        resolve_eagerly(retriever.as_ref(), schema)?;
        debug!(schema = %schema.path.display(), "compiled validator");

        Ok(CompiledSchema {
            path: schema.path.clone(),
            validator,
        })
    }
}

/// A compiled validator for one schema document
pub struct CompiledSchema {
    path: PathBuf,
    validator: JSONSchema,
}

impl CompiledSchema {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the validator, collecting every violation.
    ///
    /// Reference faults reported by the engine are schema faults, not sample
    /// failures, and are returned as errors.
    pub fn validate(&self, sample: &Value) -> Result<ValidationResult> {
        let errors = match self.validator.validate(sample) {
            Ok(()) => return Ok(ValidationResult::Pass),
            Err(errors) => errors,
        };

        let mut violations = Vec::new();
        for error in errors {
            if matches!(
                error.kind,
                ValidationErrorKind::Resolver { .. } | ValidationErrorKind::InvalidReference { .. }
            ) {
                return Err(engine_error(&self.path, error));
            }
            violations.push(Violation {
                instance_path: error.instance_path.to_string(),
                schema_path: error.schema_path.to_string(),
                message: error.to_string(),
            });
        }
        Ok(ValidationResult::Fail(violations))
    }
}

/// Map an engine error to a corpus error, recovering loader and resolver
/// failures raised inside our own callback.
fn engine_error(schema: &Path, error: ValidationError<'_>) -> CorpusError {
    let reason = error.to_string();
    match error.kind {
        ValidationErrorKind::Resolver { url, error } => match error.downcast::<CorpusError>() {
            Ok(inner) => inner,
            Err(other) => CorpusError::SchemaCompilation {
                schema: schema.to_path_buf(),
                reason: format!("failed to resolve {url}: {other}"),
            },
        },
        _ => CorpusError::SchemaCompilation {
            schema: schema.to_path_buf(),
            reason,
        },
    }
}
