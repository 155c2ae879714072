//! Error types for corpus loading, resolution and validation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Corpus errors
///
/// Every variant is fatal for a run. A sample that fails its schema is not an
/// error; it is reported through [`crate::runner::RunOutcome::Failed`].
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Document not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported $ref: {reference}")]
    UnsupportedReference { reference: String },

    #[error("Duplicate schema identifier {id}: declared by {} and {}", .first.display(), .second.display())]
    DuplicateIdentifier {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Definition document {} declares no $id", .path.display())]
    MissingIdentifier { path: PathBuf },

    #[error("Schema compilation failed for {}: {reason}", .schema.display())]
    SchemaCompilation { schema: PathBuf, reason: String },

    #[error("Reference cycle: {}", .cycle.join(" -> "))]
    ReferenceCycle { cycle: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
