//! Corpus Schemas
//!
//! Resolves `$ref`s across a multi-file JSON Schema corpus and validates sample
//! documents against it, one case at a time, stopping at the first failure.
//!
//! ## Corpus Layout
//!
//! ```text
//! schemas/v0.1/
//! ├── defs/
//! │   ├── common.json      <- shared definitions, preloaded by $id
//! │   ├── objects.json
//! │   └── ...
//! ├── message.json         <- one schema per feature
//! └── ws/
//!     └── subscribe.json
//! tests/
//! ├── message.sample.json  <- one sample per case
//! └── ws-subscribe.sample.json
//! ```
//!
//! ## Flow
//!
//! ```text
//! ValidationRunner -> DocumentLoader (schema)
//!                  -> compile (engine -> SchemaRegistry -> RefResolver + DocumentLoader)
//!                  -> DocumentLoader (sample)
//!                  -> validate
//! ```

pub mod audit;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod retrieve;
pub mod runner;

pub use audit::{audit_references, AuditReport, Finding};
pub use config::CorpusConfig;
pub use document::{DocumentLoader, SchemaDocument};
pub use engine::{CompiledSchema, EngineResolver, ValidationContext, ValidationResult, Violation};
pub use error::{CorpusError, Result};
pub use registry::SchemaRegistry;
pub use resolver::{RefResolver, ReferenceForm};
pub use retrieve::{CorpusRetriever, ReferenceLoader};
pub use runner::{RunOutcome, ValidationCase, ValidationRunner};
