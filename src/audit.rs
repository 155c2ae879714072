//! Reference Audit
//!
//! Walks every schema document under the corpus root, resolves each external
//! `$ref` and checks that its target loads. The resulting document graph is
//! checked for cycles, which the validation engine cannot follow.
//!
//! Unlike a validation run, the audit does not stop at the first problem.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::engine::ValidationContext;
use crate::error::{CorpusError, Result};

/// A problem found by the audit
#[derive(Debug)]
pub struct Finding {
    /// Document the problem was found in
    pub document: PathBuf,
    /// Reference that failed, if the problem concerns a single `$ref`
    pub reference: Option<String>,
    pub error: CorpusError,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{} ({}): {}", self.document.display(), reference, self.error),
            None => write!(f, "{}: {}", self.document.display(), self.error),
        }
    }
}

/// Result of auditing the corpus
#[derive(Debug, Default)]
pub struct AuditReport {
    /// Schema documents walked
    pub documents: usize,
    /// External references seen
    pub references: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Every external `$ref` in `value`
pub fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(schema) => {
            if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
                if !reference.starts_with('#') {
                    refs.push(reference.to_string());
                }
            }
            for (keyword, child) in schema {
                match keyword.as_str() {
                    // Payloads are data, not subschemas.
                    "enum" | "const" | "examples" | "default" => {}
                    // Maps keyed by user-chosen names; every value is a subschema.
                    "properties" | "patternProperties" | "$defs" | "definitions" | "dependentSchemas" => {
                        if let Value::Object(named) = child {
                            for subschema in named.values() {
                                collect_refs(subschema, refs);
                            }
                        }
                    }
                    _ => collect_refs(child, refs),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

/// Repository-relative paths of every `.json` file under `dir`, sorted
fn schema_files(root: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root.join(dir)).sort_by_file_name() {
        let entry = entry.map_err(|e| CorpusError::Io(e.into()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Audit every schema document under the corpus root
pub fn audit_references(context: &ValidationContext) -> Result<AuditReport> {
    let loader = context.loader();
    let resolver = context.resolver();
    let files = schema_files(loader.root(), resolver.corpus_root())?;

    let mut report = AuditReport {
        documents: files.len(),
        ..AuditReport::default()
    };
    let mut graph: DiGraph<PathBuf, ()> = DiGraph::new();
    let mut nodes: HashMap<PathBuf, NodeIndex> = HashMap::new();
    let mut node = |graph: &mut DiGraph<PathBuf, ()>, path: &Path| {
        *nodes
            .entry(path.to_path_buf())
            .or_insert_with(|| graph.add_node(path.to_path_buf()))
    };

    for file in &files {
        let from = node(&mut graph, file.as_path());
        let document = match loader.load(file) {
            Ok(document) => document,
            Err(error) => {
                report.findings.push(Finding {
                    document: file.clone(),
                    reference: None,
                    error,
                });
                continue;
            }
        };

        let mut refs = Vec::new();
        collect_refs(&document.content, &mut refs);
        report.references += refs.len();

        for reference in refs {
            let target = match context.registry().get(&reference) {
                Some(definition) => Ok(definition.path.clone()),
                None => resolver
                    .resolve(&reference)
                    .and_then(|path| loader.load(&path).map(|_| path)),
            };

            match target {
                Ok(path) => {
                    debug!(from = %file.display(), to = %path.display(), "reference edge");
                    let to = node(&mut graph, path.as_path());
                    graph.update_edge(from, to, ());
                }
                Err(error) => report.findings.push(Finding {
                    document: file.clone(),
                    reference: Some(reference),
                    error,
                }),
            }
        }
    }

    for scc in kosaraju_scc(&graph) {
        let cyclic = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
        if !cyclic {
            continue;
        }
        let mut cycle: Vec<PathBuf> = scc.into_iter().map(|idx| graph[idx].clone()).collect();
        cycle.sort();
        report.findings.push(Finding {
            document: cycle[0].clone(),
            reference: None,
            error: CorpusError::ReferenceCycle {
                cycle: cycle.iter().map(|p| p.display().to_string()).collect(),
            },
        });
    }

    info!(
        documents = report.documents,
        references = report.references,
        findings = report.findings.len(),
        "reference audit complete"
    );
    Ok(report)
}
