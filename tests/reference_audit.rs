//! Reference audit over throwaway corpora

mod common;

use std::path::Path;

use serde_json::json;

use common::{context, corpus, write_json};
use corpus_schemas::{audit_references, CorpusError};

#[test]
fn test_clean_corpus() {
    let dir = corpus();
    let report = audit_references(&context(&dir)).unwrap();

    // defs/common, defs/objects, message, ws/presence
    assert_eq!(report.documents, 4);
    // objects -> common, message -> common x2 + objects, presence -> common
    assert_eq!(report.references, 5);
    assert!(report.is_clean(), "unexpected findings: {:?}", report.findings);
}

#[test]
fn test_unresolvable_references_are_all_reported() {
    let dir = corpus();
    write_json(
        dir.path(),
        "schemas/v0.1/broken.json",
        &json!({
            "properties": {
                "a": { "$ref": "common.json#/$defs/id" },
                "b": { "$ref": "./defs/absent.json" }
            }
        }),
    );

    let report = audit_references(&context(&dir)).unwrap();
    assert_eq!(report.findings.len(), 2);
    assert!(report
        .findings
        .iter()
        .all(|f| f.document == Path::new("schemas/v0.1/broken.json")));
    assert!(report
        .findings
        .iter()
        .any(|f| matches!(f.error, CorpusError::UnsupportedReference { .. })));
    assert!(report
        .findings
        .iter()
        .any(|f| matches!(f.error, CorpusError::FileNotFound { .. })));
}

#[test]
fn test_reference_cycle_is_reported() {
    let dir = corpus();
    write_json(
        dir.path(),
        "schemas/v0.1/tree-a.json",
        &json!({ "properties": { "b": { "$ref": "./tree-b.json" } } }),
    );
    write_json(
        dir.path(),
        "schemas/v0.1/tree-b.json",
        &json!({ "properties": { "a": { "$ref": "https://example.invalid/schemas/v0.1/tree-a.json" } } }),
    );

    let report = audit_references(&context(&dir)).unwrap();
    let cycles: Vec<_> = report
        .findings
        .iter()
        .filter_map(|f| match &f.error {
            CorpusError::ReferenceCycle { cycle } => Some(cycle.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(
        cycles,
        vec![vec![
            "schemas/v0.1/tree-a.json".to_string(),
            "schemas/v0.1/tree-b.json".to_string(),
        ]]
    );
}

#[test]
fn test_self_reference_is_a_cycle() {
    let dir = corpus();
    write_json(
        dir.path(),
        "schemas/v0.1/node.json",
        &json!({ "items": { "$ref": "./node.json" } }),
    );

    let report = audit_references(&context(&dir)).unwrap();
    assert_eq!(report.findings.len(), 1);
    assert!(matches!(report.findings[0].error, CorpusError::ReferenceCycle { .. }));
    assert_eq!(report.findings[0].document, Path::new("schemas/v0.1/node.json"));
}
