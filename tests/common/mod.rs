//! Throwaway corpus builder shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use corpus_schemas::{DocumentLoader, RefResolver, SchemaRegistry, ValidationCase, ValidationContext};

pub const BASE: &str = "https://example.invalid/schemas/v0.1/";

pub const DEFINITIONS: &[&str] = &["schemas/v0.1/defs/common.json", "schemas/v0.1/defs/objects.json"];

pub fn write_json(root: &Path, relative: &str, value: &Value) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// A small corpus with two shared definition files, a schema using relative
/// refs and a schema using absolute refs on a different host.
pub fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write_json(
        root,
        "schemas/v0.1/defs/common.json",
        &json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": format!("{BASE}defs/common.json"),
            "$defs": {
                "id": { "type": "string", "minLength": 1 },
                "uri": { "type": "string", "format": "uri" }
            }
        }),
    );
    write_json(
        root,
        "schemas/v0.1/defs/objects.json",
        &json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": format!("{BASE}defs/objects.json"),
            "$defs": {
                "attachment": {
                    "type": "object",
                    "required": ["url"],
                    "properties": { "url": { "$ref": "./defs/common.json#/$defs/uri" } }
                }
            }
        }),
    );
    write_json(
        root,
        "schemas/v0.1/message.json",
        &json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": format!("{BASE}message.json"),
            "type": "object",
            "required": ["id", "link"],
            "properties": {
                "id": { "$ref": "./defs/common.json#/$defs/id" },
                "link": { "$ref": "./defs/common.json#/$defs/uri" },
                "attachments": {
                    "type": "array",
                    "items": { "$ref": "./defs/objects.json#/$defs/attachment" }
                }
            }
        }),
    );
    write_json(
        root,
        "schemas/v0.1/ws/presence.json",
        &json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["user"],
            "properties": {
                "user": { "$ref": "https://api.example.com/schemas/v0.1/defs/common.json#/$defs/id" }
            }
        }),
    );

    write_json(
        root,
        "tests/message.sample.json",
        &json!({
            "id": "msg_1",
            "link": "https://example.com/m/1",
            "attachments": [{ "url": "https://cdn.example.com/a.png" }]
        }),
    );
    write_json(root, "tests/ws-presence.sample.json", &json!({ "user": "usr_1" }));

    dir
}

pub fn message_case() -> ValidationCase {
    ValidationCase::new("tests/message.sample.json", "schemas/v0.1/message.json")
}

pub fn presence_case() -> ValidationCase {
    ValidationCase::new("tests/ws-presence.sample.json", "schemas/v0.1/ws/presence.json")
}

pub fn resolver() -> RefResolver {
    RefResolver::new("schemas/v0.1", "schemas/v0.1", "/schemas/v0.1/")
}

pub fn context(dir: &TempDir) -> ValidationContext {
    let loader = DocumentLoader::new(dir.path());
    let registry = SchemaRegistry::preload(&loader, DEFINITIONS).unwrap();
    ValidationContext::new(registry, resolver(), loader)
}

pub fn lines(buffer: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buffer).lines().map(String::from).collect()
}
