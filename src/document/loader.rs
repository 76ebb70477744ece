//! Document loader
//!
//! Deserializes raw configuration text into one candidate tree. Input may
//! contain multiple YAML documents; the loader disambiguates by the
//! declared `version` marker.

use crate::error::{CompileError, Result};
use serde::Deserialize;
use serde_yaml::Value;

/// The configuration version this compiler understands.
pub const SUPPORTED_VERSION: u64 = 4;

/// Load raw configuration text into a single candidate document tree.
///
/// - Empty input (or input with no non-null document) fails with
///   [`CompileError::MissingConfiguration`].
/// - Exactly one document is returned as-is.
/// - With multiple documents, exactly one must declare `version: 4`;
///   otherwise the input is ambiguous.
pub fn load(text: &str) -> Result<Value> {
    let mut documents = Vec::new();
    for deserializer in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(deserializer).map_err(|e| CompileError::StructuralError {
            path: "<document>".to_string(),
            message: e.to_string(),
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }

    match documents.len() {
        0 => Err(CompileError::MissingConfiguration),
        1 => Ok(documents.into_iter().next().unwrap_or(Value::Null)),
        _ => select_versioned(documents),
    }
}

fn select_versioned(documents: Vec<Value>) -> Result<Value> {
    let mut matching: Vec<Value> = documents
        .into_iter()
        .filter(|doc| declared_version(doc) == Some(SUPPORTED_VERSION))
        .collect();

    match matching.len() {
        0 => Err(CompileError::AmbiguousConfiguration(format!(
            "multiple documents found but none declares version {}",
            SUPPORTED_VERSION
        ))),
        1 => Ok(matching.remove(0)),
        n => Err(CompileError::AmbiguousConfiguration(format!(
            "{} documents declare version {}, expected exactly one",
            n, SUPPORTED_VERSION
        ))),
    }
}

fn declared_version(doc: &Value) -> Option<u64> {
    doc.get("version").and_then(Value::as_u64)
}
