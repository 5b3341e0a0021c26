//! loading of condition definition files and subject snapshots
//!
//! definition files hold either one definition (an object with a
//! `condition_type`) or an object of named definitions. files are read as
//! JSON, falling back to JSON5 for hand-written files with comments or
//! trailing commas.

use anyhow::{anyhow, Context, Result};
use serde_json::Value as JsonValue;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logic::{parse_condition, parse_definitions, ConditionLibrary};
use crate::subject::Subject;

const SUBJECT_ENV_VAR: &str = "LIFECOURSE_SUBJECT";

/// name given to a file holding a single definition when it has no file stem
const DEFAULT_NAME: &str = "condition";

/// resolve the subject file: explicit path, then LIFECOURSE_SUBJECT
pub fn get_subject_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }

    env::var(SUBJECT_ENV_VAR).map(PathBuf::from).map_err(|_| {
        anyhow!(
            "no subject given: pass --subject or set {}",
            SUBJECT_ENV_VAR
        )
    })
}

/// read a JSON or JSON5 document
pub fn read_document(path: &Path) -> Result<JsonValue> {
    if !path.exists() {
        return Err(anyhow!("file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;

    match serde_json::from_str(&content) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str(&content)
            .map_err(|_| anyhow!("invalid JSON in {}: {}", path.display(), json_err)),
    }
}

/// true when the document is a single definition rather than a named set
///
/// a library may hold a definition named `condition_type`; only a string
/// there marks a single definition
fn is_single_definition(doc: &JsonValue) -> bool {
    doc.get("condition_type").is_some_and(JsonValue::is_string)
}

fn single_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_NAME)
        .to_string()
}

/// load and build every definition in a file
pub fn load_definitions(path: &Path) -> Result<ConditionLibrary> {
    let doc = read_document(path)?;

    if is_single_definition(&doc) {
        let condition = parse_condition(&doc)
            .with_context(|| format!("invalid condition in {}", path.display()))?;
        let mut library = ConditionLibrary::new();
        library.insert(single_name(path), condition);
        return Ok(library);
    }

    parse_definitions(&doc).with_context(|| format!("invalid condition in {}", path.display()))
}

pub fn load_subject(path: &Path) -> Result<Subject> {
    let doc = read_document(path)?;
    serde_json::from_value(doc)
        .with_context(|| format!("failed to parse subject file: {}", path.display()))
}

/// Verify a definition file and return a list of errors
///
/// unlike [`load_definitions`], every named definition is built so all
/// problems are reported at once
pub fn verify(path: &Path) -> Result<Vec<String>> {
    let doc = read_document(path)?;
    let mut errors = Vec::new();

    if is_single_definition(&doc) {
        if let Err(e) = parse_condition(&doc) {
            errors.push(e.to_string());
        }
        return Ok(errors);
    }

    let obj = doc
        .as_object()
        .ok_or_else(|| anyhow!("expected an object of named definitions"))?;

    for (name, value) in obj {
        let mut single = serde_json::Map::new();
        single.insert(name.clone(), value.clone());
        if let Err(e) = parse_definitions(&JsonValue::Object(single)) {
            errors.push(e.to_string());
        }
    }

    Ok(errors)
}
