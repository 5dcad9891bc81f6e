//! Document import for knowledge bases.
//!
//! Input files hold one record per document, either as JSON Lines or as a
//! single JSON array. A record needs text under `content`, `text` or
//! `page_content`; `id`, `source` and `category` are optional and may also
//! sit inside a nested `metadata` object. Every other field is kept as
//! document metadata.

use crate::config;
use crate::types::{ImportStats, StoredDocument};
use groundwork_core::{AppError, AppResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

const CONTENT_KEYS: &[&str] = &["content", "text", "page_content"];

/// Import documents from `file` into a knowledge base.
///
/// Documents whose id already exists are replaced. With `reset`, the base is
/// emptied first. A base without a config file gets its preset written.
pub fn import_documents(
    workspace: &Path,
    base_name: &str,
    file: &Path,
    reset: bool,
) -> AppResult<ImportStats> {
    let start = Instant::now();
    tracing::info!("Importing {:?} into knowledge base '{}'", file, base_name);

    let raw = fs::read_to_string(file)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", file, e)))?;
    let fallback_source = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let incoming = parse_records(&raw, &fallback_source)?;

    if !config::get_config_path(workspace, base_name).exists() {
        config::save_config(workspace, &config::load_config(workspace, base_name)?)?;
    }

    let mut documents = if reset {
        tracing::info!("Resetting knowledge base '{}'", base_name);
        Vec::new()
    } else {
        load_documents(workspace, base_name)?
    };

    let imported = incoming.len();
    let mut replaced = 0;
    for document in incoming {
        match documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => {
                *existing = document;
                replaced += 1;
            }
            None => documents.push(document),
        }
    }

    write_documents(workspace, base_name, &documents)?;

    let duration = start.elapsed();
    tracing::info!(
        "Import completed: {} records ({} replaced), {} documents stored in {:.2}s",
        imported,
        replaced,
        documents.len(),
        duration.as_secs_f64()
    );

    Ok(ImportStats {
        base_name: base_name.to_string(),
        imported,
        replaced,
        total: documents.len(),
        duration_secs: duration.as_secs_f64(),
    })
}

/// Load the stored documents of a base; a base with no file has none.
pub fn load_documents(workspace: &Path, base_name: &str) -> AppResult<Vec<StoredDocument>> {
    let path = config::get_documents_path(workspace, base_name);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                AppError::Knowledge(format!("Corrupt document at {:?}:{}: {}", path, n + 1, e))
            })
        })
        .collect()
}

fn write_documents(
    workspace: &Path,
    base_name: &str,
    documents: &[StoredDocument],
) -> AppResult<()> {
    let path = config::get_documents_path(workspace, base_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = fs::File::create(&path)?;
    for document in documents {
        writeln!(out, "{}", serde_json::to_string(document)?)?;
    }
    Ok(())
}

fn parse_records(raw: &str, fallback_source: &str) -> AppResult<Vec<StoredDocument>> {
    let trimmed = raw.trim_start();
    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    AppError::Knowledge(format!("Invalid JSON on line {}: {}", n + 1, e))
                })
            })
            .collect::<AppResult<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(n, value)| match value {
            Value::Object(record) => to_document(record, fallback_source)
                .ok_or_else(|| {
                    AppError::Knowledge(format!(
                        "Record {} has no text under any of {:?}",
                        n + 1,
                        CONTENT_KEYS
                    ))
                }),
            other => Err(AppError::Knowledge(format!(
                "Record {} is not an object: {}",
                n + 1,
                other
            ))),
        })
        .collect()
}

fn to_document(mut record: Map<String, Value>, fallback_source: &str) -> Option<StoredDocument> {
    if let Some(Value::Object(nested)) = record.remove("metadata") {
        for (key, value) in nested {
            record.entry(key).or_insert(value);
        }
    }

    let content = CONTENT_KEYS
        .iter()
        .find_map(|key| match record.remove(*key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        })?;

    let id = match record.remove("id") {
        Some(Value::String(id)) => id,
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let source = take_string(&mut record, "source").unwrap_or_else(|| fallback_source.to_string());
    let category = take_string(&mut record, "category").unwrap_or_else(|| "Unknown".to_string());

    Some(StoredDocument {
        id,
        content,
        source,
        category,
        metadata: record,
    })
}

fn take_string(record: &mut Map<String, Value>, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
