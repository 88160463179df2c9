use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::error::ToolError;
use crate::util::{as_finite_f64, as_object};

const LABEL_SCHEMA_VERSION: i64 = 1;
const OVERALL_KEY: &str = "overall";

#[derive(Debug, Clone)]
pub(super) struct LabelRecord {
    pub(super) chapter: u32,
    pub(super) line: usize,
    pub(super) human_overall: f64,
    /// Every finite numeric human score except `overall`.
    pub(super) human_dimensions: BTreeMap<String, f64>,
}

pub(super) fn load_labels(path: &Path) -> Result<BTreeMap<u32, LabelRecord>> {
    let raw = fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::invalid(format!("labels file not found: {}", path.display()))
        } else {
            ToolError::invalid(format!("failed to read labels file {}: {err}", path.display()))
        }
    })?;

    parse_labels(&raw, &path.display().to_string())
}

/// Parses label JSONL; `origin` only appears in error messages.
pub(super) fn parse_labels(raw: &str, origin: &str) -> Result<BTreeMap<u32, LabelRecord>> {
    let mut labels = BTreeMap::<u32, LabelRecord>::new();

    for (index, raw_line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = parse_label_line(line, origin, line_no)?;
        if let Some(existing) = labels.get(&record.chapter) {
            return Err(ToolError::invalid(format!(
                "duplicate chapter {} in labels (lines {} and {})",
                record.chapter, existing.line, line_no
            ))
            .into());
        }
        labels.insert(record.chapter, record);
    }

    if labels.is_empty() {
        return Err(ToolError::invalid("labels file has no records").into());
    }

    Ok(labels)
}

fn parse_label_line(line: &str, origin: &str, line_no: usize) -> Result<LabelRecord, ToolError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|err| ToolError::invalid(format!("invalid JSONL at {origin}:{line_no}: {err}")))?;
    let Value::Object(object) = value else {
        return Err(ToolError::invalid(format!(
            "JSONL record must be an object at {origin}:{line_no}"
        )));
    };

    let chapter = object
        .get("chapter")
        .and_then(Value::as_u64)
        .filter(|chapter| *chapter >= 1)
        .and_then(|chapter| u32::try_from(chapter).ok())
        .ok_or_else(|| {
            ToolError::invalid(format!("labels record missing valid chapter at {origin}:{line_no}"))
        })?;

    let schema_version = object.get("schema_version");
    if !is_supported_schema_version(schema_version) {
        let actual = schema_version
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string());
        return Err(ToolError::invalid(format!(
            "unsupported schema_version at {origin}:{line_no} \
             (expected {LABEL_SCHEMA_VERSION}, got {actual})"
        )));
    }

    let human_scores = as_object(object.get("human_scores"));
    let human_overall = human_scores
        .and_then(|scores| as_finite_f64(scores.get(OVERALL_KEY)))
        .ok_or_else(|| {
            ToolError::invalid(format!(
                "labels record missing human_scores.overall at {origin}:{line_no}"
            ))
        })?;

    let human_dimensions = human_scores
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != OVERALL_KEY)
        .filter_map(|(key, value)| as_finite_f64(Some(value)).map(|score| (key.clone(), score)))
        .collect();

    Ok(LabelRecord {
        chapter,
        line: line_no,
        human_overall,
        human_dimensions,
    })
}

fn is_supported_schema_version(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(number)) => number.as_f64() == Some(LABEL_SCHEMA_VERSION as f64),
        _ => false,
    }
}
