use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::CompareArgs;
use crate::error::ToolError;
use crate::model::{ComparisonReport, REPORT_SCHEMA_VERSION, RunDelta, RunReference};
use crate::util::{
    JsonObject, absolute_path, as_finite_f64, as_object, emit_report, load_json, now_utc_string,
    render_json_line, round_to, sha256_file,
};

const DIMENSION_DELTA_DIGITS: i32 = 6;
const CHAPTERS_TOTAL_NOTE: &str = "chapters_total differs; compare deltas with caution.";

pub fn run(args: CompareArgs) -> Result<()> {
    let summary_a = load_summary(&args.run_a)?;
    let summary_b = load_summary(&args.run_b)?;
    info!(
        run_a = %args.run_a.display(),
        run_b = %args.run_b.display(),
        "loaded run summaries"
    );

    let report = ComparisonReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: now_utc_string(),
        run_a: run_reference(&args.run_a, &summary_a)?,
        run_b: run_reference(&args.run_b, &summary_b)?,
        delta: run_delta(&summary_a, &summary_b),
        score_dimensions: dimension_mean_deltas(
            summary_a.get("score_dimensions"),
            summary_b.get("score_dimensions"),
        ),
        notes: comparison_notes(&summary_a, &summary_b),
    };
    for note in &report.notes {
        warn!(note = %note, "comparison caveat");
    }

    let rendered = render_json_line(&report)?;
    emit_report(&rendered, args.out.as_deref())?;

    if let Some(out) = &args.out {
        info!(path = %out.display(), "wrote comparison report");
    }
    Ok(())
}

fn load_summary(path: &Path) -> Result<JsonObject> {
    match load_json(path)? {
        Value::Object(object) => Ok(object),
        _ => Err(ToolError::invalid("both summaries must be JSON objects").into()),
    }
}

fn run_reference(path: &Path, summary: &JsonObject) -> Result<RunReference> {
    let summary_path = absolute_path(path);
    let dir = summary_path
        .parent()
        .map(|parent| parent.display().to_string())
        .unwrap_or_default();

    Ok(RunReference {
        dir,
        summary_path: summary_path.display().to_string(),
        run_id: summary.get("run_id").cloned().unwrap_or(Value::Null),
        sha256: sha256_file(path)?,
    })
}

fn run_delta(a: &JsonObject, b: &JsonObject) -> RunDelta {
    let empty = JsonObject::new();
    let compliance_a = as_object(a.get("compliance")).unwrap_or(&empty);
    let compliance_b = as_object(b.get("compliance")).unwrap_or(&empty);
    let score_a = as_object(a.get("score_overall")).unwrap_or(&empty);
    let score_b = as_object(b.get("score_overall")).unwrap_or(&empty);

    let field = |left: &JsonObject, right: &JsonObject, key: &str| {
        delta_number(left.get(key), right.get(key))
    };

    RunDelta {
        chapters_total: field(a, b, "chapters_total"),
        violations_total: field(a, b, "violations_total"),
        compliance_rate_high_confidence: field(
            compliance_a,
            compliance_b,
            "compliance_rate_high_confidence",
        ),
        compliance_rate_any_violation: field(
            compliance_a,
            compliance_b,
            "compliance_rate_any_violation",
        ),
        chapters_with_high_confidence_violation: field(
            compliance_a,
            compliance_b,
            "chapters_with_high_confidence_violation",
        ),
        chapters_with_any_violation: field(
            compliance_a,
            compliance_b,
            "chapters_with_any_violation",
        ),
        violations_by_confidence: delta_map(
            a.get("violations_by_confidence"),
            b.get("violations_by_confidence"),
            |value| as_finite_f64(Some(value)),
        ),
        violations_by_layer: delta_map(
            a.get("violations_by_layer"),
            b.get("violations_by_layer"),
            |value| as_finite_f64(Some(value)),
        ),
        score_overall_mean: field(score_a, score_b, "mean"),
    }
}

/// `b - a` when both sides are finite numbers.
fn delta_number(a: Option<&Value>, b: Option<&Value>) -> Option<f64> {
    Some(as_finite_f64(b)? - as_finite_f64(a)?)
}

/// Key-wise `b - a` over the union of keys. Keys unusable on both sides are
/// dropped; keys usable on only one side map to `None`.
fn delta_map(
    a: Option<&Value>,
    b: Option<&Value>,
    read: impl Fn(&Value) -> Option<f64>,
) -> BTreeMap<String, Option<f64>> {
    let empty = JsonObject::new();
    let a = as_object(a).unwrap_or(&empty);
    let b = as_object(b).unwrap_or(&empty);
    let keys = a.keys().chain(b.keys()).collect::<BTreeSet<_>>();

    keys
        .into_iter()
        .filter_map(|key| {
            let left = a.get(key).and_then(&read);
            let right = b.get(key).and_then(&read);
            match (left, right) {
                (None, None) => None,
                (Some(left), Some(right)) => Some((key.clone(), Some(right - left))),
                _ => Some((key.clone(), None)),
            }
        })
        .collect()
}

fn dimension_mean_deltas(a: Option<&Value>, b: Option<&Value>) -> BTreeMap<String, Option<f64>> {
    let mut deltas = delta_map(a, b, |entry| as_finite_f64(entry.as_object()?.get("mean")));
    for delta in deltas.values_mut() {
        *delta = delta.map(|value| round_to(value, DIMENSION_DELTA_DIGITS));
    }
    deltas
}

fn comparison_notes(a: &JsonObject, b: &JsonObject) -> Vec<String> {
    let mut notes = Vec::new();
    if as_finite_f64(a.get("chapters_total")) != as_finite_f64(b.get("chapters_total")) {
        notes.push(CHAPTERS_TOTAL_NOTE.to_string());
    }
    notes
}
