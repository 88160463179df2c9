use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ToolError;

pub type JsonObject = serde_json::Map<String, Value>;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Absolute form of `path` without touching the filesystem.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Finite numbers only; booleans, strings and non-finite values are absent.
pub fn as_finite_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn as_object(value: Option<&Value>) -> Option<&JsonObject> {
    value.and_then(Value::as_object)
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    // `+ 0.0` folds a rounded `-0.0` into `0.0`.
    (value * factor).round() / factor + 0.0
}

pub fn load_json(path: &Path) -> Result<Value> {
    let raw = fs::read(path)
        .map_err(|err| ToolError::invalid(format!("failed to read {}: {err}", path.display())))?;
    let value = serde_json::from_slice(&raw)
        .map_err(|err| ToolError::invalid(format!("invalid JSON at {}: {err}", path.display())))?;
    Ok(value)
}

/// Compact JSON with every object key sorted, plus a trailing newline.
pub fn render_json_line<T: Serialize>(value: &T) -> Result<String> {
    // `serde_json::Map` is ordered by key unless `preserve_order` is enabled.
    let tree = serde_json::to_value(value).context("failed to serialize report")?;
    let mut rendered = serde_json::to_string(&tree).context("failed to render report")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Prints the report, then persists it when an output path was given.
pub fn emit_report(rendered: &str, out: Option<&Path>) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write report to stdout")?;

    if let Some(path) = out {
        write_text_file(path, rendered).map_err(|source| ToolError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

fn write_text_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = absolute_path(path).parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::{as_finite_f64, emit_report, render_json_line, round_to};
    use crate::error::ToolError;

    #[test]
    fn as_finite_f64_rejects_booleans_and_strings() {
        assert_eq!(as_finite_f64(Some(&json!(3))), Some(3.0));
        assert_eq!(as_finite_f64(Some(&json!(2.5))), Some(2.5));
        assert_eq!(as_finite_f64(Some(&json!(true))), None);
        assert_eq!(as_finite_f64(Some(&json!("4.0"))), None);
        assert_eq!(as_finite_f64(Some(&json!(null))), None);
        assert_eq!(as_finite_f64(None), None);
    }

    #[test]
    fn round_to_keeps_requested_digits() {
        assert_eq!(round_to(3.14159, 3), 3.142);
        assert!(round_to(-0.00004, 4).is_sign_positive());
        assert_eq!(round_to(2.0, 6), 2.0);
    }

    #[derive(serde::Serialize)]
    struct Unsorted {
        zeta: u32,
        alpha: u32,
    }

    #[test]
    fn render_json_line_sorts_struct_keys() {
        let rendered = render_json_line(&Unsorted { zeta: 1, alpha: 2 }).expect("render");
        assert_eq!(rendered, "{\"alpha\":2,\"zeta\":1}\n");
    }

    #[test]
    fn emit_report_creates_missing_parent_directories() {
        let dir = tempdir().expect("create temp dir");
        let out = dir.path().join("a").join("b").join("report.json");

        emit_report("{\"ok\":true}\n", Some(&out)).expect("report should be written");
        let written = fs::read_to_string(&out).expect("read report back");
        assert_eq!(written, "{\"ok\":true}\n");
    }

    #[test]
    fn emit_report_fails_with_output_write_when_parent_is_a_file() {
        let dir = tempdir().expect("create temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("write blocker file");

        let out = blocker.join("report.json");
        let err = emit_report("{}\n", Some(&out)).expect_err("parent is a regular file");
        match err.downcast_ref::<ToolError>() {
            Some(ToolError::OutputWrite { path, .. }) => assert_eq!(path, &out),
            other => panic!("expected an output write error, got {other:?}"),
        }
    }
}
