use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::util::{JsonObject, load_json};

/// Supplies the judge output for a chapter, if one exists.
pub(super) trait JudgeRecordSource {
    fn judge_record(&self, chapter: u32) -> Result<Option<JsonObject>>;
}

/// `chapter-<N>-eval.json` files under one evaluations directory, loaded on
/// demand.
#[derive(Debug)]
pub(super) struct EvalDirectory {
    files: BTreeMap<u32, PathBuf>,
}

impl EvalDirectory {
    pub(super) fn discover(eval_dir: &Path, project_dir: &Path) -> Result<Self> {
        if !eval_dir.is_dir() {
            return Err(ToolError::invalid(format!(
                "evaluations/ not found under project dir: {}",
                project_dir.display()
            ))
            .into());
        }

        let pattern = Regex::new(r"^chapter-(\d+)-eval\.json$")
            .context("failed to compile eval filename regex")?;

        let entries = fs::read_dir(eval_dir)
            .with_context(|| format!("failed to read {}", eval_dir.display()))?;

        let mut files = BTreeMap::<u32, PathBuf>::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", eval_dir.display()))?;
            let path = entry.path();
            let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(captures) = pattern.captures(filename) else {
                continue;
            };

            let chapter = match captures[1].parse::<u32>() {
                Ok(chapter) => chapter,
                Err(err) => {
                    warn!(
                        file = %path.display(),
                        error = %err,
                        "skipping eval file with unusable chapter number"
                    );
                    continue;
                }
            };

            // `chapter-1` and `chapter-01` name the same chapter.
            if let Some(existing) = files.get(&chapter) {
                let mut paths = [existing.display().to_string(), path.display().to_string()];
                paths.sort();
                return Err(ToolError::invalid(format!(
                    "multiple eval files for chapter {chapter}: {} and {}",
                    paths[0], paths[1]
                ))
                .into());
            }
            files.insert(chapter, path);
        }

        debug!(dir = %eval_dir.display(), files = files.len(), "discovered eval files");
        Ok(Self { files })
    }

    pub(super) fn len(&self) -> usize {
        self.files.len()
    }
}

impl JudgeRecordSource for EvalDirectory {
    fn judge_record(&self, chapter: u32) -> Result<Option<JsonObject>> {
        let Some(path) = self.files.get(&chapter) else {
            return Ok(None);
        };

        match load_json(path)? {
            Value::Object(object) => Ok(Some(object)),
            _ => Err(ToolError::invalid(format!(
                "eval JSON must be an object at {}",
                path.display()
            ))
            .into()),
        }
    }
}

#[cfg(test)]
impl JudgeRecordSource for BTreeMap<u32, JsonObject> {
    fn judge_record(&self, chapter: u32) -> Result<Option<JsonObject>> {
        Ok(self.get(&chapter).cloned())
    }
}
