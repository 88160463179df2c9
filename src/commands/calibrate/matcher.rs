use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use tracing::warn;

use crate::error::ToolError;

use super::discovery::JudgeRecordSource;
use super::extract::{OverallSource, extract_dimension_scores, extract_overall};
use super::labels::LabelRecord;

const MIN_MATCHED_CHAPTERS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct MatchedPair {
    pub(super) chapter: u32,
    pub(super) human_overall: f64,
    pub(super) judge_overall: f64,
    pub(super) judge_overall_source: OverallSource,
}

/// Human and judge scores for one dimension, aligned by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct DimensionPairs {
    pub(super) human: Vec<f64>,
    pub(super) judge: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Alignment {
    pub(super) pairs: Vec<MatchedPair>,
    pub(super) missing_eval_chapters: Vec<u32>,
    pub(super) dimensions: BTreeMap<String, DimensionPairs>,
    pub(super) human_only_dimensions: BTreeSet<String>,
    pub(super) judge_only_dimensions: BTreeSet<String>,
}

impl Alignment {
    pub(super) fn matched_chapters(&self) -> Vec<u32> {
        self.pairs.iter().map(|pair| pair.chapter).collect()
    }

    pub(super) fn human_overall(&self) -> Vec<f64> {
        self.pairs.iter().map(|pair| pair.human_overall).collect()
    }

    pub(super) fn judge_overall(&self) -> Vec<f64> {
        self.pairs.iter().map(|pair| pair.judge_overall).collect()
    }
}

pub(super) fn align(
    labels: &BTreeMap<u32, LabelRecord>,
    source: &impl JudgeRecordSource,
) -> Result<Alignment> {
    let mut alignment = Alignment::default();

    for (chapter, label) in labels {
        let Some(record) = source.judge_record(*chapter)? else {
            warn!(chapter, "no eval file for labelled chapter");
            alignment.missing_eval_chapters.push(*chapter);
            continue;
        };

        let Some((judge_overall, judge_overall_source)) = extract_overall(&record) else {
            warn!(chapter, "eval file has no numeric overall score");
            alignment.missing_eval_chapters.push(*chapter);
            continue;
        };

        alignment.pairs.push(MatchedPair {
            chapter: *chapter,
            human_overall: label.human_overall,
            judge_overall,
            judge_overall_source,
        });

        let judge_dimensions = extract_dimension_scores(&record);
        for (dimension, human_score) in &label.human_dimensions {
            let Some(judge_score) = judge_dimensions.get(dimension) else {
                alignment.human_only_dimensions.insert(dimension.clone());
                continue;
            };
            let pairs = alignment.dimensions.entry(dimension.clone()).or_default();
            pairs.human.push(*human_score);
            pairs.judge.push(*judge_score);
        }
        alignment.judge_only_dimensions.extend(
            judge_dimensions
                .into_keys()
                .filter(|dimension| !label.human_dimensions.contains_key(dimension)),
        );
    }

    if alignment.pairs.len() < MIN_MATCHED_CHAPTERS {
        return Err(ToolError::InsufficientData {
            matched: alignment.pairs.len(),
        }
        .into());
    }

    Ok(alignment)
}
