use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::model::{
    Alignment as AlignmentReport, CalibrationReport, DimensionStats, LabelsSummary, OverallStats,
    ProjectPaths, REPORT_SCHEMA_VERSION, UnpairedDimensions,
};
use crate::util::round_to;

use super::matcher::Alignment;
use super::stats::{linear_fit, pearson, summarize_errors};
use super::thresholds::{ThresholdConfig, suggest_thresholds};

const STAT_DIGITS: i32 = 4;

pub(super) struct ReportInputs {
    pub(super) generated_at: String,
    pub(super) project: ProjectPaths,
    pub(super) labels: LabelsSummary,
}

pub(super) fn build_report(
    inputs: ReportInputs,
    alignment: &Alignment,
    thresholds: &ThresholdConfig,
) -> Result<CalibrationReport> {
    let human = alignment.human_overall();
    let judge = alignment.judge_overall();

    let errors = summarize_errors(&human, &judge).context("no matched chapters to summarize")?;
    let pearson_r = pearson(&human, &judge).computable();
    // Predict human from judge so the fit can be inverted into judge-scale thresholds.
    let fit = linear_fit(&judge, &human);

    let dimensions = alignment
        .dimensions
        .iter()
        .map(|(dimension, pairs)| {
            let stats = DimensionStats {
                n: pairs.human.len(),
                pearson_r: pearson(&pairs.human, &pairs.judge)
                    .computable()
                    .map(|r| round_to(r, STAT_DIGITS)),
            };
            (dimension.clone(), stats)
        })
        .collect::<BTreeMap<_, _>>();

    let judge_overall_source_by_chapter = alignment
        .pairs
        .iter()
        .map(|pair| {
            (
                pair.chapter.to_string(),
                pair.judge_overall_source.as_str().to_string(),
            )
        })
        .collect();

    Ok(CalibrationReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: inputs.generated_at,
        project: inputs.project,
        labels: inputs.labels,
        alignment: AlignmentReport {
            matched_chapters: alignment.matched_chapters(),
            missing_eval_chapters: alignment.missing_eval_chapters.clone(),
            judge_overall_source_by_chapter,
            unpaired_dimensions: UnpairedDimensions {
                human_only: alignment.human_only_dimensions.iter().cloned().collect(),
                judge_only: alignment.judge_only_dimensions.iter().cloned().collect(),
            },
        },
        overall: OverallStats {
            n: errors.n,
            pearson_r: pearson_r.map(|r| round_to(r, STAT_DIGITS)),
            human_mean: round_to(errors.human_mean, STAT_DIGITS),
            judge_mean: round_to(errors.judge_mean, STAT_DIGITS),
            mae: round_to(errors.mae, STAT_DIGITS),
            rmse: round_to(errors.rmse, STAT_DIGITS),
            bias_judge_minus_human: round_to(errors.bias, STAT_DIGITS),
        },
        dimensions,
        threshold_suggestions: suggest_thresholds(thresholds, &errors, fit),
    })
}
