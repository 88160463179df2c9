use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::CalibrateArgs;
use crate::model::{CalibrationReport, LabelsSummary, ProjectPaths};
use crate::util::{absolute_path, emit_report, now_utc_string, render_json_line, sha256_file};

use super::discovery::EvalDirectory;
use super::labels::load_labels;
use super::matcher::align;
use super::report::{ReportInputs, build_report};
use super::thresholds::ThresholdConfig;

pub(crate) fn run(args: CalibrateArgs) -> Result<()> {
    let thresholds = ThresholdConfig::default().with_overrides(&args.thresholds)?;
    let report = calibrate(&args.project_dir, &args.labels, &thresholds)?;

    let rendered = render_json_line(&report)?;
    emit_report(&rendered, args.out.as_deref())?;

    if let Some(out) = &args.out {
        info!(path = %out.display(), "wrote calibration report");
    }
    Ok(())
}

pub(super) fn calibrate(
    project_dir: &Path,
    labels_path: &Path,
    thresholds: &ThresholdConfig,
) -> Result<CalibrationReport> {
    let labels = load_labels(labels_path)?;
    info!(path = %labels_path.display(), records = labels.len(), "loaded labels");

    let project_dir = absolute_path(project_dir);
    let eval_dir = project_dir.join("evaluations");
    let evals = EvalDirectory::discover(&eval_dir, &project_dir)?;
    info!(dir = %eval_dir.display(), files = evals.len(), "discovered eval files");

    let alignment = align(&labels, &evals)?;
    info!(
        matched = alignment.pairs.len(),
        missing = alignment.missing_eval_chapters.len(),
        dimensions = alignment.dimensions.len(),
        "aligned labels with judge output"
    );

    let inputs = ReportInputs {
        generated_at: now_utc_string(),
        project: ProjectPaths {
            path: project_dir.display().to_string(),
            evaluations_dir: eval_dir.display().to_string(),
        },
        labels: LabelsSummary {
            path: absolute_path(labels_path).display().to_string(),
            records: labels.len(),
            sha256: sha256_file(labels_path)?,
        },
    };

    build_report(inputs, &alignment, thresholds)
}
