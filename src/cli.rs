use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "judgecal",
    version,
    about = "Quality-judge calibration and regression-run comparison"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate judge scores against human-labeled chapters.
    Calibrate(CalibrateArgs),
    /// Diff two archived regression-run summaries.
    Compare(CompareArgs),
}

impl Commands {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Calibrate(_) => "calibrate-quality-judge",
            Self::Compare(_) => "compare-regression-runs",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    /// Project directory containing `evaluations/chapter-<N>-eval.json`.
    #[arg(long)]
    pub project_dir: PathBuf,

    /// Human labels, one JSON object per line.
    #[arg(long)]
    pub labels: PathBuf,

    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Override a default threshold band, e.g. `--threshold pass=4.2`.
    #[arg(long = "threshold", value_name = "NAME=VALUE")]
    pub thresholds: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub run_a: PathBuf,

    #[arg(long)]
    pub run_b: PathBuf,

    #[arg(long)]
    pub out: Option<PathBuf>,
}
