use std::collections::BTreeMap;

use serde::Serialize;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub project: ProjectPaths,
    pub labels: LabelsSummary,
    pub alignment: Alignment,
    pub overall: OverallStats,
    pub dimensions: BTreeMap<String, DimensionStats>,
    pub threshold_suggestions: ThresholdSuggestions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectPaths {
    pub path: String,
    pub evaluations_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelsSummary {
    pub path: String,
    pub records: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alignment {
    pub matched_chapters: Vec<u32>,
    pub missing_eval_chapters: Vec<u32>,
    /// Keyed by the chapter number rendered as a string.
    pub judge_overall_source_by_chapter: BTreeMap<String, String>,
    pub unpaired_dimensions: UnpairedDimensions,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnpairedDimensions {
    pub human_only: Vec<String>,
    pub judge_only: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub n: usize,
    pub pearson_r: Option<f64>,
    pub human_mean: f64,
    pub judge_mean: f64,
    pub mae: f64,
    pub rmse: f64,
    pub bias_judge_minus_human: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionStats {
    pub n: usize,
    pub pearson_r: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSuggestions {
    pub defaults: BTreeMap<String, f64>,
    pub methods: SuggestionMethods,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionMethods {
    pub shift_by_bias: BiasShiftSuggestion,
    pub linear_fit_inverse: FitInverseSuggestion,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasShiftSuggestion {
    pub formula: String,
    pub n: usize,
    pub bias_judge_minus_human: f64,
    pub suggested_thresholds: BTreeMap<String, f64>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FitInverseSuggestion {
    pub formula: String,
    pub n: usize,
    pub fit_human_equals_slope_times_judge_plus_intercept: Option<FitCoefficients>,
    pub suggested_thresholds: Option<BTreeMap<String, f64>>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FitCoefficients {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub run_a: RunReference,
    pub run_b: RunReference,
    pub delta: RunDelta,
    pub score_dimensions: BTreeMap<String, Option<f64>>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReference {
    pub dir: String,
    pub summary_path: String,
    pub run_id: serde_json::Value,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunDelta {
    pub chapters_total: Option<f64>,
    pub violations_total: Option<f64>,
    pub compliance_rate_high_confidence: Option<f64>,
    pub compliance_rate_any_violation: Option<f64>,
    pub chapters_with_high_confidence_violation: Option<f64>,
    pub chapters_with_any_violation: Option<f64>,
    pub violations_by_confidence: BTreeMap<String, Option<f64>>,
    pub violations_by_layer: BTreeMap<String, Option<f64>>,
    pub score_overall_mean: Option<f64>,
}
