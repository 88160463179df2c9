use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::model::{
    BiasShiftSuggestion, FitCoefficients, FitInverseSuggestion, SuggestionMethods,
    ThresholdSuggestions,
};
use crate::util::round_to;

use super::stats::{ErrorSummary, Estimate, LinearFit};

const THRESHOLD_DIGITS: i32 = 3;
const BIAS_DIGITS: i32 = 4;
const FIT_DIGITS: i32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ThresholdBand {
    pub(super) name: String,
    pub(super) value: f64,
}

/// Decision cut-points on the score scale, strictest band first.
///
/// Scores below the last band fall into an implicit force-rewrite band that
/// has no cutoff of its own.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ThresholdConfig {
    pub(super) bands: Vec<ThresholdBand>,
    pub(super) scale_min: f64,
    pub(super) scale_max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let bands = [
            ("pass", 4.0),
            ("polish", 3.5),
            ("revise", 3.0),
            ("pause_for_user", 2.0),
        ]
        .into_iter()
        .map(|(name, value)| ThresholdBand {
            name: name.to_string(),
            value,
        })
        .collect();

        Self {
            bands,
            scale_min: 1.0,
            scale_max: 5.0,
        }
    }
}

impl ThresholdConfig {
    /// Applies `name=value` overrides to existing bands. The result must still
    /// lie on the score scale, strictest band first.
    pub(super) fn with_overrides(mut self, overrides: &[String]) -> Result<Self, ToolError> {
        for raw in overrides {
            let (name, value) = raw.split_once('=').ok_or_else(|| {
                ToolError::invalid(format!("threshold override must be NAME=VALUE, got {raw:?}"))
            })?;
            let name = name.trim();
            let Some(value) = value.trim().parse::<f64>().ok().filter(|v| v.is_finite()) else {
                return Err(ToolError::invalid(format!(
                    "threshold {name} must be a finite number, got {raw:?}"
                )));
            };

            let band = self
                .bands
                .iter_mut()
                .find(|band| band.name == name)
                .ok_or_else(|| ToolError::invalid(format!("unknown threshold band: {name}")))?;
            band.value = value;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ToolError> {
        for band in &self.bands {
            if !(self.scale_min..=self.scale_max).contains(&band.value) {
                return Err(ToolError::invalid(format!(
                    "threshold {}={} is outside the score scale [{}, {}]",
                    band.name, band.value, self.scale_min, self.scale_max
                )));
            }
        }

        for pair in self.bands.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.value <= lower.value {
                return Err(ToolError::invalid(format!(
                    "threshold {}={} must be above {}={}",
                    upper.name, upper.value, lower.name, lower.value
                )));
            }
        }
        Ok(())
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.scale_min, self.scale_max)
    }

    fn defaults(&self) -> BTreeMap<String, f64> {
        self.bands
            .iter()
            .map(|band| (band.name.clone(), band.value))
            .collect()
    }

    fn suggest(&self, adjust: impl Fn(f64) -> f64) -> BTreeMap<String, f64> {
        self.bands
            .iter()
            .map(|band| {
                let suggested = round_to(self.clamp(adjust(band.value)), THRESHOLD_DIGITS);
                (band.name.clone(), suggested)
            })
            .collect()
    }
}

pub(super) fn suggest_thresholds(
    config: &ThresholdConfig,
    errors: &ErrorSummary,
    fit: Estimate<LinearFit>,
) -> ThresholdSuggestions {
    ThresholdSuggestions {
        defaults: config.defaults(),
        methods: SuggestionMethods {
            shift_by_bias: shift_by_bias(config, errors),
            linear_fit_inverse: linear_fit_inverse(config, errors.n, fit),
        },
    }
}

fn shift_by_bias(config: &ThresholdConfig, errors: &ErrorSummary) -> BiasShiftSuggestion {
    let bias = errors.bias;
    BiasShiftSuggestion {
        formula: format!(
            "clamp(default + bias_judge_minus_human, {}, {})",
            config.scale_min, config.scale_max
        ),
        n: errors.n,
        bias_judge_minus_human: round_to(bias, BIAS_DIGITS),
        suggested_thresholds: config.suggest(|value| value + bias),
        note: "Positive bias means the judge scores above humans, so thresholds move up by the \
               same amount; negative bias moves them down. Heuristic only."
            .to_string(),
    }
}

fn linear_fit_inverse(
    config: &ThresholdConfig,
    n: usize,
    fit: Estimate<LinearFit>,
) -> FitInverseSuggestion {
    let formula = format!(
        "clamp((default - intercept) / slope, {}, {}) with human = slope * judge + intercept",
        config.scale_min, config.scale_max
    );

    let invertible = match fit {
        Estimate::Computable(fit) if fit.is_invertible() => Ok(fit),
        Estimate::Computable(_) => Err("fitted slope is too close to zero to invert"),
        Estimate::Undefined(reason) => Err(reason),
    };

    match invertible {
        Ok(fit) => FitInverseSuggestion {
            formula,
            n,
            fit_human_equals_slope_times_judge_plus_intercept: Some(FitCoefficients {
                slope: round_to(fit.slope, FIT_DIGITS),
                intercept: round_to(fit.intercept, FIT_DIGITS),
            }),
            suggested_thresholds: Some(config.suggest(|value| fit.solve_for_x(value))),
            note: "Inverse of a least-squares fit predicting human from judge scores. Unstable \
                   with few samples or a narrow score range; advisory only."
                .to_string(),
        },
        Err(reason) => FitInverseSuggestion {
            formula,
            n,
            fit_human_equals_slope_times_judge_plus_intercept: None,
            suggested_thresholds: None,
            note: format!(
                "Not computable: {reason}. Judge scores are too narrowly distributed or samples \
                 too few for a stable fit."
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{ThresholdConfig, suggest_thresholds};
    use crate::commands::calibrate::stats::{ErrorSummary, Estimate, LinearFit};

    fn errors_with_bias(bias: f64) -> ErrorSummary {
        ErrorSummary {
            n: 5,
            human_mean: 3.0,
            judge_mean: 3.0 + bias,
            bias,
            mae: bias.abs(),
            rmse: bias.abs(),
        }
    }

    #[test]
    fn bias_shift_moves_every_band_by_bias() {
        let config = ThresholdConfig::default();
        let suggestions =
            suggest_thresholds(&config, &errors_with_bias(0.25), Estimate::Undefined("x"));
        let shifted = &suggestions.methods.shift_by_bias.suggested_thresholds;

        assert_eq!(shifted["pass"], 4.25);
        assert_eq!(shifted["polish"], 3.75);
        assert_eq!(shifted["revise"], 3.25);
        assert_eq!(shifted["pause_for_user"], 2.25);
        assert_eq!(suggestions.defaults["pass"], 4.0);
    }

    #[test]
    fn bias_shift_is_clamped_to_score_scale() {
        let config = ThresholdConfig::default();
        for bias in [10.0, -10.0] {
            let suggestions =
                suggest_thresholds(&config, &errors_with_bias(bias), Estimate::Undefined("x"));
            let shifted = &suggestions.methods.shift_by_bias.suggested_thresholds;
            for value in shifted.values() {
                assert!((1.0..=5.0).contains(value), "{value} escaped the scale");
            }
        }
    }

    #[test]
    fn fit_inverse_solves_for_judge_threshold() {
        let config = ThresholdConfig::default();
        let fit = LinearFit {
            slope: 2.0,
            intercept: -3.0,
        };
        let suggestions =
            suggest_thresholds(&config, &errors_with_bias(0.0), Estimate::Computable(fit));
        let inverse = &suggestions.methods.linear_fit_inverse;
        let thresholds = inverse
            .suggested_thresholds
            .as_ref()
            .expect("fit should be invertible");

        assert_eq!(thresholds["pass"], 3.5);
        assert_eq!(thresholds["polish"], 3.25);
        assert_eq!(thresholds["revise"], 3.0);
        assert_eq!(thresholds["pause_for_user"], 2.5);
        let coefficients = inverse
            .fit_human_equals_slope_times_judge_plus_intercept
            .expect("coefficients reported");
        assert_eq!(coefficients.slope, 2.0);
        assert_eq!(coefficients.intercept, -3.0);
    }

    #[test]
    fn fit_inverse_reports_not_computable_for_flat_or_missing_fit() {
        let config = ThresholdConfig::default();
        let flat = LinearFit {
            slope: 1e-8,
            intercept: 3.0,
        };
        for fit in [
            Estimate::Computable(flat),
            Estimate::Undefined("zero variance in x"),
        ] {
            let suggestions = suggest_thresholds(&config, &errors_with_bias(0.0), fit);
            let inverse = &suggestions.methods.linear_fit_inverse;
            let coefficients = &inverse.fit_human_equals_slope_times_judge_plus_intercept;
            assert!(inverse.suggested_thresholds.is_none());
            assert!(coefficients.is_none());
            assert!(inverse.note.starts_with("Not computable: "));
        }
    }

    #[test]
    fn fit_inverse_is_clamped_to_score_scale() {
        let config = ThresholdConfig::default();
        let fit = LinearFit {
            slope: 0.1,
            intercept: 3.0,
        };
        let suggestions =
            suggest_thresholds(&config, &errors_with_bias(0.0), Estimate::Computable(fit));
        let thresholds = suggestions
            .methods
            .linear_fit_inverse
            .suggested_thresholds
            .expect("fit should be invertible");

        for value in thresholds.values() {
            assert!((1.0..=5.0).contains(value), "{value} escaped the scale");
        }
        assert_eq!(thresholds["pass"], 5.0);
        assert_eq!(thresholds["polish"], 5.0);
        assert_eq!(thresholds["revise"], 1.0);
        assert_eq!(thresholds["pause_for_user"], 1.0);
    }

    fn override_error(overrides: &[&str]) -> String {
        let overrides: Vec<String> = overrides.iter().map(|raw| raw.to_string()).collect();
        ThresholdConfig::default()
            .with_overrides(&overrides)
            .expect_err("override should be rejected")
            .to_string()
    }

    #[test]
    fn overrides_replace_named_bands_only() {
        let overrides = ["pass=4.4".to_string(), " revise = 2.8 ".to_string()];
        let config = ThresholdConfig::default()
            .with_overrides(&overrides)
            .expect("overrides should apply");
        assert_eq!(config.bands[0].value, 4.4);
        assert_eq!(config.bands[1].value, 3.5);
        assert_eq!(config.bands[2].value, 2.8);

        assert_eq!(
            override_error(&["rewrite=1.0"]),
            "unknown threshold band: rewrite"
        );
        assert!(override_error(&["pass"]).contains("NAME=VALUE"));
        assert!(override_error(&["pass=NaN"]).contains("finite number"));
    }

    #[test]
    fn overrides_must_stay_on_scale_and_keep_band_order() {
        assert_eq!(
            override_error(&["pass=6.0"]),
            "threshold pass=6 is outside the score scale [1, 5]"
        );
        let below_scale = override_error(&["pause_for_user=0.5"]);
        assert!(below_scale.contains("outside the score scale"));

        assert_eq!(
            override_error(&["pass=1.5"]),
            "threshold pass=1.5 must be above polish=3.5"
        );
        assert_eq!(
            override_error(&["polish=4"]),
            "threshold pass=4 must be above polish=4"
        );
        let valid = ["pass=3.6".to_string(), "polish=3.55".to_string()];
        assert!(ThresholdConfig::default().with_overrides(&valid).is_ok());
    }
}
