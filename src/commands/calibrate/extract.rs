use std::collections::BTreeMap;

use serde_json::Value;

use crate::util::{JsonObject, as_finite_f64, as_object};

/// Which field of a judge record supplied the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OverallSource {
    OverallFinal,
    EvalUsedOverallFinal,
    EvalUsedOverall,
    Overall,
    MetadataJudgesOverallFinal,
}

impl OverallSource {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::OverallFinal => "overall_final",
            Self::EvalUsedOverallFinal => "eval_used.overall_final",
            Self::EvalUsedOverall => "eval_used.overall",
            Self::Overall => "overall",
            Self::MetadataJudgesOverallFinal => "metadata.judges.overall_final",
        }
    }
}

type Locator = for<'a> fn(&'a JsonObject) -> Option<&'a Value>;

/// Candidate overall-score fields, highest priority first.
const OVERALL_CANDIDATES: [(Locator, OverallSource); 5] = [
    (top_level_overall_final, OverallSource::OverallFinal),
    (eval_used_overall_final, OverallSource::EvalUsedOverallFinal),
    (eval_used_overall, OverallSource::EvalUsedOverall),
    (top_level_overall, OverallSource::Overall),
    (
        metadata_judges_overall_final,
        OverallSource::MetadataJudgesOverallFinal,
    ),
];

fn top_level_overall_final(record: &JsonObject) -> Option<&Value> {
    record.get("overall_final")
}

fn eval_used_overall_final(record: &JsonObject) -> Option<&Value> {
    eval_used_view(record).get("overall_final")
}

fn eval_used_overall(record: &JsonObject) -> Option<&Value> {
    eval_used_view(record).get("overall")
}

fn top_level_overall(record: &JsonObject) -> Option<&Value> {
    record.get("overall")
}

fn metadata_judges_overall_final(record: &JsonObject) -> Option<&Value> {
    as_object(record.get("metadata"))
        .and_then(|metadata| as_object(metadata.get("judges")))
        .and_then(|judges| judges.get("overall_final"))
}

/// `eval_used` when it is an object, the record itself otherwise.
pub(super) fn eval_used_view(record: &JsonObject) -> &JsonObject {
    as_object(record.get("eval_used")).unwrap_or(record)
}

pub(super) fn extract_overall(record: &JsonObject) -> Option<(f64, OverallSource)> {
    for (locate, source) in &OVERALL_CANDIDATES {
        if let Some(score) = as_finite_f64(locate(record)) {
            return Some((score, *source));
        }
    }
    None
}

pub(super) fn extract_dimension_scores(record: &JsonObject) -> BTreeMap<String, f64> {
    let scores = as_object(eval_used_view(record).get("scores"));
    let Some(scores) = scores.or_else(|| as_object(record.get("scores"))) else {
        return BTreeMap::new();
    };

    scores
        .iter()
        .filter_map(|(key, item)| {
            let score = as_finite_f64(item.as_object()?.get("score"))?;
            Some((key.clone(), score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{OverallSource, extract_dimension_scores, extract_overall};
    use crate::util::JsonObject;

    fn object(value: Value) -> JsonObject {
        value
            .as_object()
            .cloned()
            .expect("test record is an object")
    }

    #[test]
    fn top_level_overall_final_wins_over_every_other_field() {
        let record = object(json!({
            "overall_final": 4.1,
            "overall": 2.0,
            "eval_used": {"overall_final": 3.0, "overall": 3.5},
            "metadata": {"judges": {"overall_final": 1.5}}
        }));
        assert_eq!(
            extract_overall(&record),
            Some((4.1, OverallSource::OverallFinal))
        );
    }

    #[test]
    fn eval_used_fields_precede_top_level_overall() {
        let record = object(json!({
            "overall": 2.0,
            "eval_used": {"overall": 3.5}
        }));
        assert_eq!(
            extract_overall(&record),
            Some((3.5, OverallSource::EvalUsedOverall))
        );

        let record = object(json!({
            "overall": 2.0,
            "eval_used": {"overall_final": 3.0, "overall": 3.5}
        }));
        assert_eq!(
            extract_overall(&record),
            Some((3.0, OverallSource::EvalUsedOverallFinal))
        );
    }

    #[test]
    fn non_object_eval_used_falls_back_to_record_itself() {
        let record = object(json!({"eval_used": "v2", "overall": 3.25}));
        assert_eq!(
            extract_overall(&record),
            Some((3.25, OverallSource::EvalUsedOverall))
        );
    }

    #[test]
    fn metadata_judges_is_the_last_resort() {
        let record = object(json!({
            "overall_final": "n/a",
            "overall": true,
            "metadata": {"judges": {"overall_final": 2.75}}
        }));
        assert_eq!(
            extract_overall(&record),
            Some((2.75, OverallSource::MetadataJudgesOverallFinal))
        );
    }

    #[test]
    fn missing_or_non_numeric_overall_is_absent() {
        assert_eq!(extract_overall(&object(json!({}))), None);
        assert_eq!(
            extract_overall(&object(json!({"metadata": {"judges": []}, "overall": null}))),
            None
        );
    }

    #[test]
    fn dimension_scores_prefer_eval_used_and_skip_malformed_entries() {
        let record = object(json!({
            "scores": {"clarity": {"score": 1.0}},
            "eval_used": {
                "scores": {
                    "clarity": {"score": 4.0},
                    "pacing": {"score": "high"},
                    "voice": 3.0,
                    "tension": {"score": 3}
                }
            }
        }));
        let scores = extract_dimension_scores(&record);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("clarity"), Some(&4.0));
        assert_eq!(scores.get("tension"), Some(&3.0));
    }

    #[test]
    fn dimension_scores_fall_back_to_top_level_when_eval_used_has_none() {
        let record = object(json!({
            "scores": {"clarity": {"score": 2.5}},
            "eval_used": {"scores": ["not", "a", "map"]}
        }));
        let scores = extract_dimension_scores(&record);
        assert_eq!(scores.get("clarity"), Some(&2.5));
        assert!(extract_dimension_scores(&object(json!({"scores": 5}))).is_empty());
    }
}
