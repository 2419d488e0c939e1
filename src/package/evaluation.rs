//! Compliance evaluation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed evaluation returned by the compliance evaluator.
///
/// The rubric shape is not validated: typed views are extracted on a
/// best-effort basis and the full parsed object is kept in `raw`, so schema
/// drift stays visible to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Per-criterion scores that could be read as numbers.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    /// Overall score on the 0-100 scale, when the model provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    /// Improvements the evaluator wants, most important first.
    #[serde(default)]
    pub priority_improvements: Vec<String>,
    /// The complete parsed response.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub raw: Map<String, Value>,
}

/// Read a number that may be encoded as a JSON number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a list of strings, tolerating a single string or mixed values.
pub fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

impl Evaluation {
    /// Build an evaluation from the evaluator's parsed JSON object.
    pub fn from_object(raw: Map<String, Value>) -> Self {
        let scores = raw
            .get("scores")
            .and_then(Value::as_object)
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|(name, value)| {
                        let score = match value {
                            Value::Object(detail) => detail.get("score").and_then(as_number),
                            other => as_number(other),
                        };
                        score.map(|s| (name.clone(), s))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let total_score = raw.get("total_score").and_then(as_number);
        let priority_improvements = raw
            .get("priority_improvements")
            .map(as_string_list)
            .unwrap_or_default();

        Self {
            scores,
            total_score,
            priority_improvements,
            raw,
        }
    }

    /// Score used for threshold comparisons; a missing total counts as 0.
    pub fn score(&self) -> f64 {
        self.total_score.unwrap_or(0.0)
    }

    /// Improvements joined for inclusion in an instruction.
    pub fn improvements_text(&self) -> String {
        if self.priority_improvements.is_empty() {
            "none listed".to_string()
        } else {
            self.priority_improvements.join("; ")
        }
    }
}
