//! Tool handlers for the mbti-flow MCP server

pub mod analyze;
pub mod detailed_help;
pub mod prompt;
pub mod questionnaire;

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::error::{MbtiError, Result};
use crate::questions::{Question, QuestionnaireLength, extract_questions, questions_for};
use crate::responses::{RawResponse, parse_keyed_responses};

/// Questions and answers decoded from a `responses` tool argument
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponses {
    pub questions: Vec<Question>,
    pub answers: BTreeMap<u32, RawResponse>,
}

/// Smallest catalog tier that contains every answered id
fn tier_covering(answers: &BTreeMap<u32, RawResponse>) -> QuestionnaireLength {
    match answers.keys().next_back().copied().unwrap_or(0) {
        0..=20 => QuestionnaireLength::Twenty,
        21..=40 => QuestionnaireLength::Forty,
        _ => QuestionnaireLength::Sixty,
    }
}

/// Decode the `responses` argument.
///
/// Keys that are not integers (other than `_questions`) are dropped. When
/// `_questions` is absent the catalog tier covering the answered ids is used.
/// Answers to ids outside the question set are rejected.
pub fn parse_responses_arg(args: &Map<String, Value>) -> Result<ToolResponses> {
    let responses = args
        .get("responses")
        .and_then(Value::as_object)
        .ok_or_else(|| MbtiError::InvalidParams {
            message: "'responses' must be an object of question id to rating".into(),
        })?;

    let answers = parse_keyed_responses(responses);

    let questions = match responses.get("_questions") {
        Some(list) => extract_questions(&json!({ "questions": list })).map_err(|e| {
            MbtiError::InvalidParams {
                message: format!("_questions: {}", e),
            }
        })?,
        None => questions_for(tier_covering(&answers)),
    };

    let unknown: Vec<u32> = answers
        .keys()
        .filter(|id| !questions.iter().any(|q| q.id == **id))
        .copied()
        .collect();
    if !unknown.is_empty() {
        return Err(MbtiError::InvalidParams {
            message: format!("responses reference unknown question ids {:?}", unknown),
        });
    }

    Ok(ToolResponses { questions, answers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn uses_supplied_questions() {
        let parsed = parse_responses_arg(&args(json!({
            "responses": {
                "1": 5, "2": "agree", "comment": "ignored",
                "_questions": [
                    {"id": 1, "text": "a", "dimension": "E"},
                    {"id": 2, "text": "b", "dimension": "I"}
                ]
            }
        })))
        .unwrap();
        assert_eq!(parsed.questions.len(), 2);
        assert_eq!(parsed.answers.len(), 2);
    }

    #[test]
    fn falls_back_to_covering_catalog_tier() {
        let parsed = parse_responses_arg(&args(json!({"responses": {"1": 3, "35": 4}}))).unwrap();
        assert_eq!(parsed.questions.len(), 40);
        let parsed = parse_responses_arg(&args(json!({"responses": {}}))).unwrap();
        assert_eq!(parsed.questions.len(), 20);
    }

    #[test]
    fn rejects_unknown_ids_and_bad_shapes() {
        let err = parse_responses_arg(&args(json!({
            "responses": {"7": 3, "_questions": [{"id": 1, "text": "a", "dimension": "E"}]}
        })))
        .unwrap_err();
        assert!(matches!(err, MbtiError::InvalidParams { .. }));

        let err = parse_responses_arg(&args(json!({"responses": [1, 2]}))).unwrap_err();
        assert!(matches!(err, MbtiError::InvalidParams { .. }));

        let err = parse_responses_arg(&args(json!({"responses": {"_questions": "nope"}}))).unwrap_err();
        assert!(matches!(err, MbtiError::InvalidParams { .. }));
    }
}
