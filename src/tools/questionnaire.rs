//! get_mbti_questionnaire tool handler

use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde_json::{Value, json};

use crate::error::Result;
use crate::questions::{QuestionnaireLength, questions_for};
use crate::responses::ResponseLabel;
use crate::server::MbtiServer;

/// Questionnaire payload: instructions, ordered questions, count
pub fn questionnaire_payload(length: QuestionnaireLength) -> Value {
    let questions = questions_for(length);
    let scale_meaning: serde_json::Map<String, Value> = ResponseLabel::ALL
        .iter()
        .map(|l| (l.value().to_string(), json!(l.display())))
        .collect();
    json!({
        "instructions": {
            "rating_scale": "Rate each statement from 1-5",
            "scale_meaning": scale_meaning,
            "note": "Answer based on your typical behavior and preferences as an AI system"
        },
        "total_questions": questions.len(),
        "questions": questions,
    })
}

/// `length` may be a number or numeric string; anything unusable reads as 20
fn requested_length(value: Option<&Value>, default: QuestionnaireLength) -> QuestionnaireLength {
    let Some(value) = value else {
        return default;
    };
    let n = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or(0);
    QuestionnaireLength::from_len_or_default(n)
}

impl MbtiServer {
    /// Handle the get_mbti_questionnaire tool call
    pub async fn handle_get_questionnaire(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let length = requested_length(
            request.arguments.as_ref().and_then(|a| a.get("length")),
            self.config.questionnaire.length(),
        );
        tracing::debug!("serving {}-question questionnaire", length.count());
        Ok(CallToolResult::structured(questionnaire_payload(length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_instructions_and_count() {
        let payload = questionnaire_payload(QuestionnaireLength::Forty);
        assert_eq!(payload["total_questions"], 40);
        assert_eq!(payload["questions"].as_array().unwrap().len(), 40);
        assert_eq!(payload["instructions"]["scale_meaning"]["1"], "Strongly Disagree");
        assert_eq!(payload["instructions"]["scale_meaning"]["5"], "Strongly Agree");
        assert_eq!(payload["questions"][0]["id"], 1);
        assert_eq!(payload["questions"][0]["dimension"], "E");
    }

    #[test]
    fn invalid_lengths_fall_back_to_twenty() {
        let d = QuestionnaireLength::Twenty;
        assert_eq!(requested_length(Some(&json!(60)), d), QuestionnaireLength::Sixty);
        assert_eq!(requested_length(Some(&json!("40")), d), QuestionnaireLength::Forty);
        assert_eq!(requested_length(Some(&json!(33)), d), QuestionnaireLength::Twenty);
        assert_eq!(requested_length(Some(&json!("lots")), d), QuestionnaireLength::Twenty);
        assert_eq!(
            requested_length(None, QuestionnaireLength::Sixty),
            QuestionnaireLength::Sixty
        );
    }
}
