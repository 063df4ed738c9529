//! analyze_mbti_responses tool handler

use chrono::Local;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde_json::{Map, Value, json};

use crate::error::{MbtiError, Result};
use crate::narrative::PromptSubject;
use crate::pipeline::{AnalysisContext, Pipeline};
use crate::scoring::{Axis, DimensionScores, axis_outcome};
use crate::server::MbtiServer;
use crate::tools::parse_responses_arg;

/// `{extraversion_introversion: {preference, e_score, i_score}, ...}`
pub fn dimension_breakdown(scores: &DimensionScores) -> Value {
    let mut out = Map::new();
    for axis in Axis::ALL {
        let (a, b) = axis.letters();
        let outcome = axis_outcome(scores, axis);
        let mut entry = Map::new();
        entry.insert("preference".into(), json!(outcome.preference.as_str()));
        for letter in [a, b] {
            entry.insert(
                format!("{}_score", letter.as_str().to_lowercase()),
                json!(scores.fraction(letter)),
            );
        }
        out.insert(axis.breakdown_key().to_string(), Value::Object(entry));
    }
    Value::Object(out)
}

/// Tool output for a finished in-memory run
pub fn analysis_output(ctx: &AnalysisContext) -> Result<Value> {
    let (Some(scores), Some(personality), Some(narrative), Some(responses)) =
        (&ctx.scores, &ctx.personality, &ctx.narrative, &ctx.responses)
    else {
        return Err(MbtiError::Internal {
            message: "analysis finished without scores, type or narrative".into(),
        });
    };

    Ok(json!({
        "mbti_type": personality.code,
        "traditional_scores": scores.score_map(),
        "confidence_scores": personality.confidence_map(),
        "dimension_breakdown": dimension_breakdown(scores),
        "llm_analysis": narrative.text,
        "llm_succeeded": narrative.succeeded,
        "referenced_questions": ctx.referenced_questions,
        "response_count": responses.len(),
        "analysis_timestamp": Local::now().to_rfc3339(),
    }))
}

impl MbtiServer {
    /// Handle the analyze_mbti_responses tool call
    pub async fn handle_analyze_responses(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let args = request.arguments.ok_or_else(|| MbtiError::Mcp {
            message: "Missing parameters".into(),
        })?;
        let parsed = parse_responses_arg(&args)?;

        let mut ctx = AnalysisContext::prepopulated(parsed.questions, parsed.answers);
        Pipeline::in_memory(self.augmenter.clone(), PromptSubject::AiSystem)
            .run(&mut ctx)
            .await?;

        Ok(CallToolResult::structured(analysis_output(&ctx)?))
    }
}
