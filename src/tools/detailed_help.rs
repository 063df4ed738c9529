//! detailed_help tool handler to provide structured help for tools

use crate::error::{MbtiError, Result};
use crate::schemas::TOOL_NAMES;
use crate::server::MbtiServer;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use serde_json::{Value, json};

/// Help document for one tool, `None` for names we do not serve
pub fn tool_help(tool: &str) -> Option<Value> {
    let help = match tool {
        "get_mbti_questionnaire" => json!({
            "name": "get_mbti_questionnaire",
            "description": "Return the questionnaire with rating instructions. Lengths other than 20, 40 or 60 fall back to 20.",
            "arguments": {
                "length": "integer|string: 20, 40 or 60 (default 20)"
            },
            "returns": {
                "instructions": "object: rating_scale, scale_meaning (1-5 labels), note",
                "questions": "array of {id, text, dimension}",
                "total_questions": "integer"
            }
        }),
        "get_mbti_prompt" => json!({
            "name": "get_mbti_prompt",
            "description": "Build the analysis prompt for the given answers so the caller can write its own analysis.",
            "arguments": {
                "responses": "object (required): question id string to rating 1-5 or a label such as 'agree'; include '_questions' from get_mbti_questionnaire. Non-numeric keys are ignored."
            },
            "returns": {"text": "the prompt"}
        }),
        "analyze_mbti_responses" => json!({
            "name": "analyze_mbti_responses",
            "description": "Score a complete answer set, resolve the four-letter type and attach a narrative analysis. Every question must be answered.",
            "arguments": {
                "responses": "object (required): same shape as for get_mbti_prompt"
            },
            "returns": {
                "mbti_type": "string",
                "traditional_scores": "object: E_score .. P_score",
                "confidence_scores": "object: EI_confidence .. JP_confidence",
                "dimension_breakdown": "object keyed by axis",
                "llm_analysis": "string: narrative, or a fallback message when the model is unavailable",
                "referenced_questions": "integer[]: ids cited as [Qn](#Qn)",
                "response_count": "integer",
                "analysis_timestamp": "string (RFC 3339)"
            },
            "examples": [{
                "request": {"name": "analyze_mbti_responses", "arguments": {"responses": {"1": 4, "2": 5, "_questions": []}}},
                "error": "Please answer all questions before analysis (2 of 20 answered)."
            }]
        }),
        "detailed_help" => json!({
            "name": "detailed_help",
            "description": "Describe a tool, or list all tools when none is named.",
            "arguments": {
                "tool": "string: tool name",
                "format": "'compact'|'full' (default 'full')"
            },
            "returns": {"name": "string", "arguments": "object", "returns": "object"}
        }),
        _ => return None,
    };
    Some(help)
}

impl MbtiServer {
    /// Handle the detailed_help tool call
    pub async fn handle_detailed_help(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult> {
        let args = request.arguments.unwrap_or_default();
        let format = args
            .get("format")
            .and_then(|v| v.as_str())
            .unwrap_or("full");

        let Some(tool) = args.get("tool").and_then(|v| v.as_str()) else {
            let tools: Vec<Value> = TOOL_NAMES
                .iter()
                .filter_map(|name| tool_help(name))
                .map(|h| json!({"name": h["name"], "description": h["description"]}))
                .collect();
            return Ok(CallToolResult::structured(json!({ "tools": tools })));
        };

        let help = tool_help(tool).ok_or_else(|| MbtiError::Validation {
            message: format!("Unknown tool: {}", tool),
        })?;

        let output = if format == "compact" {
            json!({
                "tool": tool,
                "summary": help.get("description").cloned().unwrap_or(json!("")),
                "arguments": help.get("arguments").cloned().unwrap_or(json!({}))
            })
        } else {
            help
        };

        Ok(CallToolResult::structured(output))
    }
}
