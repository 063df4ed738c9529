//! get_mbti_prompt tool handler

use rmcp::model::{CallToolRequestParam, CallToolResult, Content};

use crate::error::{MbtiError, Result};
use crate::narrative::{PromptSubject, build_prompt};
use crate::responses::ResponseSet;
use crate::scoring::{resolve, score};
use crate::server::MbtiServer;
use crate::tools::{ToolResponses, parse_responses_arg};

/// Prompt text for a decoded answer set; partial sets are allowed here
pub fn prompt_for(parsed: &ToolResponses) -> String {
    let responses = ResponseSet::from_raw(&parsed.answers);
    let scores = score(&responses, &parsed.questions);
    let personality = resolve(&scores);
    build_prompt(
        PromptSubject::AiSystem,
        &personality.code,
        &scores,
        &parsed.questions,
        &responses,
    )
}

impl MbtiServer {
    /// Handle the get_mbti_prompt tool call
    pub async fn handle_get_prompt(&self, request: CallToolRequestParam) -> Result<CallToolResult> {
        let args = request.arguments.ok_or_else(|| MbtiError::Mcp {
            message: "Missing parameters".into(),
        })?;
        let parsed = parse_responses_arg(&args)?;
        Ok(CallToolResult::success(vec![Content::text(prompt_for(&parsed))]))
    }
}
