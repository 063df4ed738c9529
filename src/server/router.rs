use crate::server::MbtiServer;
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, InitializeRequestParam,
        InitializeResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo, Tool, ToolsCapability,
    },
    service::{RequestContext, RoleServer},
};
use tracing::info;

/// Tool catalog advertised by `tools/list`
pub fn tool_list() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_mbti_questionnaire".into(),
            title: Some("MBTI Questionnaire".into()),
            description: Some(
                "Get the MBTI questionnaire (20, 40 or 60 statements) with rating instructions"
                    .into(),
            ),
            input_schema: crate::schemas::questionnaire_schema(),
            icons: None,
            annotations: None,
            output_schema: Some(crate::schemas::questionnaire_output_schema()),
            meta: None,
        },
        Tool {
            name: "get_mbti_prompt".into(),
            title: Some("MBTI Analysis Prompt".into()),
            description: Some(
                "Build the analysis prompt for a set of answers so the caller can analyze itself"
                    .into(),
            ),
            input_schema: crate::schemas::prompt_schema(),
            icons: None,
            annotations: None,
            output_schema: None,
            meta: None,
        },
        Tool {
            name: "analyze_mbti_responses".into(),
            title: Some("Analyze MBTI Responses".into()),
            description: Some(
                "Score a complete set of answers, resolve the type and add narrative analysis"
                    .into(),
            ),
            input_schema: crate::schemas::analyze_schema(),
            icons: None,
            annotations: None,
            output_schema: Some(crate::schemas::analyze_output_schema()),
            meta: None,
        },
        Tool {
            name: "detailed_help".into(),
            title: Some("Detailed Help".into()),
            description: Some("Get detailed help for a specific tool".into()),
            input_schema: crate::schemas::detailed_help_schema(),
            icons: None,
            annotations: None,
            output_schema: Some(crate::schemas::detailed_help_output_schema()),
            meta: None,
        },
    ]
}

impl ServerHandler for MbtiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "mbti-flow".to_string(),
                title: Some("MBTI Personality Test Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Call get_mbti_questionnaire, rate every statement 1-5, then pass the answers \
                 (with _questions) to analyze_mbti_responses or get_mbti_prompt."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<InitializeResult, McpError> {
        let mut info = self.get_info();
        info.protocol_version = request.protocol_version.clone();
        Ok(info)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("tools/list requested");
        Ok(ListToolsResult {
            tools: tool_list(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("tools/call {}", request.name);
        match request.name.as_ref() {
            "get_mbti_questionnaire" => self
                .handle_get_questionnaire(request)
                .await
                .map_err(|e| e.into()),
            "get_mbti_prompt" => self
                .handle_get_prompt(request)
                .await
                .map_err(|e| e.into()),
            "analyze_mbti_responses" => self
                .handle_analyze_responses(request)
                .await
                .map_err(|e| e.into()),
            "detailed_help" => self
                .handle_detailed_help(request)
                .await
                .map_err(|e| e.into()),
            _ => Err(McpError {
                code: rmcp::model::ErrorCode::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", request.name).into(),
                data: None,
            }),
        }
    }
}
