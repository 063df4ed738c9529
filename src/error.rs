//! Domain-specific error types for mbti-flow

use serde_json::json;
use thiserror::Error;

/// Main error type for the questionnaire pipeline and its MCP surface
#[derive(Error, Debug)]
pub enum MbtiError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Persisted questionnaire file has no recognizable question list
    #[error("Format error: {message}")]
    Format { message: String },

    #[error("Incomplete responses: {answered} of {total} questions answered")]
    IncompleteResponses { answered: usize, total: usize },

    /// Narrative collaborator failed or is unavailable
    #[error("Collaborator error: {message}")]
    Collaborator { message: String },

    #[error("Export write error: {path}: {message}")]
    ExportWrite { path: String, message: String },

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("MCP protocol error: {message}")]
    Mcp { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MbtiError {
    /// Message suitable for showing to a person at a terminal or in a tool reply
    pub fn user_message(&self) -> String {
        match self {
            MbtiError::IncompleteResponses { answered, total } => format!(
                "Please answer all questions before analysis ({answered} of {total} answered)."
            ),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for MbtiError {
    fn from(err: anyhow::Error) -> Self {
        MbtiError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MbtiError {
    fn from(err: serde_json::Error) -> Self {
        MbtiError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for MbtiError {
    fn from(err: std::io::Error) -> Self {
        MbtiError::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<rmcp::ErrorData> for MbtiError {
    fn from(err: rmcp::ErrorData) -> Self {
        MbtiError::Mcp {
            message: err.message.to_string(),
        }
    }
}

impl From<reqwest::Error> for MbtiError {
    fn from(err: reqwest::Error) -> Self {
        MbtiError::Collaborator {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Convert MbtiError to MCP error
impl From<MbtiError> for rmcp::ErrorData {
    fn from(err: MbtiError) -> Self {
        let user_message = err.user_message();
        let (code, label, details) = match err {
            MbtiError::Config { message } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "Configuration error",
                message,
            ),
            MbtiError::Format { message } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "Format error",
                message,
            ),
            MbtiError::IncompleteResponses { .. } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "Incomplete responses",
                user_message,
            ),
            MbtiError::Collaborator { message } => (
                rmcp::model::ErrorCode::INTERNAL_ERROR,
                "Collaborator error",
                message,
            ),
            MbtiError::ExportWrite { path, message } => (
                rmcp::model::ErrorCode::INTERNAL_ERROR,
                "Export write error",
                format!("{path}: {message}"),
            ),
            MbtiError::Stage { stage, message } => (
                rmcp::model::ErrorCode::INTERNAL_ERROR,
                "Analysis failed",
                format!("{stage}: {message}"),
            ),
            MbtiError::Mcp { message } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "MCP protocol error",
                message,
            ),
            MbtiError::Serialization { message } => (
                rmcp::model::ErrorCode::INTERNAL_ERROR,
                "Serialization error",
                message,
            ),
            MbtiError::Validation { message } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "Validation error",
                message,
            ),
            MbtiError::InvalidParams { message } => (
                rmcp::model::ErrorCode::INVALID_PARAMS,
                "Invalid parameters",
                message,
            ),
            MbtiError::Internal { message } => (
                rmcp::model::ErrorCode::INTERNAL_ERROR,
                "Internal error",
                message,
            ),
        };

        rmcp::ErrorData {
            code,
            message: format!("{label}: {details}").into(),
            data: Some(json!({ "details": details })),
        }
    }
}

/// Result type alias for mbti-flow operations
pub type Result<T> = std::result::Result<T, MbtiError>;
