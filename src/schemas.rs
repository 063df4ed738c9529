use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const TOOL_NAMES: [&str; 4] = [
    "get_mbti_questionnaire",
    "get_mbti_prompt",
    "analyze_mbti_responses",
    "detailed_help",
];

pub fn questionnaire_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "length": {
                "type": ["integer", "string"],
                "enum": [20, 40, 60, "20", "40", "60"],
                "default": 20,
                "description": "Number of questions; other values fall back to 20"
            }
        }
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

fn responses_property() -> Value {
    json!({
        "type": "object",
        "description": "Question id (as a string) to rating 1-5 or a label such as 'agree'. Include '_questions' with the question definitions from get_mbti_questionnaire.",
        "properties": {
            "_questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "text": {"type": "string"},
                        "dimension": {"type": "string"}
                    },
                    "required": ["id", "text"]
                }
            }
        },
        "additionalProperties": {"type": ["integer", "number", "string"]}
    })
}

pub fn prompt_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "responses": responses_property()
        },
        "required": ["responses"]
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

pub fn analyze_schema() -> Arc<Map<String, Value>> {
    prompt_schema()
}

pub fn detailed_help_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "tool": {"type": "string", "enum": TOOL_NAMES},
            "format": {"type": "string", "enum": ["compact", "full"], "default": "full"}
        }
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

pub fn questionnaire_output_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "instructions": {
                "type": "object",
                "properties": {
                    "rating_scale": {"type": "string"},
                    "scale_meaning": {"type": "object"},
                    "note": {"type": "string"}
                }
            },
            "questions": {"type": "array", "items": {"type": "object"}},
            "total_questions": {"type": "integer"}
        },
        "required": ["instructions", "questions", "total_questions"]
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

pub fn analyze_output_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "mbti_type": {"type": "string"},
            "traditional_scores": {"type": "object"},
            "confidence_scores": {"type": "object"},
            "dimension_breakdown": {"type": "object"},
            "llm_analysis": {"type": "string"},
            "llm_succeeded": {"type": "boolean"},
            "referenced_questions": {"type": "array", "items": {"type": "integer"}},
            "response_count": {"type": "integer"},
            "analysis_timestamp": {"type": "string"}
        },
        "required": ["mbti_type", "traditional_scores", "confidence_scores", "llm_analysis"]
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

pub fn detailed_help_output_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "tool": {"type": "string"},
            "description": {"type": "string"},
            "summary": {"type": "string"},
            "arguments": {"type": "object"},
            "returns": {"type": "object"},
            "tools": {"type": "array"}
        }
    });
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_tools_require_responses() {
        for schema in [prompt_schema(), analyze_schema()] {
            assert_eq!(schema["required"], json!(["responses"]));
            assert!(schema["properties"]["responses"]["properties"]["_questions"].is_object());
        }
    }

    #[test]
    fn help_enumerates_every_tool() {
        let schema = detailed_help_schema();
        let names = schema["properties"]["tool"]["enum"].as_array().unwrap();
        assert_eq!(names.len(), TOOL_NAMES.len());
    }
}
