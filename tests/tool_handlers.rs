//! Tool handlers called directly, the way the router dispatches them.

use std::sync::Arc;

use mbti_flow::config::Config;
use mbti_flow::error::MbtiError;
use mbti_flow::narrative::{ScriptedGenerator, UnavailableGenerator};
use mbti_flow::server::MbtiServer;
use rmcp::model::{CallToolRequestParam, CallToolResult, ErrorCode};
use serde_json::{Value, json};

fn request(name: &str, arguments: Value) -> CallToolRequestParam {
    serde_json::from_value(json!({ "name": name, "arguments": arguments })).unwrap()
}

fn server_replying(reply: &str) -> MbtiServer {
    MbtiServer::with_generator(
        Config::default(),
        Arc::new(ScriptedGenerator::replying(reply)),
    )
}

fn structured(result: &CallToolResult) -> Value {
    result.structured_content.clone().unwrap()
}

async fn questionnaire(server: &MbtiServer, length: Value) -> Value {
    let result = server
        .handle_get_questionnaire(request("get_mbti_questionnaire", json!({ "length": length })))
        .await
        .unwrap();
    structured(&result)
}

/// Answer every statement of the served questionnaire, E/N/T/J agree
fn answers_for(payload: &Value) -> Value {
    let questions = payload["questions"].clone();
    let mut responses = serde_json::Map::new();
    for q in questions.as_array().unwrap() {
        let agree = matches!(q["dimension"].as_str(), Some("E" | "N" | "T" | "J"));
        responses.insert(
            q["id"].to_string(),
            if agree { json!("strongly_agree") } else { json!(1) },
        );
    }
    responses.insert("_questions".into(), questions);
    Value::Object(responses)
}

#[tokio::test]
async fn questionnaire_lengths_and_fallback() {
    let server = server_replying("x");
    assert_eq!(questionnaire(&server, json!(60)).await["total_questions"], 60);
    assert_eq!(questionnaire(&server, json!("40")).await["total_questions"], 40);
    assert_eq!(questionnaire(&server, json!(25)).await["total_questions"], 20);

    let default = server
        .handle_get_questionnaire(request("get_mbti_questionnaire", json!({})))
        .await
        .unwrap();
    assert_eq!(structured(&default)["total_questions"], 20);
}

#[tokio::test]
async fn analyze_scores_and_reports_narrative() {
    let server = server_replying("Decisive, see [Q3](#Q3) and [Q99](#Q99).");
    let payload = questionnaire(&server, json!(20)).await;

    let result = server
        .handle_analyze_responses(request(
            "analyze_mbti_responses",
            json!({ "responses": answers_for(&payload) }),
        ))
        .await
        .unwrap();
    let out = structured(&result);

    assert_eq!(out["mbti_type"], "ENTJ");
    assert_eq!(out["response_count"], 20);
    assert_eq!(out["llm_succeeded"], true);
    assert_eq!(out["referenced_questions"], json!([3, 99]));
    assert!(out["traditional_scores"]["E_score"].as_f64().unwrap() > 0.75);
    assert!(out["confidence_scores"]["EI_confidence"].as_f64().unwrap() > 0.5);
    assert_eq!(out["dimension_breakdown"]["thinking_feeling"]["preference"], "T");
    assert!(out["analysis_timestamp"].is_string());
}

#[tokio::test]
async fn analyze_without_collaborator_still_returns_type() {
    let server = MbtiServer::with_generator(
        Config::default(),
        Arc::new(UnavailableGenerator::new("no key configured")),
    );
    let payload = questionnaire(&server, json!(20)).await;
    let result = server
        .handle_analyze_responses(request(
            "analyze_mbti_responses",
            json!({ "responses": answers_for(&payload) }),
        ))
        .await
        .unwrap();
    let out = structured(&result);
    assert_eq!(out["mbti_type"], "ENTJ");
    assert_eq!(out["llm_succeeded"], false);
    assert!(
        out["llm_analysis"]
            .as_str()
            .unwrap()
            .contains("no key configured")
    );
}

#[tokio::test]
async fn analyze_rejects_partial_answers() {
    let server = server_replying("x");
    let payload = questionnaire(&server, json!(20)).await;
    let mut responses = answers_for(&payload);
    responses.as_object_mut().unwrap().remove("20");

    let err = server
        .handle_analyze_responses(request(
            "analyze_mbti_responses",
            json!({ "responses": responses }),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MbtiError::IncompleteResponses {
            answered: 19,
            total: 20
        }
    ));

    let wire: rmcp::ErrorData = err.into();
    assert_eq!(wire.code, ErrorCode::INVALID_PARAMS);
    assert!(wire.message.contains("19 of 20"));
}

#[tokio::test]
async fn non_numeric_keys_are_ignored() {
    let server = server_replying("x");
    let payload = questionnaire(&server, json!(20)).await;
    let mut responses = answers_for(&payload);
    let obj = responses.as_object_mut().unwrap();
    obj.insert("comment".into(), json!("ignore me"));
    obj.insert("Q7".into(), json!(5));

    let result = server
        .handle_analyze_responses(request(
            "analyze_mbti_responses",
            json!({ "responses": responses }),
        ))
        .await
        .unwrap();
    assert_eq!(structured(&result)["response_count"], 20);
}

#[tokio::test]
async fn unknown_question_ids_are_invalid_params() {
    let server = server_replying("x");
    let err = server
        .handle_analyze_responses(request(
            "analyze_mbti_responses",
            json!({ "responses": {"1": 4, "75": 2} }),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, MbtiError::InvalidParams { .. }));
}

#[tokio::test]
async fn prompt_lists_answers_and_scores() {
    let server = server_replying("x");
    let payload = questionnaire(&server, json!(20)).await;

    let result = server
        .handle_get_prompt(request(
            "get_mbti_prompt",
            json!({ "responses": answers_for(&payload) }),
        ))
        .await
        .unwrap();
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content["text"].as_str().unwrap();

    assert!(text.contains("an AI system"));
    assert!(text.contains("**Strongly Agree**"));
    assert!(text.contains("Traditional scoring results:"));
    assert!(text.contains("[Q1](#Q1)"));
}

#[tokio::test]
async fn prompt_accepts_partial_answers() {
    let server = server_replying("x");
    let result = server
        .handle_get_prompt(request("get_mbti_prompt", json!({ "responses": {"1": 5} })))
        .await
        .unwrap();
    assert_eq!(result.content.len(), 1);
}

#[tokio::test]
async fn missing_arguments_are_rejected() {
    let server = server_replying("x");
    let req: CallToolRequestParam =
        serde_json::from_value(json!({ "name": "analyze_mbti_responses" })).unwrap();
    assert!(server.handle_analyze_responses(req).await.is_err());

    let err = server
        .handle_get_prompt(request("get_mbti_prompt", json!({ "responses": [1, 2] })))
        .await
        .unwrap_err();
    assert!(matches!(err, MbtiError::InvalidParams { .. }));
}

#[tokio::test]
async fn detailed_help_lists_and_describes() {
    let server = server_replying("x");
    let all = server
        .handle_detailed_help(request("detailed_help", json!({})))
        .await
        .unwrap();
    assert_eq!(structured(&all)["tools"].as_array().unwrap().len(), 4);

    let compact = server
        .handle_detailed_help(request(
            "detailed_help",
            json!({ "tool": "analyze_mbti_responses", "format": "compact" }),
        ))
        .await
        .unwrap();
    assert_eq!(structured(&compact)["tool"], "analyze_mbti_responses");

    assert!(
        server
            .handle_detailed_help(request("detailed_help", json!({ "tool": "think_convo" })))
            .await
            .is_err()
    );
}
