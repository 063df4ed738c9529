//! Saving partial and finished sessions, then loading them back.

use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use mbti_flow::error::MbtiError;
use mbti_flow::export::{ExportRecord, ExportResults, load_session, write_record};
use mbti_flow::questions::{QuestionnaireLength, questions_for};
use mbti_flow::responses::{RawResponse, ResponseSet};
use serde_json::json;
use uuid::Uuid;

#[test]
fn partial_session_reloads_with_pending_questions() {
    let dir = tempfile::tempdir().unwrap();
    let questions = questions_for(QuestionnaireLength::Twenty);
    let mut responses = ResponseSet::new();
    for id in 1..=8 {
        responses.insert(id, if id % 2 == 0 { 5 } else { 2 });
    }
    let session_id = Uuid::new_v4();
    let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

    let mut record = ExportRecord::new(questions.clone(), responses, None, Some(at), session_id);
    let path = write_record(&mut record, dir.path(), at).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "mbti_questionnaire_UNKNOWN_20260301_093000.json"
    );

    let loaded = load_session(&path).unwrap();
    assert!(!loaded.completed);
    assert_eq!(loaded.questions, questions);
    assert_eq!(loaded.responses.len(), 8);
    assert_eq!(loaded.responses.get(&2), Some(&RawResponse::Integer(5)));
    assert_eq!(loaded.unanswered().len(), 12);
    assert_eq!(loaded.unanswered()[0].id, 9);
    assert_eq!(loaded.session_id, Some(session_id));
    assert!(loaded.mbti_type.is_none());
}

#[test]
fn completed_session_keeps_results_and_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let questions = questions_for(QuestionnaireLength::Twenty);
    let responses: ResponseSet = questions.iter().map(|q| (q.id, 4u8)).collect();
    let results = ExportResults {
        mbti_type: "ESTJ".into(),
        confidence_scores: BTreeMap::from([("EI_confidence".to_string(), 0.2)]),
    };
    let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

    let mut first = ExportRecord::new(
        questions.clone(),
        responses.clone(),
        Some(results.clone()),
        None,
        Uuid::new_v4(),
    );
    let mut second = first.clone();
    let a = write_record(&mut first, dir.path(), at).unwrap();
    let b = write_record(&mut second, dir.path(), at).unwrap();
    assert_ne!(a, b);
    assert!(b.to_str().unwrap().ends_with("_2.json"));
    assert!(first.metadata.exported_at.is_some());

    let loaded = load_session(&a).unwrap();
    assert!(loaded.completed);
    assert_eq!(loaded.mbti_type.as_deref(), Some("ESTJ"));
    assert_eq!(
        ResponseSet::from_raw(&loaded.responses),
        responses,
        "answers survive the round trip"
    );
}

#[test]
fn flat_layout_from_other_writers_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.json");
    let doc = json!({
        "questions": [
            {"id": 1, "text": "I enjoy parties", "dimension": "E"},
            {"id": 2, "text": "I like quiet evenings", "dimension": "I"}
        ],
        "responses": {"1": "agree", "2": 2, "note": "ignored"},
        "metadata": {"completed": true}
    });
    std::fs::write(&path, doc.to_string()).unwrap();

    let loaded = load_session(&path).unwrap();
    assert_eq!(loaded.questions.len(), 2);
    assert_eq!(loaded.responses.len(), 2);
    assert_eq!(loaded.responses[&1], RawResponse::Text("agree".into()));
    assert!(loaded.completed);
}

#[test]
fn completion_follows_answers_not_stored_flag() {
    let dir = tempfile::tempdir().unwrap();
    let questions = json!([
        {"id": 1, "text": "I enjoy parties", "dimension": "E"},
        {"id": 2, "text": "I like quiet evenings", "dimension": "I"}
    ]);

    let unflagged = dir.path().join("unflagged.json");
    let doc = json!({
        "questionnaire": {"questions": questions, "responses": {"1": 4, "2": 2}},
        "metadata": {"version": "1.0"}
    });
    std::fs::write(&unflagged, doc.to_string()).unwrap();
    assert!(load_session(&unflagged).unwrap().completed);

    let stale = dir.path().join("stale.json");
    let doc = json!({
        "questionnaire": {"questions": questions, "responses": {"1": 4, "2": 2}},
        "metadata": {"completed": false}
    });
    std::fs::write(&stale, doc.to_string()).unwrap();
    assert!(load_session(&stale).unwrap().completed);

    let overclaimed = dir.path().join("overclaimed.json");
    let doc = json!({
        "questionnaire": {"questions": questions, "responses": {"1": 4}},
        "metadata": {"completed": true}
    });
    std::fs::write(&overclaimed, doc.to_string()).unwrap();
    assert!(!load_session(&overclaimed).unwrap().completed);
}

#[test]
fn bad_files_are_format_errors() {
    let dir = tempfile::tempdir().unwrap();

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{not json").unwrap();
    assert!(matches!(
        load_session(&garbage),
        Err(MbtiError::Format { .. })
    ));

    let no_questions = dir.path().join("empty.json");
    std::fs::write(&no_questions, r#"{"responses": {"1": 3}}"#).unwrap();
    assert!(matches!(
        load_session(&no_questions),
        Err(MbtiError::Format { .. })
    ));

    assert!(matches!(
        load_session(&dir.path().join("missing.json")),
        Err(MbtiError::Format { .. })
    ));
}
