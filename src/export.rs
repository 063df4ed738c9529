//! Flat-file session export and reload

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{MbtiError, Result};
use crate::questions::{Question, extract_questions};
use crate::report::file_safe;
use crate::responses::{RawResponse, ResponseSet, parse_keyed_responses};

pub const EXPORT_VERSION: &str = "1.0";

/// Highest numeric suffix tried before giving up on a filename
const MAX_NAME_SUFFIX: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireSnapshot {
    pub questions: Vec<Question>,
    pub responses: ResponseSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResults {
    pub mbti_type: String,
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, f64>,
}

/// Timestamps are ISO-8601 strings so files from other writers still load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

/// On-disk document: `{questionnaire, results?, metadata}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub questionnaire: QuestionnaireSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ExportResults>,
    pub metadata: ExportMetadata,
}

impl ExportRecord {
    pub fn new(
        questions: Vec<Question>,
        responses: ResponseSet,
        results: Option<ExportResults>,
        created_at: Option<DateTime<Local>>,
        session_id: Uuid,
    ) -> Self {
        let completed = responses.is_complete(&questions);
        Self {
            questionnaire: QuestionnaireSnapshot {
                questions,
                responses,
            },
            results,
            metadata: ExportMetadata {
                version: EXPORT_VERSION.to_string(),
                created_at: created_at.map(|t| t.to_rfc3339()),
                saved_at: None,
                exported_at: None,
                completed,
                session_id: Some(session_id),
            },
        }
    }

    /// `mbti_questionnaire_<TYPE>_<YYYYmmdd_HHMMSS>`, `UNKNOWN` when untyped
    pub fn file_stem(&self, at: DateTime<Local>) -> String {
        let code = self
            .results
            .as_ref()
            .map(|r| file_safe(&r.mbti_type))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        format!("mbti_questionnaire_{}_{}", code, at.format("%Y%m%d_%H%M%S"))
    }
}

/// Create `<stem>.<ext>` in `dir`, or `<stem>_2.<ext>` and so on if taken.
/// Existing files are never touched.
pub(crate) fn write_new_file(dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
    let write_err = |path: &Path, e: std::io::Error| MbtiError::ExportWrite {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    std::fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;

    for n in 1..=MAX_NAME_SUFFIX {
        let name = if n == 1 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{n}.{ext}")
        };
        let path = dir.join(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(write_err(&path, e)),
        };
        file.write_all(bytes).map_err(|e| write_err(&path, e))?;
        return Ok(path);
    }

    Err(MbtiError::ExportWrite {
        path: dir.join(format!("{stem}.{ext}")).display().to_string(),
        message: "no free filename".into(),
    })
}

/// Stamp and write the record as pretty JSON
pub fn write_record(record: &mut ExportRecord, dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    let stamp = at.to_rfc3339();
    record.metadata.saved_at = Some(stamp.clone());
    if record.metadata.completed {
        record.metadata.exported_at = Some(stamp);
    }
    let body = serde_json::to_vec_pretty(record)?;
    let path = write_new_file(dir, &record.file_stem(at), "json", &body)?;
    tracing::info!(
        "Questionnaire saved to {} ({} of {} answered)",
        path.display(),
        record.questionnaire.responses.len(),
        record.questionnaire.questions.len()
    );
    Ok(path)
}

/// What a saved file gives back for re-entry
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub questions: Vec<Question>,
    pub responses: BTreeMap<u32, RawResponse>,
    pub completed: bool,
    pub mbti_type: Option<String>,
    pub session_id: Option<Uuid>,
    pub created_at: Option<String>,
}

impl LoadedSession {
    /// Questions with no saved answer, in order
    pub fn unanswered(&self) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| !self.responses.contains_key(&q.id))
            .collect()
    }
}

/// Parse a saved document in either the nested or the flat shape
pub fn parse_session(doc: &Value) -> Result<LoadedSession> {
    let questions = extract_questions(doc)?;

    let responses = doc
        .get("questionnaire")
        .and_then(|q| q.get("responses"))
        .or_else(|| doc.get("responses"))
        .and_then(Value::as_object)
        .map(parse_keyed_responses)
        .unwrap_or_default();

    // Derived from the data; a stored `completed` flag may be stale or absent
    let metadata = doc.get("metadata");
    let completed = questions.iter().all(|q| responses.contains_key(&q.id));

    Ok(LoadedSession {
        completed,
        mbti_type: doc
            .get("results")
            .and_then(|r| r.get("mbti_type"))
            .and_then(Value::as_str)
            .map(str::to_string),
        session_id: metadata
            .and_then(|m| m.get("session_id"))
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok()),
        created_at: metadata
            .and_then(|m| m.get("created_at"))
            .and_then(Value::as_str)
            .map(str::to_string),
        questions,
        responses,
    })
}

pub fn load_session(path: &Path) -> Result<LoadedSession> {
    let content = std::fs::read_to_string(path).map_err(|e| MbtiError::Format {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    let doc: Value = serde_json::from_str(&content).map_err(|e| MbtiError::Format {
        message: format!("{} is not valid JSON: {}", path.display(), e),
    })?;
    let session = parse_session(&doc)?;
    tracing::info!(
        "Loaded session from {} ({} of {} answered)",
        path.display(),
        session.responses.len(),
        session.questions.len()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{QuestionnaireLength, questions_for};
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn export_then_load_preserves_questions_and_responses() {
        let dir = tempfile::tempdir().unwrap();
        let questions = questions_for(QuestionnaireLength::Forty);
        let responses: ResponseSet = questions
            .iter()
            .map(|q| (q.id, (q.id % 5 + 1) as u8))
            .collect();
        let session_id = Uuid::new_v4();
        let mut record = ExportRecord::new(
            questions.clone(),
            responses.clone(),
            Some(ExportResults {
                mbti_type: "INTJ".into(),
                confidence_scores: BTreeMap::new(),
            }),
            Some(at()),
            session_id,
        );
        let path = write_record(&mut record, dir.path(), at()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "mbti_questionnaire_INTJ_20240501_093000.json"
        );

        let loaded = load_session(&path).unwrap();
        assert_eq!(loaded.questions, questions);
        assert_eq!(ResponseSet::from_raw(&loaded.responses), responses);
        assert!(loaded.completed);
        assert_eq!(loaded.mbti_type.as_deref(), Some("INTJ"));
        assert_eq!(loaded.session_id, Some(session_id));
        assert!(loaded.unanswered().is_empty());
    }

    #[test]
    fn partial_session_lists_unanswered_questions() {
        let dir = tempfile::tempdir().unwrap();
        let questions = questions_for(QuestionnaireLength::Twenty);
        let responses: ResponseSet = (1..=7).map(|id| (id, 4)).collect();
        let mut record = ExportRecord::new(questions, responses, None, None, Uuid::new_v4());
        assert!(!record.metadata.completed);
        let path = write_record(&mut record, dir.path(), at()).unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("mbti_questionnaire_UNKNOWN_")
        );
        assert!(record.metadata.exported_at.is_none());

        let loaded = load_session(&path).unwrap();
        assert!(!loaded.completed);
        let pending: Vec<u32> = loaded.unanswered().iter().map(|q| q.id).collect();
        assert_eq!(pending, (8..=20).collect::<Vec<_>>());
    }

    #[test]
    fn flat_shape_with_string_answers_loads() {
        let doc = json!({
            "questions": [
                {"id": 1, "text": "a", "dimension": "E"},
                {"id": 2, "text": "b", "dimension": "I"}
            ],
            "responses": {"1": "agree", "2": 2, "note": "x"}
        });
        let loaded = parse_session(&doc).unwrap();
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.responses.len(), 2);
        assert_eq!(ResponseSet::from_raw(&loaded.responses).get(1), Some(4));
        assert!(loaded.completed);
    }

    #[test]
    fn missing_question_list_is_a_format_error() {
        let doc = json!({"responses": {"1": 3}});
        assert!(matches!(parse_session(&doc), Err(MbtiError::Format { .. })));
    }

    #[test]
    fn same_second_exports_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_new_file(dir.path(), "x", "json", b"1").unwrap();
        let b = write_new_file(dir.path(), "x", "json", b"2").unwrap();
        assert_eq!(b.file_name().unwrap().to_string_lossy(), "x_2.json");
        assert_eq!(std::fs::read(&a).unwrap(), b"1");
    }

    #[test]
    fn unwritable_directory_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let err = write_new_file(&blocker.join("sub"), "x", "json", b"1").unwrap_err();
        assert!(matches!(err, MbtiError::ExportWrite { .. }));
    }
}
