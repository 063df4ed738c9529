use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::error::MbtiError;
use crate::narrative::NarrativeOutcome;
use crate::questions::Question;
use crate::report::ReportDocument;
use crate::responses::{RawResponse, ResponseSet};
use crate::scoring::{DimensionScores, PersonalityType};

/// Where a run has got to; set from the last completed stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Created,
    QuestionsLoaded,
    ResponsesCollected,
    ResponsesNormalized,
    Scored,
    TypeResolved,
    NarrativeBuilt,
    ReportAssembled,
    Exported,
}

/// Pieces of the context a stage can read or fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Questions,
    RawResponses,
    Responses,
    Scores,
    Personality,
    Narrative,
    Report,
    ReportPath,
    ExportPath,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Questions => "questions",
            Slot::RawResponses => "raw responses",
            Slot::Responses => "normalized responses",
            Slot::Scores => "dimension scores",
            Slot::Personality => "personality type",
            Slot::Narrative => "narrative",
            Slot::Report => "report",
            Slot::ReportPath => "report path",
            Slot::ExportPath => "export path",
        };
        f.write_str(name)
    }
}

/// Everything one analysis run produces, owned by the caller and lent to
/// each stage in turn.
#[derive(Debug)]
pub struct AnalysisContext {
    pub session_id: Uuid,
    pub created_at: DateTime<Local>,
    pub state: PipelineState,
    pub questions: Vec<Question>,
    pub raw_responses: BTreeMap<u32, RawResponse>,
    pub responses: Option<ResponseSet>,
    pub scores: Option<DimensionScores>,
    pub personality: Option<PersonalityType>,
    pub narrative: Option<NarrativeOutcome>,
    /// Ids cited as `[Qn](#Qn)` in the narrative
    pub referenced_questions: Vec<u32>,
    pub report: Option<ReportDocument>,
    pub report_path: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
    /// Durable writes that failed; the run still completes
    pub write_errors: Vec<MbtiError>,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Local::now(),
            state: PipelineState::Created,
            questions: Vec::new(),
            raw_responses: BTreeMap::new(),
            responses: None,
            scores: None,
            personality: None,
            narrative: None,
            referenced_questions: Vec::new(),
            report: None,
            report_path: None,
            export_path: None,
            write_errors: Vec::new(),
        }
    }

    /// Context with questions and answers already supplied by the caller
    pub fn prepopulated(questions: Vec<Question>, raw_responses: BTreeMap<u32, RawResponse>) -> Self {
        Self {
            questions,
            raw_responses,
            ..Self::new()
        }
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = session_id;
        self
    }

    /// Slots currently holding a value
    pub fn filled(&self) -> BTreeSet<Slot> {
        let mut slots = BTreeSet::new();
        if !self.questions.is_empty() {
            slots.insert(Slot::Questions);
        }
        if !self.raw_responses.is_empty() {
            slots.insert(Slot::RawResponses);
        }
        let checks = [
            (Slot::Responses, self.responses.is_some()),
            (Slot::Scores, self.scores.is_some()),
            (Slot::Personality, self.personality.is_some()),
            (Slot::Narrative, self.narrative.is_some()),
            (Slot::Report, self.report.is_some()),
            (Slot::ReportPath, self.report_path.is_some()),
            (Slot::ExportPath, self.export_path.is_some()),
        ];
        slots.extend(checks.into_iter().filter(|(_, set)| *set).map(|(s, _)| s));
        slots
    }

    /// Answers to ids in the question set
    pub fn answered(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.raw_responses.contains_key(&q.id))
            .count()
    }

    /// Questions without a raw answer, in order
    pub fn pending_questions(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| !self.raw_responses.contains_key(&q.id))
            .cloned()
            .collect()
    }

    pub fn type_code(&self) -> Option<&str> {
        self.personality.as_ref().map(|p| p.code.as_str())
    }

    pub fn narrative_text(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.text.as_str())
    }
}
