//! The individual steps of an analysis run

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, info, warn};

use super::context::{AnalysisContext, PipelineState, Slot};
use super::sources::ResponseSource;
use crate::error::{MbtiError, Result};
use crate::export::{ExportRecord, ExportResults, write_record};
use crate::narrative::{
    NarrativeAugmenter, PromptSubject, build_prompt, referenced_questions, unresolved_references,
};
use crate::questions::{QuestionnaireLength, load_or_default};
use crate::report::{assemble, write_report};
use crate::responses::{ResponseSet, detail_rows};
use crate::scoring::{resolve, score};

/// One transition of the analysis state machine.
///
/// `reads` must already be filled when the stage starts; `writes` is what
/// it fills. The pipeline checks the wiring before running anything.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn reads(&self) -> &'static [Slot];

    fn writes(&self) -> &'static [Slot];

    /// State recorded once this stage completes
    fn reaches(&self) -> PipelineState;

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()>;
}

fn missing(stage: &str, slot: Slot) -> MbtiError {
    MbtiError::Stage {
        stage: stage.to_string(),
        message: format!("{slot} not available"),
    }
}

/// Question set from a saved file, or the catalog tier
pub struct LoadQuestions {
    pub source: Option<PathBuf>,
    pub length: QuestionnaireLength,
}

#[async_trait]
impl Stage for LoadQuestions {
    fn name(&self) -> &'static str {
        "load_questions"
    }

    fn reads(&self) -> &'static [Slot] {
        &[]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Questions]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::QuestionsLoaded
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        ctx.questions = load_or_default(self.source.as_deref(), self.length);
        Ok(())
    }
}

/// Ask a [`ResponseSource`] for every still-unanswered question
pub struct CollectResponses {
    pub source: Arc<dyn ResponseSource>,
}

#[async_trait]
impl Stage for CollectResponses {
    fn name(&self) -> &'static str {
        "collect_responses"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Questions]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::RawResponses]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::ResponsesCollected
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let pending = ctx.pending_questions();
        if pending.is_empty() {
            debug!("all {} questions already answered", ctx.questions.len());
            return Ok(());
        }
        let answers = self.source.collect(&pending, ctx.questions.len()).await?;
        ctx.raw_responses.extend(answers);
        Ok(())
    }
}

/// Raw answers onto the 1..=5 scale; refuses partial or foreign answer sets
pub struct NormalizeResponses;

#[async_trait]
impl Stage for NormalizeResponses {
    fn name(&self) -> &'static str {
        "normalize_responses"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Questions, Slot::RawResponses]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Responses]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::ResponsesNormalized
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let responses = ResponseSet::from_raw(&ctx.raw_responses);
        let unknown = responses.unknown_ids(&ctx.questions);
        if !unknown.is_empty() {
            return Err(MbtiError::Stage {
                stage: self.name().to_string(),
                message: format!("responses reference unknown question ids {:?}", unknown),
            });
        }
        if !responses.is_complete(&ctx.questions) {
            return Err(MbtiError::IncompleteResponses {
                answered: responses.len(),
                total: ctx.questions.len(),
            });
        }
        ctx.responses = Some(responses);
        Ok(())
    }
}

pub struct ScoreResponses;

#[async_trait]
impl Stage for ScoreResponses {
    fn name(&self) -> &'static str {
        "score_responses"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Questions, Slot::Responses]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Scores]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::Scored
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let responses = ctx
            .responses
            .as_ref()
            .ok_or_else(|| missing(self.name(), Slot::Responses))?;
        ctx.scores = Some(score(responses, &ctx.questions));
        Ok(())
    }
}

pub struct ResolveType;

#[async_trait]
impl Stage for ResolveType {
    fn name(&self) -> &'static str {
        "resolve_type"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Scores]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Personality]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::TypeResolved
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let scores = ctx
            .scores
            .as_ref()
            .ok_or_else(|| missing(self.name(), Slot::Scores))?;
        let personality = resolve(scores);
        info!("Resolved type {}", personality.code);
        ctx.personality = Some(personality);
        Ok(())
    }
}

/// Prompt the narrative collaborator. Never fails on collaborator errors.
pub struct BuildNarrative {
    pub augmenter: Arc<NarrativeAugmenter>,
    pub subject: PromptSubject,
}

#[async_trait]
impl Stage for BuildNarrative {
    fn name(&self) -> &'static str {
        "build_narrative"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Questions, Slot::Responses, Slot::Scores]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Narrative]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::NarrativeBuilt
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let scores = ctx
            .scores
            .as_ref()
            .ok_or_else(|| missing(self.name(), Slot::Scores))?;
        let responses = ctx
            .responses
            .as_ref()
            .ok_or_else(|| missing(self.name(), Slot::Responses))?;

        // Before the type is resolved, use the code the scores imply
        let code = match &ctx.personality {
            Some(p) => p.code.clone(),
            None => {
                debug!("type not resolved yet; prompting with the provisional code");
                resolve(scores).code
            }
        };

        let prompt = build_prompt(self.subject, &code, scores, &ctx.questions, responses);
        let outcome = self.augmenter.augment(&prompt).await;

        let refs = referenced_questions(&outcome.text);
        let unresolved = unresolved_references(&refs, &ctx.questions);
        if !unresolved.is_empty() {
            warn!("Narrative cites questions not in this set: {:?}", unresolved);
        }
        debug!("Narrative references {} questions", refs.len());

        ctx.referenced_questions = refs;
        ctx.narrative = Some(outcome);
        Ok(())
    }
}

/// Render the HTML report and write it to `dir`
pub struct AssembleReport {
    pub dir: PathBuf,
}

#[async_trait]
impl Stage for AssembleReport {
    fn name(&self) -> &'static str {
        "assemble_report"
    }

    fn reads(&self) -> &'static [Slot] {
        &[
            Slot::Questions,
            Slot::Responses,
            Slot::Scores,
            Slot::Personality,
            Slot::Narrative,
        ]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::Report, Slot::ReportPath]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::ReportAssembled
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let (Some(personality), Some(scores), Some(responses)) =
            (&ctx.personality, &ctx.scores, &ctx.responses)
        else {
            return Err(missing(self.name(), Slot::Personality));
        };
        let details = detail_rows(&ctx.questions, responses);
        let narrative = ctx.narrative_text().unwrap_or_default();
        let doc = assemble(personality, scores, &details, narrative, Local::now());

        match write_report(&doc, &self.dir) {
            Ok(path) => ctx.report_path = Some(path),
            Err(e) => {
                warn!("Report not saved: {}", e);
                ctx.write_errors.push(e);
            }
        }
        ctx.report = Some(doc);
        Ok(())
    }
}

/// Persist questions, answers and results as JSON in `dir`
pub struct ExportSession {
    pub dir: PathBuf,
}

#[async_trait]
impl Stage for ExportSession {
    fn name(&self) -> &'static str {
        "export_session"
    }

    fn reads(&self) -> &'static [Slot] {
        &[Slot::Questions, Slot::Responses]
    }

    fn writes(&self) -> &'static [Slot] {
        &[Slot::ExportPath]
    }

    fn reaches(&self) -> PipelineState {
        PipelineState::Exported
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        let responses = ctx
            .responses
            .clone()
            .ok_or_else(|| missing(self.name(), Slot::Responses))?;
        let results = ctx.personality.as_ref().map(|p| ExportResults {
            mbti_type: p.code.clone(),
            confidence_scores: p.confidence_map(),
        });
        let mut record = ExportRecord::new(
            ctx.questions.clone(),
            responses,
            results,
            Some(ctx.created_at),
            ctx.session_id,
        );

        match write_record(&mut record, &self.dir, Local::now()) {
            Ok(path) => ctx.export_path = Some(path),
            Err(e) => {
                warn!("Session export failed: {}", e);
                ctx.write_errors.push(e);
            }
        }
        Ok(())
    }
}
