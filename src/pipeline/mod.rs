//! Sequenced analysis: load, collect, normalize, score, resolve, narrate,
//! report, export.

pub mod context;
pub mod sources;
pub mod stages;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

pub use context::{AnalysisContext, PipelineState, Slot};
pub use sources::{LineResponses, PresetResponses, ResponseSource};
pub use stages::{
    AssembleReport, BuildNarrative, CollectResponses, ExportSession, LoadQuestions,
    NormalizeResponses, ResolveType, ScoreResponses, Stage,
};

use crate::error::{MbtiError, Result};
use crate::narrative::{NarrativeAugmenter, PromptSubject};
use crate::questions::QuestionnaireLength;

/// Shared settings for the narrative and output stages
#[derive(Clone)]
pub struct PipelineOptions {
    pub augmenter: Arc<NarrativeAugmenter>,
    pub subject: PromptSubject,
    pub output_dir: PathBuf,
}

/// Ordered stages run one after another against a single context
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Every stage, canonical order
    pub fn full(
        questions_file: Option<PathBuf>,
        length: QuestionnaireLength,
        source: Arc<dyn ResponseSource>,
        options: PipelineOptions,
    ) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(LoadQuestions {
                source: questions_file,
                length,
            }),
            Box::new(CollectResponses { source }),
        ];
        stages.extend(Self::analysis_stages(&options, false));
        Self::new(stages)
    }

    /// Questions already in the context; ask only what is unanswered
    pub fn resume(source: Arc<dyn ResponseSource>, options: PipelineOptions) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(CollectResponses { source })];
        stages.extend(Self::analysis_stages(&options, false));
        Self::new(stages)
    }

    /// Questions and answers supplied by the caller
    pub fn prepopulated(options: PipelineOptions) -> Self {
        Self::new(Self::analysis_stages(&options, false))
    }

    /// Like [`Pipeline::prepopulated`] with the narrative built before the
    /// type is resolved
    pub fn narrative_first(options: PipelineOptions) -> Self {
        Self::new(Self::analysis_stages(&options, true))
    }

    /// Normalize through narrative; nothing is written to disk
    pub fn in_memory(augmenter: Arc<NarrativeAugmenter>, subject: PromptSubject) -> Self {
        Self::new(vec![
            Box::new(NormalizeResponses),
            Box::new(ScoreResponses),
            Box::new(ResolveType),
            Box::new(BuildNarrative { augmenter, subject }),
        ])
    }

    fn analysis_stages(options: &PipelineOptions, narrative_first: bool) -> Vec<Box<dyn Stage>> {
        let narrative: Box<dyn Stage> = Box::new(BuildNarrative {
            augmenter: options.augmenter.clone(),
            subject: options.subject,
        });
        let mut stages: Vec<Box<dyn Stage>> =
            vec![Box::new(NormalizeResponses), Box::new(ScoreResponses)];
        if narrative_first {
            stages.push(narrative);
            stages.push(Box::new(ResolveType));
        } else {
            stages.push(Box::new(ResolveType));
            stages.push(narrative);
        }
        stages.push(Box::new(AssembleReport {
            dir: options.output_dir.clone(),
        }));
        stages.push(Box::new(ExportSession {
            dir: options.output_dir.clone(),
        }));
        stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn collects_responses(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.writes().contains(&Slot::RawResponses))
    }

    /// Every stage's inputs must be filled by the context or an earlier stage
    pub fn validate(&self, ctx: &AnalysisContext) -> Result<()> {
        let mut available = ctx.filled();
        for stage in &self.stages {
            if let Some(slot) = stage.reads().iter().find(|s| !available.contains(s)) {
                return Err(MbtiError::Stage {
                    stage: stage.name().to_string(),
                    message: format!("{slot} not available before this stage"),
                });
            }
            available.extend(stage.writes().iter().copied());
        }
        Ok(())
    }

    /// Run every stage in order. The first failing stage aborts the run and
    /// leaves the context as that stage found it.
    pub async fn run(&self, ctx: &mut AnalysisContext) -> Result<()> {
        // Externally supplied answers must be complete before anything starts
        if !self.collects_responses() && !ctx.questions.is_empty() {
            let answered = ctx.answered();
            if answered < ctx.questions.len() {
                return Err(MbtiError::IncompleteResponses {
                    answered,
                    total: ctx.questions.len(),
                });
            }
        }
        self.validate(ctx)?;

        info!(
            "Starting analysis {} ({} stages)",
            ctx.session_id,
            self.stages.len()
        );
        for stage in &self.stages {
            debug!("stage {} starting", stage.name());
            stage.run(ctx).await.map_err(|e| match e {
                MbtiError::IncompleteResponses { .. } | MbtiError::Stage { .. } => e,
                other => MbtiError::Stage {
                    stage: stage.name().to_string(),
                    message: other.to_string(),
                },
            })?;
            ctx.state = stage.reaches();
            debug!("stage {} done, state {:?}", stage.name(), ctx.state);
        }
        info!(
            "Analysis {} finished: type={}",
            ctx.session_id,
            ctx.type_code().unwrap_or("-")
        );
        Ok(())
    }
}
