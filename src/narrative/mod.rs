//! Narrative augmentation: prompt construction and the retrying collaborator call

pub mod providers;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NarrativeConfig;
use crate::questions::Question;
use crate::responses::{ResponseSet, detail_rows};
use crate::scoring::{DimensionScores, axis_summary};

pub use providers::{
    ChatCompletionsGenerator, ScriptedGenerator, TextGenerator, UnavailableGenerator,
    create_generator,
};

/// Who the respondent is, as phrased in the prompt header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptSubject {
    #[default]
    Person,
    AiSystem,
}

impl PromptSubject {
    fn phrase(&self) -> &'static str {
        match self {
            PromptSubject::Person => "someone",
            PromptSubject::AiSystem => "an AI system",
        }
    }
}

/// Assemble the analysis prompt.
///
/// Every question is listed in order with its dimension, text and answer
/// label (unanswered rows read as Neutral), then the per-axis breakdown,
/// then the six-part rubric and the anchor-link instruction. Deterministic
/// for identical inputs.
pub fn build_prompt(
    subject: PromptSubject,
    type_code: &str,
    scores: &DimensionScores,
    questions: &[Question],
    responses: &ResponseSet,
) -> String {
    let formatted: Vec<String> = detail_rows(questions, responses)
        .into_iter()
        .map(|row| {
            format!(
                "Q{} ({}): {} - **{}**",
                row.id, row.dimension, row.text, row.response
            )
        })
        .collect();
    let dimension_info = axis_summary(scores);
    let t = type_code;

    format!(
        "
You are analyzing MBTI questionnaire responses for {subject} determined to be {t} type.

Here are their EXACT responses to each question:

{responses}

Traditional scoring results:
{dimensions}

IMPORTANT: You have been provided with the complete set of questions and responses above. Please analyze these SPECIFIC responses.

Provide a detailed analysis that:

1. **Response Pattern Analysis**: Identify which responses strongly support the {t} determination and which might seem unexpected. Reference specific questions (e.g., \"Q5 shows...\", \"Your response to Q12 indicates...\").

2. **Characteristic Alignment**: Explain how their responses align with typical {t} characteristics, citing specific questions as evidence.

3. **Out-of-Character Responses**: Point out any responses that seem inconsistent with typical {t} patterns and provide possible explanations.

4. **Behavioral Patterns**: Describe key behavioral patterns shown through their responses, referencing the relevant questions.

5. **Strengths & Growth Areas**: Based on their specific responses, identify strengths they demonstrate and areas for potential growth.

6. **Communication & Work Style**: Infer their communication and work preferences from their question responses.

Must reference the actual questions provided above throughout your analysis using markdown anchor links like [Q1](#Q1), [Q2](#Q2), etc. This will create clickable links to the specific questions in the report. Do not make assumptions about questions not provided.
",
        subject = subject.phrase(),
        responses = formatted.join("\n"),
        dimensions = dimension_info.join("\n"),
    )
}

static QUESTION_REF: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\[Q(\d+)\]\(#Q(\d+)\)").expect("static regex")
});

/// Question ids cited as `[Qn](#Qn)` anchors, ascending and deduplicated.
/// Links whose label and target disagree are skipped.
pub fn referenced_questions(text: &str) -> Vec<u32> {
    let ids: BTreeSet<u32> = QUESTION_REF
        .captures_iter(text)
        .filter(|c| c[1] == c[2])
        .filter_map(|c| c[1].parse().ok())
        .collect();
    ids.into_iter().collect()
}

/// Referenced ids that the question set does not contain
pub fn unresolved_references(references: &[u32], questions: &[Question]) -> Vec<u32> {
    references
        .iter()
        .filter(|id| !questions.iter().any(|q| q.id == **id))
        .copied()
        .collect()
}

/// Result of one augmentation; `succeeded == false` means `text` is the fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeOutcome {
    pub text: String,
    pub succeeded: bool,
    pub attempts: u32,
}

/// Calls the collaborator with bounded retries, never failing outward
pub struct NarrativeAugmenter {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl NarrativeAugmenter {
    pub fn new(generator: Arc<dyn TextGenerator>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.clamp(1, 10),
            retry_delay,
        }
    }

    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &NarrativeConfig) -> Self {
        Self::new(
            generator,
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_available()
    }

    /// Raw collaborator output on success, a fallback description otherwise
    pub async fn augment(&self, prompt: &str) -> NarrativeOutcome {
        if !self.generator.is_available() {
            let reason = match self.generator.generate(prompt).await {
                Err(e) => e.to_string(),
                Ok(_) => "collaborator unavailable".to_string(),
            };
            info!("Narrative collaborator unavailable; using fallback text");
            return NarrativeOutcome {
                text: fallback_text(&reason),
                succeeded: false,
                attempts: 0,
            };
        }

        let mut last_err = String::new();
        for attempt in 0..self.max_attempts {
            match self.generator.generate(prompt).await {
                Ok(text) => {
                    info!(
                        "Narrative generated by {} on attempt {}",
                        self.generator.name(),
                        attempt + 1
                    );
                    return NarrativeOutcome {
                        text,
                        succeeded: true,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    warn!(
                        "Narrative attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    last_err = e.to_string();
                    if attempt + 1 < self.max_attempts && !self.retry_delay.is_zero() {
                        let backoff = self.retry_delay.saturating_mul(1 << attempt.min(6));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        warn!("Narrative generation gave up after {} attempts", self.max_attempts);
        NarrativeOutcome {
            text: fallback_text(&last_err),
            succeeded: false,
            attempts: self.max_attempts,
        }
    }
}

fn fallback_text(reason: &str) -> String {
    format!(
        "LLM analysis unavailable: {reason}\n\nThe type and dimension scores above come from traditional scoring only."
    )
}
