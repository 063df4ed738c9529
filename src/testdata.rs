//! Synthetic respondents for smoke runs

use rand::Rng;
use rand::seq::SliceRandom;

use crate::questions::Question;
use crate::responses::{NEUTRAL, ResponseSet};

/// Types with a response pattern; anything else uses the first
pub const PATTERN_TYPES: [&str; 4] = ["INTJ", "ENFP", "ISTJ", "ESTP"];

/// Share of answers drawn uniformly from 1..=5 instead of the pattern
pub const DEFAULT_NOISE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResponses {
    pub target_type: String,
    pub responses: ResponseSet,
}

fn pattern_type(target: Option<&str>, rng: &mut impl Rng) -> &'static str {
    match target {
        Some(code) => {
            let code = code.trim().to_uppercase();
            PATTERN_TYPES
                .iter()
                .copied()
                .find(|t| *t == code)
                .unwrap_or(PATTERN_TYPES[0])
        }
        None => PATTERN_TYPES
            .choose(rng)
            .copied()
            .unwrap_or(PATTERN_TYPES[0]),
    }
}

/// Values a respondent of `pattern` picks for a question on `dimension`
fn preferred_values(pattern: &str, question: &Question) -> &'static [u8] {
    match question.letter() {
        Some(letter) if pattern.contains(letter.as_str()) => &[4, 5],
        Some(_) => &[1, 2],
        None => &[NEUTRAL],
    }
}

/// Answers that mostly follow the target type's pattern.
///
/// Unknown or missing targets use a patterned type (random when missing).
pub fn generate_test_responses(
    target: Option<&str>,
    questions: &[Question],
    rng: &mut impl Rng,
) -> GeneratedResponses {
    generate_with_noise(target, questions, DEFAULT_NOISE, rng)
}

pub fn generate_with_noise(
    target: Option<&str>,
    questions: &[Question],
    noise: f64,
    rng: &mut impl Rng,
) -> GeneratedResponses {
    let pattern = pattern_type(target, rng);
    let noise = noise.clamp(0.0, 1.0);
    let responses = questions
        .iter()
        .map(|q| {
            let value = if rng.gen_bool(noise) {
                rng.gen_range(1..=5)
            } else {
                preferred_values(pattern, q)
                    .choose(rng)
                    .copied()
                    .unwrap_or(NEUTRAL)
            };
            (q.id, value)
        })
        .collect();

    GeneratedResponses {
        target_type: pattern.to_string(),
        responses,
    }
}
