//! Traditional scoring and type resolution

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::questions::{Dimension, Question};
use crate::responses::ResponseSet;

/// One of the four opposing-letter axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    EI,
    SN,
    TF,
    JP,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::EI, Axis::SN, Axis::TF, Axis::JP];

    /// (first, second) letters; the second wins exact ties
    pub fn letters(&self) -> (Dimension, Dimension) {
        match self {
            Axis::EI => (Dimension::E, Dimension::I),
            Axis::SN => (Dimension::S, Dimension::N),
            Axis::TF => (Dimension::T, Dimension::F),
            Axis::JP => (Dimension::J, Dimension::P),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Axis::EI => "EI",
            Axis::SN => "SN",
            Axis::TF => "TF",
            Axis::JP => "JP",
        }
    }

    pub fn breakdown_key(&self) -> &'static str {
        match self {
            Axis::EI => "extraversion_introversion",
            Axis::SN => "sensing_intuition",
            Axis::TF => "thinking_feeling",
            Axis::JP => "judging_perceiving",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.letters();
        write!(f, "{a}/{b}")
    }
}

/// Raw per-letter accumulators plus per-axis fractions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub raw: BTreeMap<Dimension, u32>,
    pub fractions: BTreeMap<Dimension, f64>,
}

impl DimensionScores {
    /// Derive fractions from accumulators; a pair with no mass splits 0.5/0.5
    pub fn from_raw(raw: BTreeMap<Dimension, u32>) -> Self {
        let mut fractions = BTreeMap::new();
        for axis in Axis::ALL {
            let (a, b) = axis.letters();
            let ra = raw.get(&a).copied().unwrap_or(0);
            let rb = raw.get(&b).copied().unwrap_or(0);
            let total = ra + rb;
            if total > 0 {
                fractions.insert(a, ra as f64 / total as f64);
                fractions.insert(b, rb as f64 / total as f64);
            } else {
                fractions.insert(a, 0.5);
                fractions.insert(b, 0.5);
            }
        }
        Self { raw, fractions }
    }

    pub fn fraction(&self, dimension: Dimension) -> f64 {
        self.fractions.get(&dimension).copied().unwrap_or(0.5)
    }

    pub fn raw_total(&self, dimension: Dimension) -> u32 {
        self.raw.get(&dimension).copied().unwrap_or(0)
    }

    pub fn pair(&self, axis: Axis) -> (f64, f64) {
        let (a, b) = axis.letters();
        (self.fraction(a), self.fraction(b))
    }

    /// `{"E_score": .., "I_score": .., ...}`
    pub fn score_map(&self) -> BTreeMap<String, f64> {
        Dimension::ALL
            .iter()
            .map(|d| (format!("{}_score", d), self.fraction(*d)))
            .collect()
    }
}

/// Accumulate normalized responses per dimension letter.
///
/// Unanswered questions, answers to unknown ids, and questions tagged with
/// a non-canonical dimension contribute nothing.
pub fn score(responses: &ResponseSet, questions: &[Question]) -> DimensionScores {
    let mut raw: BTreeMap<Dimension, u32> = Dimension::ALL.iter().map(|d| (*d, 0)).collect();

    for q in questions {
        let Some(value) = responses.get(q.id) else {
            continue;
        };
        let Some(letter) = q.letter() else {
            tracing::debug!("question {} has non-canonical dimension '{}'", q.id, q.dimension);
            continue;
        };
        *raw.entry(letter).or_insert(0) += value as u32;
    }

    DimensionScores::from_raw(raw)
}

/// Winning letter and strength on one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisOutcome {
    pub axis: Axis,
    pub preference: Dimension,
    /// |fraction(first) - fraction(second)|, in [0, 1]
    pub confidence: f64,
    /// max of the two fractions as a percentage
    pub percentage: f64,
}

impl AxisOutcome {
    /// `E/I: E (60.0%)`
    pub fn summary_line(&self) -> String {
        format!("{}: {} ({:.1}%)", self.axis, self.preference, self.percentage)
    }
}

/// Four-letter type code plus per-axis outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityType {
    pub code: String,
    pub axes: Vec<AxisOutcome>,
}

impl PersonalityType {
    pub fn outcome(&self, axis: Axis) -> Option<&AxisOutcome> {
        self.axes.iter().find(|o| o.axis == axis)
    }

    /// `{"EI_confidence": .., ...}`
    pub fn confidence_map(&self) -> BTreeMap<String, f64> {
        self.axes
            .iter()
            .map(|o| (format!("{}_confidence", o.axis.key()), o.confidence))
            .collect()
    }
}

/// Outcome for one axis.
///
/// The first letter wins only with a strictly greater fraction, so exact
/// ties (including the 0.5/0.5 no-data case) go to the second letter. This
/// is kept for compatibility with previously issued results.
pub fn axis_outcome(scores: &DimensionScores, axis: Axis) -> AxisOutcome {
    let (a, b) = axis.letters();
    let (fa, fb) = scores.pair(axis);
    AxisOutcome {
        axis,
        preference: if fa > fb { a } else { b },
        confidence: (fa - fb).abs(),
        percentage: fa.max(fb) * 100.0,
    }
}

/// Resolve the type code; a pure function of the scores
pub fn resolve(scores: &DimensionScores) -> PersonalityType {
    let axes: Vec<AxisOutcome> = Axis::ALL.iter().map(|a| axis_outcome(scores, *a)).collect();
    let code = axes.iter().map(|o| o.preference.as_str()).collect();
    PersonalityType { code, axes }
}

/// The four `E/I: E (60.0%)` lines in axis order
pub fn axis_summary(scores: &DimensionScores) -> Vec<String> {
    Axis::ALL
        .iter()
        .map(|a| axis_outcome(scores, *a).summary_line())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{QuestionnaireLength, questions_for};

    fn twenty() -> Vec<Question> {
        questions_for(QuestionnaireLength::Twenty)
    }

    /// 20 questions with an even letter split inside every pair
    fn balanced_twenty() -> Vec<Question> {
        let letters = [
            Dimension::E, Dimension::I, Dimension::E, Dimension::I, Dimension::E, Dimension::I,
            Dimension::S, Dimension::N, Dimension::S, Dimension::N,
            Dimension::T, Dimension::F, Dimension::T, Dimension::F, Dimension::T, Dimension::F,
            Dimension::J, Dimension::P, Dimension::J, Dimension::P,
        ];
        letters
            .iter()
            .enumerate()
            .map(|(i, d)| Question::new(i as u32 + 1, format!("q{}", i + 1), *d))
            .collect()
    }

    #[test]
    fn all_neutral_on_balanced_set_resolves_to_infp() {
        let questions = balanced_twenty();
        let responses: ResponseSet = questions.iter().map(|q| (q.id, 3)).collect();
        let scores = score(&responses, &questions);
        for axis in Axis::ALL {
            assert_eq!(scores.pair(axis), (0.5, 0.5));
        }
        let ty = resolve(&scores);
        assert_eq!(ty.code, "INFP");
        assert!(ty.axes.iter().all(|o| o.confidence == 0.0));
    }

    #[test]
    fn all_neutral_on_catalog_follows_question_counts() {
        // Each catalog pair is split 3/2, so neutral answers lean to the
        // letter with three questions.
        let questions = twenty();
        let responses: ResponseSet = questions.iter().map(|q| (q.id, 3)).collect();
        let scores = score(&responses, &questions);
        assert_eq!(scores.pair(Axis::EI), (0.6, 0.4));
        assert_eq!(resolve(&scores).code, "ENFJ");
    }

    #[test]
    fn e_biased_answers_resolve_to_e() {
        let questions = twenty();
        // E questions (1, 2, 5) agree strongly, I questions (3, 4) disagree
        let mut responses: ResponseSet = [(1, 5), (2, 5), (3, 1), (4, 1), (5, 5)]
            .into_iter()
            .collect();
        for q in &questions[5..] {
            responses.insert(q.id, 3);
        }
        let ty = resolve(&score(&responses, &questions));
        assert!(ty.code.starts_with('E'));
        assert!(ty.outcome(Axis::EI).unwrap().confidence > 0.0);
    }

    #[test]
    fn empty_responses_split_evenly() {
        let scores = score(&ResponseSet::new(), &twenty());
        for axis in Axis::ALL {
            assert_eq!(scores.pair(axis), (0.5, 0.5));
        }
        let ty = resolve(&scores);
        assert_eq!(ty.code, "INFP");
        assert!(ty.axes.iter().all(|o| o.confidence == 0.0));
    }

    #[test]
    fn fractions_sum_to_one() {
        let questions = twenty();
        let responses: ResponseSet = questions
            .iter()
            .map(|q| (q.id, (q.id % 5 + 1) as u8))
            .collect();
        let scores = score(&responses, &questions);
        for axis in Axis::ALL {
            let (a, b) = scores.pair(axis);
            assert!((a + b - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn non_canonical_dimensions_are_ignored() {
        let questions = vec![
            Question::new(1, "a", Dimension::E),
            Question {
                id: 2,
                text: "b".into(),
                dimension: "X".into(),
                reverse: false,
            },
        ];
        let responses: ResponseSet = [(1, 4), (2, 5)].into_iter().collect();
        let scores = score(&responses, &questions);
        assert_eq!(scores.raw_total(Dimension::E), 4);
        assert_eq!(scores.raw.values().sum::<u32>(), 4);
    }

    #[test]
    fn resolve_is_deterministic() {
        let questions = twenty();
        let responses: ResponseSet = questions.iter().map(|q| (q.id, 4)).collect();
        let scores = score(&responses, &questions);
        assert_eq!(resolve(&scores), resolve(&scores));
    }

    #[test]
    fn confidence_grows_with_imbalance() {
        let mut last = -1.0;
        for e in 0..=10u32 {
            let mut raw = BTreeMap::new();
            raw.insert(Dimension::E, 10 + e);
            raw.insert(Dimension::I, 10);
            let outcome = axis_outcome(&DimensionScores::from_raw(raw), Axis::EI);
            assert!(outcome.confidence >= last);
            if e == 0 {
                assert_eq!(outcome.confidence, 0.0);
                assert_eq!(outcome.preference, Dimension::I);
            }
            last = outcome.confidence;
        }
    }

    #[test]
    fn summary_line_uses_dominant_letter() {
        let mut raw = BTreeMap::new();
        raw.insert(Dimension::T, 6);
        raw.insert(Dimension::F, 4);
        let line = axis_outcome(&DimensionScores::from_raw(raw), Axis::TF).summary_line();
        assert_eq!(line, "T/F: T (60.0%)");
    }

    #[test]
    fn maps_use_letter_keys() {
        let scores = score(&ResponseSet::new(), &twenty());
        let map = scores.score_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map["E_score"], 0.5);
        let conf = resolve(&scores).confidence_map();
        let keys: Vec<&str> = conf.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["EI_confidence", "JP_confidence", "SN_confidence", "TF_confidence"]
        );
    }
}
