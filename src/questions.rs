//! Question catalog and dimension letters
//!
//! The catalog is append-only across three tiers: 20 ⊂ 40 ⊂ 60. Every
//! 20-question block carries five questions per axis pair.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MbtiError, Result};

/// One of the eight canonical personality-trait letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::E,
        Dimension::I,
        Dimension::S,
        Dimension::N,
        Dimension::T,
        Dimension::F,
        Dimension::J,
        Dimension::P,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::E => "E",
            Dimension::I => "I",
            Dimension::S => "S",
            Dimension::N => "N",
            Dimension::T => "T",
            Dimension::F => "F",
            Dimension::J => "J",
            Dimension::P => "P",
        }
    }

    /// Parse a single dimension letter; anything else is `None`
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.trim() {
            "E" => Some(Dimension::E),
            "I" => Some(Dimension::I),
            "S" => Some(Dimension::S),
            "N" => Some(Dimension::N),
            "T" => Some(Dimension::T),
            "F" => Some(Dimension::F),
            "J" => Some(Dimension::J),
            "P" => Some(Dimension::P),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_dimension() -> String {
    "Unknown".to_string()
}

/// A single questionnaire statement.
///
/// `dimension` stays a string so saved files with unexpected tags still load;
/// use [`Question::letter`] for the typed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    #[serde(default = "unknown_dimension")]
    pub dimension: String,
    #[serde(default)]
    pub reverse: bool,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            id,
            text: text.into(),
            dimension: dimension.as_str().to_string(),
            reverse: false,
        }
    }

    pub fn letter(&self) -> Option<Dimension> {
        Dimension::from_letter(&self.dimension)
    }
}

/// Supported questionnaire lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionnaireLength {
    #[default]
    Twenty,
    Forty,
    Sixty,
}

impl QuestionnaireLength {
    /// Any length other than 40 or 60 selects the 20-question tier
    pub fn from_len_or_default(length: i64) -> Self {
        match length {
            40 => QuestionnaireLength::Forty,
            60 => QuestionnaireLength::Sixty,
            _ => QuestionnaireLength::Twenty,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            QuestionnaireLength::Twenty => 20,
            QuestionnaireLength::Forty => 40,
            QuestionnaireLength::Sixty => 60,
        }
    }
}

use Dimension::{E, F, I, J, N, P, S, T};

const CATALOG: [(u32, &str, Dimension); 60] = [
    // Base tier
    (1, "You regularly make new friends.", E),
    (2, "You feel comfortable just walking up to someone you find interesting and striking up a conversation.", E),
    (3, "At social events, you rarely try to introduce yourself to new people and mostly talk to the ones you already know.", I),
    (4, "You prefer to work alone rather than in a team.", I),
    (5, "You enjoy participating in group activities.", E),
    (6, "You are not too interested in discussing various interpretations and analyses of creative works.", S),
    (7, "You prefer practical, concrete information over abstract theories.", S),
    (8, "You spend a lot of your free time exploring various random topics that pique your interest.", N),
    (9, "You like books and movies that make you come up with your own interpretation of the ending.", N),
    (10, "You enjoy exploring new ideas and possibilities.", N),
    (11, "You usually stay calm, even under a lot of pressure.", T),
    (12, "You are more inclined to follow your head than your heart.", T),
    (13, "Seeing other people cry can easily make you feel like you want to cry too.", F),
    (14, "You are very sentimental.", F),
    (15, "Your happiness comes more from helping others accomplish things than your own accomplishments.", F),
    (16, "You often make a backup plan for a backup plan.", J),
    (17, "You prefer to completely finish one project before starting another.", J),
    (18, "You like to use organizing tools like schedules and lists.", J),
    (19, "You usually prefer just doing what you feel like at any given moment instead of planning a particular daily routine.", P),
    (20, "You are interested in so many things that you find it difficult to choose what to try next.", P),
    // Extended tier
    (21, "You find it easy to stay relaxed and focused even when there is some pressure.", I),
    (22, "You are energized by being around other people.", E),
    (23, "You prefer to have a few close friends rather than many acquaintances.", I),
    (24, "You enjoy being the center of attention.", E),
    (25, "You need quiet time to recharge after social activities.", I),
    (26, "You focus on the here-and-now rather than possibilities for the future.", S),
    (27, "You are more interested in what could be than what is.", N),
    (28, "You prefer to work with established methods rather than experiment with new approaches.", S),
    (29, "You often get so lost in thoughts that you ignore or forget your surroundings.", N),
    (30, "You trust experience more than theory.", S),
    (31, "You consider yourself more practical than creative.", T),
    (32, "You find it easy to empathize with a person whose experiences are very different from yours.", F),
    (33, "You think that everyone's views should be respected regardless of whether they are supported by facts or not.", F),
    (34, "You feel more drawn to places with busy, bustling atmospheres than quiet, intimate places.", T),
    (35, "You are more concerned with truth than with people's feelings.", T),
    (36, "You prefer to improvise rather than spend time coming up with a detailed plan.", P),
    (37, "You find deadlines stressful.", P),
    (38, "You prefer to have everything planned out in advance.", J),
    (39, "You enjoy having a clear routine in your daily life.", J),
    (40, "You often leave things to the last minute.", P),
    // Advanced tier
    (41, "You feel comfortable being spontaneous in social situations.", E),
    (42, "You prefer written communication over verbal communication.", I),
    (43, "You enjoy networking events and meeting new people.", E),
    (44, "You prefer to think things through before speaking.", I),
    (45, "You feel energized after attending parties or social gatherings.", E),
    (46, "You are more interested in the big picture than the details.", N),
    (47, "You prefer concrete examples over abstract concepts.", S),
    (48, "You enjoy brainstorming and generating new ideas.", N),
    (49, "You focus on facts and details rather than interpretations.", S),
    (50, "You are drawn to theoretical and philosophical discussions.", N),
    (51, "You make decisions based on logic rather than feelings.", T),
    (52, "You are sensitive to the emotions of others.", F),
    (53, "You value harmony and cooperation over competition.", F),
    (54, "You prefer objective analysis over personal considerations.", T),
    (55, "You find it important to maintain personal relationships even when it's inconvenient.", F),
    (56, "You like to keep your options open rather than commit to a plan.", P),
    (57, "You prefer structure and organization in your work environment.", J),
    (58, "You enjoy exploring different possibilities before making a decision.", P),
    (59, "You feel satisfied when you complete tasks ahead of schedule.", J),
    (60, "You adapt easily to unexpected changes in plans.", P),
];

/// Ordered questions for a tier; ids are strictly increasing
pub fn questions_for(length: QuestionnaireLength) -> Vec<Question> {
    CATALOG
        .iter()
        .take(length.count())
        .map(|(id, text, dimension)| Question::new(*id, *text, *dimension))
        .collect()
}

/// Pull the question list out of a persisted questionnaire document.
///
/// Accepts the nested `{questionnaire: {questions}}` shape and the flat
/// `{questions}` shape.
pub fn extract_questions(doc: &Value) -> Result<Vec<Question>> {
    let list = doc
        .get("questionnaire")
        .and_then(|q| q.get("questions"))
        .or_else(|| doc.get("questions"))
        .ok_or_else(|| MbtiError::Format {
            message: "no question list found".into(),
        })?;

    let questions: Vec<Question> =
        serde_json::from_value(list.clone()).map_err(|e| MbtiError::Format {
            message: format!("question list is malformed: {}", e),
        })?;

    if questions.is_empty() {
        return Err(MbtiError::Format {
            message: "question list is empty".into(),
        });
    }

    let mut seen = HashSet::new();
    for q in &questions {
        if q.id == 0 {
            return Err(MbtiError::Format {
                message: "question ids must be positive".into(),
            });
        }
        if !seen.insert(q.id) {
            return Err(MbtiError::Format {
                message: format!("duplicate question id {}", q.id),
            });
        }
    }

    Ok(questions)
}

/// Load the question list from a saved questionnaire file
pub fn load_from(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path).map_err(|e| MbtiError::Format {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    let doc: Value = serde_json::from_str(&content).map_err(|e| MbtiError::Format {
        message: format!("{} is not valid JSON: {}", path.display(), e),
    })?;
    extract_questions(&doc)
}

/// Load from a file when one is given, otherwise (or on a format error) use the catalog
pub fn load_or_default(path: Option<&Path>, length: QuestionnaireLength) -> Vec<Question> {
    let Some(path) = path else {
        return questions_for(length);
    };
    match load_from(path) {
        Ok(questions) => {
            tracing::info!(
                "Loaded {} questions from {}",
                questions.len(),
                path.display()
            );
            questions
        }
        Err(e) => {
            tracing::warn!("{}; falling back to the {}-question catalog", e, length.count());
            questions_for(length)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tiers_are_nested_and_ordered() {
        let twenty = questions_for(QuestionnaireLength::Twenty);
        let forty = questions_for(QuestionnaireLength::Forty);
        let sixty = questions_for(QuestionnaireLength::Sixty);
        assert_eq!(twenty.len(), 20);
        assert_eq!(forty.len(), 40);
        assert_eq!(sixty.len(), 60);
        assert_eq!(&forty[..20], &twenty[..]);
        assert_eq!(&sixty[..40], &forty[..]);
        assert!(sixty.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn each_block_has_five_questions_per_axis_pair() {
        let sixty = questions_for(QuestionnaireLength::Sixty);
        for block in sixty.chunks(20) {
            for pair in [(E, I), (S, N), (T, F), (J, P)] {
                let count = block
                    .iter()
                    .filter(|q| q.letter() == Some(pair.0) || q.letter() == Some(pair.1))
                    .count();
                assert_eq!(count, 5, "pair {:?} in block starting {}", pair, block[0].id);
            }
        }
    }

    #[test]
    fn odd_lengths_fall_back_to_twenty() {
        assert_eq!(QuestionnaireLength::from_len_or_default(33).count(), 20);
        assert_eq!(QuestionnaireLength::from_len_or_default(40).count(), 40);
        assert_eq!(QuestionnaireLength::from_len_or_default(60).count(), 60);
        assert_eq!(QuestionnaireLength::from_len_or_default(-1).count(), 20);
    }

    #[test]
    fn extract_accepts_nested_and_flat_shapes() {
        let q = json!([{"id": 7, "text": "x", "dimension": "N"}]);
        let nested = json!({"questionnaire": {"questions": q.clone()}});
        let flat = json!({"questions": q});
        assert_eq!(extract_questions(&nested).unwrap()[0].id, 7);
        assert_eq!(extract_questions(&flat).unwrap()[0].letter(), Some(N));
    }

    #[test]
    fn extract_rejects_missing_or_duplicate_lists() {
        assert!(matches!(
            extract_questions(&json!({"responses": {}})),
            Err(MbtiError::Format { .. })
        ));
        let dup = json!({"questions": [
            {"id": 1, "text": "a", "dimension": "E"},
            {"id": 1, "text": "b", "dimension": "I"}
        ]});
        assert!(matches!(extract_questions(&dup), Err(MbtiError::Format { .. })));
    }

    #[test]
    fn missing_dimension_is_unknown() {
        let doc = json!({"questions": [{"id": 3, "text": "t"}]});
        let questions = extract_questions(&doc).unwrap();
        assert_eq!(questions[0].dimension, "Unknown");
        assert_eq!(questions[0].letter(), None);
    }

    #[test]
    fn load_or_default_falls_back_on_bad_file() {
        let missing = Path::new("/definitely/not/here.json");
        let questions = load_or_default(Some(missing), QuestionnaireLength::Forty);
        assert_eq!(questions.len(), 40);
    }
}
