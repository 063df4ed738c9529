//! Likert responses: raw input, normalization, and the canonical response set

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::questions::Question;

/// Neutral value used for unknown symbolic answers and unanswered rows
pub const NEUTRAL: u8 = 3;

/// The five canonical answer labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLabel {
    StronglyDisagree,
    Disagree,
    Neutral,
    Agree,
    StronglyAgree,
}

impl ResponseLabel {
    pub const ALL: [ResponseLabel; 5] = [
        ResponseLabel::StronglyDisagree,
        ResponseLabel::Disagree,
        ResponseLabel::Neutral,
        ResponseLabel::Agree,
        ResponseLabel::StronglyAgree,
    ];

    pub fn value(&self) -> u8 {
        match self {
            ResponseLabel::StronglyDisagree => 1,
            ResponseLabel::Disagree => 2,
            ResponseLabel::Neutral => 3,
            ResponseLabel::Agree => 4,
            ResponseLabel::StronglyAgree => 5,
        }
    }

    /// Label for a normalized value; out-of-range values clamp first
    pub fn from_value(value: u8) -> Self {
        match value.clamp(1, 5) {
            1 => ResponseLabel::StronglyDisagree,
            2 => ResponseLabel::Disagree,
            3 => ResponseLabel::Neutral,
            4 => ResponseLabel::Agree,
            _ => ResponseLabel::StronglyAgree,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ResponseLabel::StronglyDisagree => "strongly_disagree",
            ResponseLabel::Disagree => "disagree",
            ResponseLabel::Neutral => "neutral",
            ResponseLabel::Agree => "agree",
            ResponseLabel::StronglyAgree => "strongly_agree",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            ResponseLabel::StronglyDisagree => "Strongly Disagree",
            ResponseLabel::Disagree => "Disagree",
            ResponseLabel::Neutral => "Neutral",
            ResponseLabel::Agree => "Agree",
            ResponseLabel::StronglyAgree => "Strongly Agree",
        }
    }

    /// Case-insensitive; spaces, dashes and underscores are interchangeable
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let canonical = symbol.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|l| l.symbol() == canonical)
    }
}

/// A response as supplied by a caller, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResponse {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<u8> for RawResponse {
    fn from(value: u8) -> Self {
        RawResponse::Integer(value as i64)
    }
}

impl From<&str> for RawResponse {
    fn from(value: &str) -> Self {
        RawResponse::Text(value.to_string())
    }
}

fn clamp_likert(value: i64) -> u8 {
    value.clamp(1, 5) as u8
}

/// Map a raw answer onto the 1..=5 scale.
///
/// Numbers clamp into range. Numeric strings are treated as numbers.
/// Unrecognized symbolic answers become neutral rather than an error.
pub fn normalize(raw: &RawResponse) -> u8 {
    match raw {
        RawResponse::Integer(v) => clamp_likert(*v),
        RawResponse::Float(v) if v.is_finite() => clamp_likert(v.trunc() as i64),
        RawResponse::Float(_) => NEUTRAL,
        RawResponse::Text(s) => {
            if let Ok(v) = s.trim().parse::<i64>() {
                clamp_likert(v)
            } else {
                ResponseLabel::from_symbol(s)
                    .map(|l| l.value())
                    .unwrap_or(NEUTRAL)
            }
        }
    }
}

/// Normalized answers keyed by question id, each in 1..=5
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet(BTreeMap<u32, u8>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize every raw answer independently
    pub fn from_raw(raw: &BTreeMap<u32, RawResponse>) -> Self {
        Self(raw.iter().map(|(id, r)| (*id, normalize(r))).collect())
    }

    pub fn insert(&mut self, question_id: u32, value: u8) {
        self.0.insert(question_id, value.clamp(1, 5));
    }

    pub fn get(&self, question_id: u32) -> Option<u8> {
        self.0.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Complete when there is one answer per question
    pub fn is_complete(&self, questions: &[Question]) -> bool {
        self.len() == questions.len()
    }

    /// Ids answered here that the question set does not define
    pub fn unknown_ids(&self, questions: &[Question]) -> Vec<u32> {
        self.0
            .keys()
            .filter(|id| !questions.iter().any(|q| q.id == **id))
            .copied()
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<u32, u8> {
        &self.0
    }
}

impl FromIterator<(u32, u8)> for ResponseSet {
    fn from_iter<It: IntoIterator<Item = (u32, u8)>>(iter: It) -> Self {
        let mut set = ResponseSet::new();
        for (id, v) in iter {
            set.insert(id, v);
        }
        set
    }
}

/// Decode a string-keyed response object.
///
/// Keys that are not plain decimal integers are dropped, as are values that
/// are neither numbers nor strings.
pub fn parse_keyed_responses(map: &Map<String, Value>) -> BTreeMap<u32, RawResponse> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(id) = key.parse::<u32>() else {
            continue;
        };
        match serde_json::from_value::<RawResponse>(value.clone()) {
            Ok(raw) => {
                out.insert(id, raw);
            }
            Err(_) => tracing::debug!("dropping non-scalar response for question {}", id),
        }
    }
    out
}

/// One row of the response table shown in reports and prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDetail {
    pub id: u32,
    pub text: String,
    pub dimension: String,
    pub response: String,
    pub value: u8,
}

/// Rows for every question in order; unanswered questions show as neutral
pub fn detail_rows(questions: &[Question], responses: &ResponseSet) -> Vec<ResponseDetail> {
    questions
        .iter()
        .map(|q| {
            let value = responses.get(q.id).unwrap_or(NEUTRAL);
            ResponseDetail {
                id: q.id,
                text: q.text.clone(),
                dimension: q.dimension.clone(),
                response: ResponseLabel::from_value(value).display().to_string(),
                value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{QuestionnaireLength, questions_for};
    use serde_json::json;

    #[test]
    fn integers_clamp_into_scale() {
        assert_eq!(normalize(&RawResponse::Integer(0)), 1);
        assert_eq!(normalize(&RawResponse::Integer(-7)), 1);
        assert_eq!(normalize(&RawResponse::Integer(4)), 4);
        assert_eq!(normalize(&RawResponse::Integer(9)), 5);
    }

    #[test]
    fn symbolic_labels_map_to_values() {
        assert_eq!(normalize(&"strongly_disagree".into()), 1);
        assert_eq!(normalize(&"disagree".into()), 2);
        assert_eq!(normalize(&"neutral".into()), 3);
        assert_eq!(normalize(&"agree".into()), 4);
        assert_eq!(normalize(&"Strongly Agree".into()), 5);
    }

    #[test]
    fn unknown_symbols_default_to_neutral() {
        assert_eq!(normalize(&"sometimes".into()), NEUTRAL);
        assert_eq!(normalize(&"".into()), NEUTRAL);
        assert_eq!(normalize(&RawResponse::Float(f64::NAN)), NEUTRAL);
    }

    #[test]
    fn numeric_strings_and_floats_are_numbers() {
        assert_eq!(normalize(&"4".into()), 4);
        assert_eq!(normalize(&" 12 ".into()), 5);
        assert_eq!(normalize(&RawResponse::Float(2.9)), 2);
    }

    #[test]
    fn raw_responses_deserialize_untagged() {
        let v: Vec<RawResponse> = serde_json::from_value(json!([4, 2.5, "agree"])).unwrap();
        assert_eq!(v[0], RawResponse::Integer(4));
        assert_eq!(v[1], RawResponse::Float(2.5));
        assert_eq!(v[2], RawResponse::Text("agree".into()));
    }

    #[test]
    fn keyed_responses_drop_non_numeric_keys() {
        let map = json!({"1": 5, "02": 4, "_questions": [], "abc": 3, "-1": 2, "7": {"x": 1}});
        let parsed = parse_keyed_responses(map.as_object().unwrap());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&1], RawResponse::Integer(5));
        assert_eq!(parsed[&2], RawResponse::Integer(4));
    }

    #[test]
    fn completeness_is_count_based() {
        let questions = questions_for(QuestionnaireLength::Twenty);
        let mut set: ResponseSet = (1..=19).map(|id| (id, 3)).collect();
        assert!(!set.is_complete(&questions));
        set.insert(20, 3);
        assert!(set.is_complete(&questions));
        assert!(set.unknown_ids(&questions).is_empty());
        set.insert(99, 1);
        assert_eq!(set.unknown_ids(&questions), vec![99]);
    }

    #[test]
    fn detail_rows_fill_unanswered_as_neutral() {
        let questions = questions_for(QuestionnaireLength::Twenty);
        let set: ResponseSet = [(1, 5), (2, 1)].into_iter().collect();
        let rows = detail_rows(&questions, &set);
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].response, "Strongly Agree");
        assert_eq!(rows[1].response, "Strongly Disagree");
        assert_eq!(rows[2].value, NEUTRAL);
        assert_eq!(rows[2].response, "Neutral");
    }
}
