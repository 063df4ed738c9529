//! Where answers come from when a run collects them itself

use std::collections::BTreeMap;
use std::io::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::questions::Question;
use crate::responses::{RawResponse, ResponseLabel};

/// Supplies answers for the questions still pending.
///
/// Returning fewer answers than asked means the respondent stopped early.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn collect(
        &self,
        pending: &[Question],
        total: usize,
    ) -> Result<BTreeMap<u32, RawResponse>>;
}

/// Fixed answers, e.g. from a saved file or generated test data
pub struct PresetResponses {
    answers: BTreeMap<u32, RawResponse>,
}

impl PresetResponses {
    pub fn new(answers: BTreeMap<u32, RawResponse>) -> Self {
        Self { answers }
    }
}

#[async_trait]
impl ResponseSource for PresetResponses {
    async fn collect(
        &self,
        pending: &[Question],
        _total: usize,
    ) -> Result<BTreeMap<u32, RawResponse>> {
        Ok(pending
            .iter()
            .filter_map(|q| self.answers.get(&q.id).map(|a| (q.id, a.clone())))
            .collect())
    }
}

/// Line-oriented prompt loop; an empty line, `q`, or end of input stops it
pub struct LineResponses<R> {
    reader: Mutex<R>,
}

impl LineResponses<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineResponses<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

fn scale_hint() -> String {
    ResponseLabel::ALL
        .iter()
        .map(|l| format!("{}={}", l.value(), l.display()))
        .collect::<Vec<_>>()
        .join("  ")
}

enum Answer {
    Value(u8),
    Stop,
    Invalid,
}

fn parse_answer(line: &str) -> Answer {
    let t = line.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("q") {
        return Answer::Stop;
    }
    match t.parse::<u8>() {
        Ok(v) if (1..=5).contains(&v) => Answer::Value(v),
        _ => Answer::Invalid,
    }
}

#[async_trait]
impl<R> ResponseSource for LineResponses<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn collect(
        &self,
        pending: &[Question],
        total: usize,
    ) -> Result<BTreeMap<u32, RawResponse>> {
        let mut reader = self.reader.lock().await;
        let mut answers = BTreeMap::new();
        let already = total.saturating_sub(pending.len());
        let hint = scale_hint();

        'questions: for (i, q) in pending.iter().enumerate() {
            println!("\nQuestion {} of {} (Q{})", already + i + 1, total, q.id);
            println!("{}", q.text);
            println!("  {hint}");
            loop {
                print!("> ");
                let _ = std::io::stdout().flush();
                let mut line = String::new();
                if reader.read_line(&mut line).await? == 0 {
                    break 'questions;
                }
                match parse_answer(&line) {
                    Answer::Value(v) => {
                        answers.insert(q.id, RawResponse::from(v));
                        break;
                    }
                    Answer::Stop => break 'questions,
                    Answer::Invalid => {
                        println!("Please enter a number from 1 to 5 (empty or q to save and stop).")
                    }
                }
            }
        }

        tracing::debug!("collected {} of {} pending answers", answers.len(), pending.len());
        Ok(answers)
    }
}
