//! Terminal front end for the questionnaire.
//!
//! Usage:
//!   cargo run --bin mbti -- run --length 40
//!   cargo run --bin mbti -- run --import-file saved.json
//!   cargo run --bin mbti -- test --type ENFP --seed 7
//!   cargo run --bin mbti -- analyze --file saved.json

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use prettytable::{Table, row};
use rand::SeedableRng;
use rand::rngs::StdRng;

use mbti_flow::config::Config;
use mbti_flow::error::MbtiError;
use mbti_flow::export::{ExportRecord, load_session, write_record};
use mbti_flow::init_tracing;
use mbti_flow::narrative::{
    NarrativeAugmenter, PromptSubject, TextGenerator, UnavailableGenerator, create_generator,
};
use mbti_flow::pipeline::{AnalysisContext, LineResponses, Pipeline, PipelineOptions};
use mbti_flow::questions::{QuestionnaireLength, questions_for};
use mbti_flow::report::type_profile;
use mbti_flow::responses::{RawResponse, ResponseSet};
use mbti_flow::scoring::{Axis, DimensionScores, PersonalityType};
use mbti_flow::testdata::generate_test_responses;

#[derive(Parser)]
#[command(name = "mbti")]
#[command(about = "MBTI questionnaire: answer, score, report", long_about = None)]
struct Cli {
    /// Write reports and exports here instead of the configured directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Skip the language-model narrative
    #[arg(long, global = true)]
    no_llm: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the questionnaire interactively
    Run {
        /// 20, 40 or 60; anything else uses 20
        #[arg(long)]
        length: Option<i64>,
        /// Question list (JSON) to use instead of the built-in catalog
        #[arg(long)]
        questions: Option<PathBuf>,
        /// Continue a saved session, asking only unanswered questions
        #[arg(long)]
        import_file: Option<PathBuf>,
    },
    /// Generate answers for a target type and check the detected type
    Test {
        /// INTJ, ENFP, ISTJ or ESTP; random when omitted
        #[arg(long = "type")]
        target: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 20)]
        length: i64,
    },
    /// Analyze a complete saved session
    Analyze {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    init_tracing(&config.runtime);

    let options = pipeline_options(&config, cli.output_dir.clone(), cli.no_llm)?;

    match cli.command {
        Commands::Run {
            length,
            questions,
            import_file,
        } => {
            let length = length
                .map(QuestionnaireLength::from_len_or_default)
                .unwrap_or_else(|| config.questionnaire.length());
            run(length, questions, import_file, options).await
        }
        Commands::Test {
            target,
            seed,
            length,
        } => test(target, seed, QuestionnaireLength::from_len_or_default(length), options).await,
        Commands::Analyze { file } => analyze(file, options).await,
    }
}

fn pipeline_options(
    config: &Config,
    output_dir: Option<PathBuf>,
    no_llm: bool,
) -> Result<PipelineOptions> {
    let generator: Arc<dyn TextGenerator> = if no_llm {
        Arc::new(UnavailableGenerator::new("disabled with --no-llm"))
    } else {
        create_generator(&config.narrative, &config.runtime)?
    };
    Ok(PipelineOptions {
        augmenter: Arc::new(NarrativeAugmenter::from_config(generator, &config.narrative)),
        subject: PromptSubject::Person,
        output_dir: output_dir.unwrap_or_else(|| config.output.dir()),
    })
}

async fn run(
    length: QuestionnaireLength,
    questions_file: Option<PathBuf>,
    import_file: Option<PathBuf>,
    options: PipelineOptions,
) -> Result<()> {
    let source = Arc::new(LineResponses::stdin());
    let output_dir = options.output_dir.clone();

    let (mut ctx, pipeline) = match import_file {
        Some(path) => {
            let session = load_session(&path)?;
            println!(
                "Resuming {}: {} of {} answered",
                path.display(),
                session.responses.len(),
                session.questions.len()
            );
            let mut ctx = AnalysisContext::prepopulated(session.questions, session.responses);
            if let Some(id) = session.session_id {
                ctx = ctx.with_session_id(id);
            }
            (ctx, Pipeline::resume(source, options))
        }
        None => (
            AnalysisContext::new(),
            Pipeline::full(questions_file, length, source, options),
        ),
    };

    match pipeline.run(&mut ctx).await {
        Ok(()) => {
            print_results(&ctx);
            Ok(())
        }
        Err(MbtiError::IncompleteResponses { answered, total }) => {
            match save_progress(&ctx, &output_dir)? {
                Some(path) => {
                    println!(
                        "Stopped after {answered} of {total}. Progress saved to {}",
                        path.display()
                    );
                    println!("Continue with: mbti run --import-file {}", path.display());
                }
                None => println!("Stopped before any answer; nothing saved."),
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn test(
    target: Option<String>,
    seed: Option<u64>,
    length: QuestionnaireLength,
    options: PipelineOptions,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let questions = questions_for(length);
    let generated = generate_test_responses(target.as_deref(), &questions, &mut rng);
    let raw: BTreeMap<u32, RawResponse> = generated
        .responses
        .iter()
        .map(|(id, value)| (id, RawResponse::from(value)))
        .collect();

    let mut ctx = AnalysisContext::prepopulated(questions, raw);
    Pipeline::prepopulated(options).run(&mut ctx).await?;

    print_results(&ctx);
    let detected = ctx.type_code().unwrap_or("-");
    println!(
        "Target: {}  Detected: {}  {}",
        generated.target_type,
        detected,
        if detected == generated.target_type { "match" } else { "mismatch" }
    );
    Ok(())
}

async fn analyze(file: PathBuf, options: PipelineOptions) -> Result<()> {
    let session = load_session(&file)?;
    let mut ctx = AnalysisContext::prepopulated(session.questions, session.responses);
    if let Some(id) = session.session_id {
        ctx = ctx.with_session_id(id);
    }
    match Pipeline::prepopulated(options).run(&mut ctx).await {
        Ok(()) => {
            print_results(&ctx);
            Ok(())
        }
        Err(e @ MbtiError::IncompleteResponses { .. }) => {
            eprintln!("{}", e.user_message());
            eprintln!("Finish it with: mbti run --import-file {}", file.display());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Export a partial session; nothing is written when no question was answered
fn save_progress(ctx: &AnalysisContext, dir: &Path) -> Result<Option<PathBuf>> {
    if ctx.raw_responses.is_empty() {
        return Ok(None);
    }
    let mut record = ExportRecord::new(
        ctx.questions.clone(),
        ResponseSet::from_raw(&ctx.raw_responses),
        None,
        Some(ctx.created_at),
        ctx.session_id,
    );
    Ok(Some(write_record(&mut record, dir, Local::now())?))
}

/// Axis, preference, fractions, winning percentage, confidence
fn axis_rows(personality: &PersonalityType, scores: &DimensionScores) -> Vec<[String; 5]> {
    Axis::ALL
        .iter()
        .filter_map(|axis| {
            let (a, b) = axis.letters();
            let (fa, fb) = scores.pair(*axis);
            let outcome = personality.outcome(*axis)?;
            Some([
                axis.to_string(),
                outcome.preference.as_str().to_string(),
                format!("{}={:.2} {}={:.2}", a.as_str(), fa, b.as_str(), fb),
                format!("{:.1}%", outcome.percentage),
                format!("{:.2}", outcome.confidence),
            ])
        })
        .collect()
}

fn print_results(ctx: &AnalysisContext) {
    let (Some(personality), Some(scores)) = (&ctx.personality, &ctx.scores) else {
        println!("No result.");
        return;
    };
    let profile = type_profile(&personality.code);
    println!("\n{} - {}\n", personality.code, profile.name);

    let mut table = Table::new();
    table.add_row(row!["Axis", "Preference", "Scores", "Percentage", "Confidence"]);
    for [axis, preference, fractions, percentage, confidence] in axis_rows(personality, scores) {
        table.add_row(row![axis, preference, fractions, percentage, confidence]);
    }
    table.printstd();

    if let Some(narrative) = ctx.narrative.as_ref().filter(|n| !n.succeeded) {
        println!("\n{}", narrative.text);
    }
    if let Some(path) = &ctx.report_path {
        println!("\nReport: {}", path.display());
    }
    if let Some(path) = &ctx.export_path {
        println!("Export: {}", path.display());
    }
    for e in &ctx.write_errors {
        eprintln!("Not saved: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbti_flow::questions::Dimension;
    use mbti_flow::scoring::resolve;

    #[test]
    fn confidence_column_is_the_fraction_gap() {
        let raw = BTreeMap::from([
            (Dimension::E, 6),
            (Dimension::I, 4),
            (Dimension::S, 5),
            (Dimension::N, 5),
        ]);
        let scores = DimensionScores::from_raw(raw);
        let rows = axis_rows(&resolve(&scores), &scores);

        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            ["E/I", "E", "E=0.60 I=0.40", "60.0%", "0.20"].map(String::from)
        );
        assert_eq!(rows[1][1], "N");
        assert_eq!(rows[1][3], "50.0%");
        assert_eq!(rows[1][4], "0.00");
    }

    #[test]
    fn stopping_before_first_answer_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let questions = questions_for(QuestionnaireLength::Twenty);

        let empty = AnalysisContext::prepopulated(questions.clone(), BTreeMap::new());
        assert!(save_progress(&empty, dir.path()).unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let one = AnalysisContext::prepopulated(
            questions,
            BTreeMap::from([(1, RawResponse::Integer(4))]),
        );
        let path = save_progress(&one, dir.path()).unwrap().unwrap();
        assert_eq!(load_session(&path).unwrap().responses.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
