//! HTML report assembly

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;
use crate::export::write_new_file;
use crate::responses::ResponseDetail;
use crate::scoring::{Axis, DimensionScores, PersonalityType, axis_outcome};

/// Keirsey-style grouping used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Temperament {
    Analyst,
    Diplomat,
    Sentinel,
    Explorer,
}

impl Temperament {
    pub fn label(&self) -> &'static str {
        match self {
            Temperament::Analyst => "Analysts (NT)",
            Temperament::Diplomat => "Diplomats (NF)",
            Temperament::Sentinel => "Sentinels (SJ)",
            Temperament::Explorer => "Explorers (SP)",
        }
    }

    /// NT, NF, SJ or SP from a well-formed code
    pub fn of(code: &str) -> Option<Self> {
        let b = code.as_bytes();
        if b.len() != 4 {
            return None;
        }
        match (b[1], b[2], b[3]) {
            (b'N', b'T', _) => Some(Temperament::Analyst),
            (b'N', b'F', _) => Some(Temperament::Diplomat),
            (b'S', _, b'J') => Some(Temperament::Sentinel),
            (b'S', _, b'P') => Some(Temperament::Explorer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub strengths: &'static [&'static str],
    pub weaknesses: &'static [&'static str],
    pub careers: &'static [&'static str],
}

const fn profile(
    code: &'static str,
    name: &'static str,
    description: &'static str,
    strengths: &'static [&'static str],
    weaknesses: &'static [&'static str],
    careers: &'static [&'static str],
) -> TypeProfile {
    TypeProfile {
        code,
        name,
        description,
        strengths,
        weaknesses,
        careers,
    }
}

static TYPE_PROFILES: [TypeProfile; 16] = [
    profile(
        "INTJ",
        "Architect",
        "Imaginative and strategic thinkers, with a plan for everything.",
        &["Strategic thinking", "Independent", "Decisive", "Hard-working", "Open-minded"],
        &["Arrogant", "Judgmental", "Overly analytical", "Loathe highly structured environments", "Clueless in romance"],
        &["Scientist", "Engineer", "Professor", "Lawyer", "Systems Analyst"],
    ),
    profile(
        "INTP",
        "Thinker",
        "Innovative inventors with an unquenchable thirst for knowledge.",
        &["Analytical", "Original", "Open-minded", "Curious", "Objective"],
        &["Disconnected", "Insensitive", "Dissatisfied", "Impatient", "Perfectionist"],
        &["Researcher", "Philosopher", "Architect", "Professor", "Mathematician"],
    ),
    profile(
        "ENTJ",
        "Commander",
        "Bold, imaginative and strong-willed leaders, always finding a way or making one.",
        &["Efficient", "Energetic", "Self-confident", "Strong-willed", "Strategic thinkers"],
        &["Stubborn", "Impatient", "Arrogant", "Poor handling of emotions", "Cold and ruthless"],
        &["CEO", "Manager", "Entrepreneur", "Judge", "Business Analyst"],
    ),
    profile(
        "ENTP",
        "Debater",
        "Smart and curious thinkers who cannot resist an intellectual challenge.",
        &["Knowledgeable", "Quick thinkers", "Original", "Excellent brainstormers", "Charismatic"],
        &["Argumentative", "Insensitive", "Intolerant", "Find it difficult to focus", "Dislike practical matters"],
        &["Inventor", "Journalist", "Psychologist", "Photographer", "Consultant"],
    ),
    profile(
        "INFJ",
        "Advocate",
        "Quiet and mystical, yet very inspiring and tireless idealists.",
        &["Creative", "Insightful", "Inspiring", "Convincing", "Decisive"],
        &["Sensitive", "Extremely private", "Perfectionist", "Always need a cause", "Can burn out easily"],
        &["Counselor", "Writer", "Psychologist", "Teacher", "Social Worker"],
    ),
    profile(
        "INFP",
        "Mediator",
        "Poetic, kind and altruistic people, always eager to help a good cause.",
        &["Idealistic", "Loyal", "Adaptable", "Curious", "Passionate"],
        &["Too idealistic", "Too altruistic", "Impractical", "Dislike dealing with data", "Take things personally"],
        &["Writer", "Artist", "Therapist", "Librarian", "Human Resources"],
    ),
    profile(
        "ENFJ",
        "Protagonist",
        "Charismatic and inspiring leaders, able to mesmerize their listeners.",
        &["Tolerant", "Reliable", "Charismatic", "Altruistic", "Natural leaders"],
        &["Overly idealistic", "Too selfless", "Too sensitive", "Fluctuating self-esteem", "Struggle to make tough decisions"],
        &["Teacher", "Coach", "Politician", "Sales Manager", "Event Coordinator"],
    ),
    profile(
        "ENFP",
        "Campaigner",
        "Enthusiastic, creative and sociable free spirits, who can always find a reason to smile.",
        &["Enthusiastic", "Creative", "Sociable", "Energetic", "Independent"],
        &["Poor practical skills", "Find it difficult to focus", "Overthink things", "Get stressed easily", "Highly emotional"],
        &["Marketing", "Actor", "Musician", "Social Worker", "Entrepreneur"],
    ),
    profile(
        "ISTJ",
        "Logistician",
        "Practical and fact-minded, reliable and responsible.",
        &["Honest", "Direct", "Strong-willed", "Dutiful", "Very responsible"],
        &["Stubborn", "Insensitive", "Always by the book", "Judgmental", "Often unreasonably blame themselves"],
        &["Accountant", "Administrator", "Military Officer", "Lawyer", "Judge"],
    ),
    profile(
        "ISFJ",
        "Protector",
        "Warm-hearted and dedicated, always ready to protect their loved ones.",
        &["Supportive", "Reliable", "Patient", "Imaginative", "Observant"],
        &["Humble", "Shy", "Take things too personally", "Repress their feelings", "Overload themselves"],
        &["Nurse", "Teacher", "Social Worker", "Counselor", "Office Manager"],
    ),
    profile(
        "ESTJ",
        "Executive",
        "Excellent administrators, unsurpassed at managing things or people.",
        &["Dedicated", "Strong-willed", "Direct", "Honest", "Loyal"],
        &["Inflexible", "Stubborn", "Uncomfortable with unconventional situations", "Judgmental", "Too focused on social status"],
        &["Manager", "Administrator", "Judge", "Teacher", "Military Officer"],
    ),
    profile(
        "ESFJ",
        "Consul",
        "Extraordinarily caring, social and popular people, always eager to help.",
        &["Strong practical skills", "Dutiful", "Very loyal", "Sensitive", "Warm"],
        &["Worried about their social status", "Inflexible", "Reluctant to innovate", "Vulnerable to criticism", "Often too needy"],
        &["Teacher", "Nurse", "Social Worker", "Counselor", "Office Manager"],
    ),
    profile(
        "ISTP",
        "Virtuoso",
        "Bold and practical experimenters, masters of all kinds of tools.",
        &["Optimistic", "Energetic", "Creative", "Practical", "Spontaneous"],
        &["Stubborn", "Insensitive", "Private", "Reserved", "Easily bored"],
        &["Mechanic", "Engineer", "Pilot", "Paramedic", "Data Analyst"],
    ),
    profile(
        "ISFP",
        "Adventurer",
        "Flexible and charming artists, always ready to explore new possibilities.",
        &["Charming", "Sensitive to others", "Imaginative", "Passionate", "Curious"],
        &["Fiercely independent", "Unpredictable", "Easily stressed", "Overly competitive", "Fluctuating self-esteem"],
        &["Artist", "Musician", "Designer", "Photographer", "Chef"],
    ),
    profile(
        "ESTP",
        "Entrepreneur",
        "Smart, energetic and very perceptive people, who truly enjoy living on the edge.",
        &["Tolerant", "Energetic", "Very perceptive", "Excellent people skills", "Direct"],
        &["Impatient", "Risk-prone", "Unstructured", "May miss the bigger picture", "Defiant"],
        &["Sales Representative", "Paramedic", "Entrepreneur", "Actor", "Real Estate Agent"],
    ),
    profile(
        "ESFP",
        "Entertainer",
        "Spontaneous, energetic and enthusiastic people; life is never boring around them.",
        &["Bold", "Original", "Aesthetics and showcase", "Practical", "Observant"],
        &["Sensitive", "Conflict-averse", "Easily bored", "Poor long-term planners", "Unfocused"],
        &["Actor", "Artist", "Photographer", "Designer", "Event Planner"],
    ),
];

static UNKNOWN_PROFILE: TypeProfile = profile(
    "",
    "Unknown Type",
    "Type description not available.",
    &["To be determined"],
    &["To be determined"],
    &["Various options"],
);

/// Profile for a code; codes outside the table get the generic placeholder
pub fn type_profile(code: &str) -> &'static TypeProfile {
    TYPE_PROFILES
        .iter()
        .find(|p| p.code == code)
        .unwrap_or(&UNKNOWN_PROFILE)
}

pub fn all_profiles() -> &'static [TypeProfile] {
    &TYPE_PROFILES
}

/// A fully rendered report, not yet written anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub type_code: String,
    pub type_name: String,
    pub generated_at: DateTime<Local>,
    pub html: String,
}

impl ReportDocument {
    /// `mbti_report_<TYPE>_<YYYYmmdd_HHMMSS>`
    pub fn file_stem(&self) -> String {
        format!(
            "mbti_report_{}_{}",
            file_safe(&self.type_code),
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

pub(crate) fn file_safe(code: &str) -> String {
    let cleaned: String = code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if cleaned.is_empty() {
        "UNKNOWN".to_string()
    } else {
        cleaned
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render narrative markdown; without the `markdown` feature, newlines become `<br>`
#[cfg(feature = "markdown")]
pub fn markdown_to_html(text: &str) -> String {
    use pulldown_cmark::{Options, Parser, html};

    if text.is_empty() {
        return String::new();
    }
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

#[cfg(not(feature = "markdown"))]
pub fn markdown_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn list_items(items: &[&str]) -> String {
    items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect::<Vec<_>>()
        .join("\n                ")
}

fn responses_table(details: &[ResponseDetail]) -> String {
    if details.is_empty() {
        return "<p>No response data available.</p>".to_string();
    }
    let mut rows: Vec<&ResponseDetail> = details.iter().collect();
    rows.sort_by_key(|d| d.id);

    let mut html = String::from(
        "<table>\n<tr><th>Question</th><th>Dimension</th><th>Response</th></tr>\n",
    );
    for d in rows {
        let _ = writeln!(
            html,
            "<tr id='Q{id}'><td><strong>Q{id}:</strong> {text}</td><td class='center'>{dim}</td><td class='center'><strong>{resp}</strong></td></tr>",
            id = d.id,
            text = escape_html(&d.text),
            dim = escape_html(&d.dimension),
            resp = escape_html(&d.response),
        );
    }
    html.push_str("</table>");
    html
}

fn axis_lines(scores: &DimensionScores) -> String {
    Axis::ALL
        .iter()
        .map(|a| {
            let outcome = axis_outcome(scores, *a);
            format!(
                "<li>{} <small>(confidence {:.2})</small></li>",
                escape_html(&outcome.summary_line()),
                outcome.confidence
            )
        })
        .collect::<Vec<_>>()
        .join("\n                    ")
}

const STYLE: &str = r#"
        :root {
            --bg-color: #ffffff;
            --text-color: #333333;
            --border-color: #ddd;
            --section-bg: #f9f9f9;
            --table-header-bg: #f0f0f0;
        }
        [data-theme="dark"] {
            --bg-color: #1a1a1a;
            --text-color: #e0e0e0;
            --border-color: #444;
            --section-bg: #2a2a2a;
            --table-header-bg: #333;
        }
        body {
            font-family: Arial, sans-serif;
            margin: 40px;
            line-height: 1.6;
            background-color: var(--bg-color);
            color: var(--text-color);
            transition: background-color 0.3s, color 0.3s;
        }
        .header { text-align: center; margin-bottom: 30px; position: relative; }
        .theme-toggle {
            position: absolute; top: 0; right: 0;
            background: #4CAF50; color: white; border: none;
            padding: 8px 12px; border-radius: 4px; cursor: pointer; font-size: 14px;
        }
        .theme-toggle:hover { background: #45a049; }
        .type-badge { background: #4CAF50; color: white; padding: 10px 20px; border-radius: 5px; }
        .section { margin: 20px 0; }
        .section h2 { color: var(--text-color); border-bottom: 2px solid #4CAF50; }
        ul { padding-left: 20px; }
        .analysis { background: var(--section-bg); padding: 15px; border-left: 4px solid #4CAF50; }
        table { width: 100%; border-collapse: collapse; }
        th { background: var(--table-header-bg); }
        td, th { padding: 8px; border: 1px solid var(--border-color); }
        td.center { text-align: center; }
"#;

const SCRIPT: &str = r#"
        function toggleTheme() {
            const body = document.body;
            const button = document.querySelector('.theme-toggle');
            if (body.getAttribute('data-theme') === 'dark') {
                body.removeAttribute('data-theme');
                button.textContent = 'Dark';
                localStorage.setItem('theme', 'light');
            } else {
                body.setAttribute('data-theme', 'dark');
                button.textContent = 'Light';
                localStorage.setItem('theme', 'dark');
            }
        }
        if (localStorage.getItem('theme') === 'dark') {
            document.body.setAttribute('data-theme', 'dark');
            document.querySelector('.theme-toggle').textContent = 'Light';
        }
"#;

/// Render the self-contained report. Pure: no I/O, clock passed in.
pub fn assemble(
    personality: &PersonalityType,
    scores: &DimensionScores,
    details: &[ResponseDetail],
    narrative: &str,
    generated_at: DateTime<Local>,
) -> ReportDocument {
    let code = escape_html(&personality.code);
    let profile = type_profile(&personality.code);
    let temperament = Temperament::of(&personality.code)
        .filter(|_| !profile.code.is_empty())
        .map(|t| format!("<p>{}</p>", t.label()))
        .unwrap_or_default();
    let narrative_html = if narrative.trim().is_empty() {
        "<p>AI analysis not performed.</p>".to_string()
    } else {
        markdown_to_html(narrative)
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>MBTI Report - {code}</title>
    <style>{style}</style>
</head>
<body>
    <div class="header">
        <button class="theme-toggle" onclick="toggleTheme()">Dark</button>
        <h1>Your Personality Type</h1>
        <div class="type-badge">{code} - {name}</div>
        <p><em>{description}</em></p>
        {temperament}
    </div>

    <div class="section">
        <h2>Question Responses</h2>
        <div class="responses">
{table}
        </div>
    </div>

    <div class="section">
        <h2>Strengths</h2>
        <ul>
                {strengths}
        </ul>
    </div>

    <div class="section">
        <h2>Areas for Growth</h2>
        <ul>
                {weaknesses}
        </ul>
    </div>

    <div class="section">
        <h2>Career Suggestions</h2>
        <ul>
                {careers}
        </ul>
    </div>

    <div class="section">
        <h2>Analysis Details</h2>
        <div class="analysis">
            <h3>Traditional Scoring</h3>
            <ul>
                    {axes}
            </ul>

            <h3>AI Analysis</h3>
            <div>{narrative}</div>
        </div>
    </div>

    <div class="section">
        <p><small>Report generated on {stamp}</small></p>
    </div>

    <script>{script}</script>
</body>
</html>
"#,
        style = STYLE,
        name = escape_html(profile.name),
        description = escape_html(profile.description),
        table = responses_table(details),
        strengths = list_items(profile.strengths),
        weaknesses = list_items(profile.weaknesses),
        careers = list_items(profile.careers),
        axes = axis_lines(scores),
        narrative = narrative_html,
        stamp = generated_at.format("%Y-%m-%d %H:%M:%S"),
        script = SCRIPT,
    );

    ReportDocument {
        type_code: personality.code.clone(),
        type_name: profile.name.to_string(),
        generated_at,
        html,
    }
}

/// Persist the report under `dir`; never overwrites an existing file
pub fn write_report(doc: &ReportDocument, dir: &Path) -> Result<PathBuf> {
    let path = write_new_file(dir, &doc.file_stem(), "html", doc.html.as_bytes())?;
    tracing::info!("Report written to {}", path.display());
    Ok(path)
}
