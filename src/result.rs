use std::io::Write;

use serde::Serialize;

use crate::submission::UNANSWERED;

/// Percentage of `correct` over `total`; zero when there is nothing to score.
pub fn compute_score(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total) * 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionResult {
    pub name: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub score: f64,
    pub time_spent: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAnalysis {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option: i64,
    pub selected_option: i64,
    pub is_correct: bool,
}

impl QuestionAnalysis {
    pub fn was_answered(&self) -> bool {
        self.selected_option != UNANSWERED
    }

    /// Label for a zero-based option index as reported in the result,
    /// e.g. `B. Paris` for 1. [`UNANSWERED`] and out-of-range give `None`.
    pub fn option_label(&self, index: i64) -> Option<String> {
        let index = usize::try_from(index).ok()?;
        let text = self.options.get(index)?;
        Some(format!("{}. {}", option_letter(index), text))
    }
}

/// `A`, `B`, ... for zero-based option indices.
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

/// Scored attempt as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub id: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_spent: u64,
    pub invalid: bool,
    pub tab_switches: u32,
    pub auto_submitted: bool,
    pub sections: Vec<SectionResult>,
    pub questions: Vec<QuestionAnalysis>,
}

impl TestResult {
    pub fn score(&self) -> f64 {
        compute_score(self.correct_answers, self.total_questions)
    }

    pub fn attempted(&self) -> usize {
        self.questions.iter().filter(|q| q.was_answered()).count()
    }
}

#[derive(Debug, Serialize)]
struct AnalysisRow<'a> {
    number: usize,
    question: &'a str,
    selected: String,
    correct: String,
    outcome: &'static str,
}

/// Write the per-question analysis as CSV.
pub fn write_analysis_csv<W: Write>(result: &TestResult, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    for (idx, q) in result.questions.iter().enumerate() {
        let outcome = if !q.was_answered() {
            "skipped"
        } else if q.is_correct {
            "correct"
        } else {
            "incorrect"
        };
        out.serialize(AnalysisRow {
            number: idx + 1,
            question: &q.question_text,
            selected: q.option_label(q.selected_option).unwrap_or_default(),
            correct: q.option_label(q.correct_option).unwrap_or_default(),
            outcome,
        })?;
    }

    out.flush()?;
    Ok(())
}
