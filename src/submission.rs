use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, Test};
use crate::status::StatusTracker;

/// Wire value for a question left unanswered.
pub const UNANSWERED: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAnswer {
    pub question_id: QuestionId,
    /// One-based option index, or [`UNANSWERED`].
    pub selected_option: i64,
    pub section_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSubmission {
    pub is_auto_submitted: bool,
    pub tab_switches: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub selected_answers: Vec<SelectedAnswer>,
    /// Whole seconds.
    pub time_taken: u64,
    pub auto_submission: AutoSubmission,
}

impl SubmitPayload {
    pub fn answered_count(&self) -> usize {
        self.selected_answers
            .iter()
            .filter(|a| a.selected_option != UNANSWERED)
            .count()
    }
}

/// Build the submission body: one entry per question, in test order.
///
/// Stored answers are zero-based; the backend expects one-based indices.
pub fn assemble(
    test: &Test,
    answers: &StatusTracker,
    elapsed: Duration,
    auto_submission: AutoSubmission,
) -> SubmitPayload {
    let selected_answers = test
        .questions()
        .map(|(section, question)| SelectedAnswer {
            question_id: question.id.clone(),
            selected_option: answers
                .answer(&question.id)
                .map_or(UNANSWERED, |index| index as i64 + 1),
            section_name: section.name.clone(),
        })
        .collect();

    SubmitPayload {
        selected_answers,
        time_taken: elapsed.as_secs(),
        auto_submission,
    }
}
