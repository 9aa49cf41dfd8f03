use std::collections::{HashMap, HashSet};

use crate::model::QuestionId;

/// Palette state of a question. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum QuestionStatus {
    #[strum(to_string = "Not visited")]
    NotVisited,
    #[strum(to_string = "Visited, not answered")]
    VisitedUnanswered,
    #[strum(to_string = "Answered")]
    Answered,
    #[strum(to_string = "Marked for review")]
    MarkedForReview,
}

impl QuestionStatus {
    /// Order used by the palette legend.
    pub const LEGEND: [QuestionStatus; 4] = [
        QuestionStatus::MarkedForReview,
        QuestionStatus::VisitedUnanswered,
        QuestionStatus::Answered,
        QuestionStatus::NotVisited,
    ];

    /// Review wins over answered, answered over visited.
    fn derive(visited: bool, answered: bool, marked: bool) -> Self {
        if marked {
            QuestionStatus::MarkedForReview
        } else if answered {
            QuestionStatus::Answered
        } else if visited {
            QuestionStatus::VisitedUnanswered
        } else {
            QuestionStatus::NotVisited
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_visited: usize,
    pub visited_unanswered: usize,
    pub answered: usize,
    pub marked_for_review: usize,
}

impl StatusCounts {
    pub fn get(&self, status: QuestionStatus) -> usize {
        match status {
            QuestionStatus::NotVisited => self.not_visited,
            QuestionStatus::VisitedUnanswered => self.visited_unanswered,
            QuestionStatus::Answered => self.answered,
            QuestionStatus::MarkedForReview => self.marked_for_review,
        }
    }
}

/// Answer map plus the visit and review flags the palette is derived from.
///
/// Answers are zero-based option indices. They can be replaced but never
/// removed, so the map only grows over an attempt.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    answers: HashMap<QuestionId, usize>,
    visited: HashSet<QuestionId>,
    marked: HashSet<QuestionId>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a question is entered.
    pub fn visit(&mut self, id: &QuestionId) -> bool {
        self.visited.insert(id.clone())
    }

    /// Record a selection; selecting also counts as a visit.
    pub fn select(&mut self, id: &QuestionId, option: usize) {
        self.visited.insert(id.clone());
        self.answers.insert(id.clone(), option);
    }

    /// Flip the review flag, returning its new value.
    pub fn toggle_review(&mut self, id: &QuestionId) -> bool {
        if self.marked.remove(id) {
            false
        } else {
            self.marked.insert(id.clone());
            true
        }
    }

    pub fn answer(&self, id: &QuestionId) -> Option<usize> {
        self.answers.get(id).copied()
    }

    pub fn answers(&self) -> &HashMap<QuestionId, usize> {
        &self.answers
    }

    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    pub fn is_visited(&self, id: &QuestionId) -> bool {
        self.visited.contains(id)
    }

    pub fn is_marked(&self, id: &QuestionId) -> bool {
        self.marked.contains(id)
    }

    pub fn status(&self, id: &QuestionId) -> QuestionStatus {
        QuestionStatus::derive(self.is_visited(id), self.is_answered(id), self.is_marked(id))
    }

    pub fn counts<'a>(&self, ids: impl IntoIterator<Item = &'a QuestionId>) -> StatusCounts {
        ids.into_iter()
            .fold(StatusCounts::default(), |mut counts, id| {
                match self.status(id) {
                    QuestionStatus::NotVisited => counts.not_visited += 1,
                    QuestionStatus::VisitedUnanswered => counts.visited_unanswered += 1,
                    QuestionStatus::Answered => counts.answered += 1,
                    QuestionStatus::MarkedForReview => counts.marked_for_review += 1,
                }
                counts
            })
    }

    pub fn unanswered<'a>(&self, ids: impl IntoIterator<Item = &'a QuestionId>) -> usize {
        ids.into_iter().filter(|id| !self.is_answered(id)).count()
    }
}
