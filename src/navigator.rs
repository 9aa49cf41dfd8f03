use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("question {index} is outside the current section ({len} questions)")]
    OutsideSection { index: usize, len: usize },
    #[error("reach the last question of this section to move on")]
    NotAtSectionEnd,
    #[error("this is the last section")]
    NoNextSection,
}

/// Position within a test: a forward-only section index and a question
/// index relative to that section.
///
/// Sections behind the active one are locked for the rest of the attempt.
/// The question grid is scoped to the active section, so jumps never cross
/// a section boundary.
#[derive(Debug, Clone)]
pub struct SectionNavigator {
    section_lengths: Vec<usize>,
    section: usize,
    question: usize,
}

impl SectionNavigator {
    pub fn new(section_lengths: Vec<usize>) -> Self {
        Self {
            section_lengths,
            section: 0,
            question: 0,
        }
    }

    pub fn section_index(&self) -> usize {
        self.section
    }

    pub fn question_index(&self) -> usize {
        self.question
    }

    pub fn section_count(&self) -> usize {
        self.section_lengths.len()
    }

    pub fn section_len(&self) -> usize {
        self.section_lengths.get(self.section).copied().unwrap_or(0)
    }

    pub fn is_last_question_in_section(&self) -> bool {
        self.question + 1 >= self.section_len()
    }

    pub fn is_last_section(&self) -> bool {
        self.section + 1 >= self.section_count()
    }

    pub fn is_section_locked(&self, index: usize) -> bool {
        index < self.section
    }

    pub fn next_question(&mut self) -> bool {
        if self.is_last_question_in_section() {
            return false;
        }
        self.question += 1;
        true
    }

    pub fn previous_question(&mut self) -> bool {
        if self.question == 0 {
            return false;
        }
        self.question -= 1;
        true
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), NavError> {
        let len = self.section_len();
        if index >= len {
            return Err(NavError::OutsideSection { index, len });
        }
        self.question = index;
        Ok(())
    }

    pub fn can_advance_section(&self) -> bool {
        !self.is_last_section() && self.is_last_question_in_section()
    }

    /// Student-initiated move; only allowed from the end of a non-final section.
    pub fn advance_section(&mut self) -> Result<usize, NavError> {
        if self.is_last_section() {
            return Err(NavError::NoNextSection);
        }
        if !self.is_last_question_in_section() {
            return Err(NavError::NotAtSectionEnd);
        }
        Ok(self.enter(self.section + 1))
    }

    /// Move on regardless of position, e.g. when the section clock runs out.
    pub fn force_advance_section(&mut self) -> Option<usize> {
        if self.is_last_section() {
            return None;
        }
        Some(self.enter(self.section + 1))
    }

    pub fn can_submit(&self) -> bool {
        self.is_last_section() && self.is_last_question_in_section()
    }

    fn enter(&mut self, section: usize) -> usize {
        self.section = section;
        self.question = 0;
        section
    }
}
