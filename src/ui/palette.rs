use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::session::TestSession;
use crate::status::{QuestionStatus, StatusCounts};

const CELL_WIDTH: usize = 4;

pub fn status_style(status: QuestionStatus) -> Style {
    match status {
        QuestionStatus::NotVisited => Style::default().fg(Color::DarkGray),
        QuestionStatus::VisitedUnanswered => Style::default().fg(Color::Red),
        QuestionStatus::Answered => Style::default().fg(Color::Green),
        QuestionStatus::MarkedForReview => Style::default().fg(Color::Magenta),
    }
}

/// Numbered question cells, `per_row` to a line. `current` is highlighted.
pub fn grid_lines(
    statuses: &[QuestionStatus],
    current: Option<usize>,
    per_row: usize,
    dimmed: bool,
) -> Vec<Line<'static>> {
    statuses
        .iter()
        .enumerate()
        .chunks(per_row.max(1))
        .into_iter()
        .map(|row| {
            let spans = row
                .map(|(idx, status)| {
                    let mut style = status_style(*status).add_modifier(Modifier::BOLD);
                    if current == Some(idx) {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    if dimmed {
                        style = style.add_modifier(Modifier::DIM);
                    }
                    Span::styled(format!("{:>3} ", idx + 1), style)
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

pub fn legend_lines(counts: &StatusCounts) -> Vec<Line<'static>> {
    QuestionStatus::LEGEND
        .iter()
        .map(|status| {
            Line::from(vec![
                Span::styled("■ ", status_style(*status)),
                Span::raw(format!("{status}: {}", counts.get(*status))),
            ])
        })
        .collect()
}

/// Question grid for the active section plus the legend.
pub struct SectionPalette<'a> {
    pub session: &'a TestSession,
}

impl Widget for SectionPalette<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(nav) = self.session.navigator() else {
            return;
        };
        let section = nav.section_index();
        let per_row = (area.width.saturating_sub(2) as usize / CELL_WIDTH).max(1);

        let mut lines = grid_lines(
            &self.session.section_statuses(section),
            Some(nav.question_index()),
            per_row,
            false,
        );
        lines.push(Line::default());
        lines.extend(legend_lines(&self.session.section_counts(section)));

        let title = self
            .session
            .current_section()
            .map(|s| format!(" {} ", s.name))
            .unwrap_or_default();

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Read-only palette of every section; sections already left are shown locked.
pub struct Overview<'a> {
    pub session: &'a TestSession,
}

impl Widget for Overview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (Some(test), Some(nav)) = (self.session.test(), self.session.navigator()) else {
            return;
        };
        let per_row = (area.width.saturating_sub(2) as usize / CELL_WIDTH).max(1);
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut lines = Vec::new();
        for (idx, section) in test.sections.iter().enumerate() {
            let marker = if nav.is_section_locked(idx) {
                " (locked)"
            } else if idx == nav.section_index() {
                " (current)"
            } else {
                ""
            };
            lines.push(Line::from(Span::styled(
                format!("{}{marker}", section.name),
                bold,
            )));

            let current = (idx == nav.section_index()).then(|| nav.question_index());
            lines.extend(grid_lines(
                &self.session.section_statuses(idx),
                current,
                per_row,
                nav.is_section_locked(idx),
            ));
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            "(v/esc) back to the question",
            Style::default().add_modifier(Modifier::DIM),
        )));

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Overview "))
            .render(area, buf);
    }
}
