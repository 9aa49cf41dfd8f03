use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use crate::app::{ResultState, ResultView};
use crate::result::{QuestionAnalysis, SectionResult, TestResult};
use crate::timer::format_clock;

fn score_color(score: f64) -> Color {
    if score >= 75.0 {
        Color::Green
    } else if score >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn summary_lines(result: &TestResult) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let score = result.score();

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{score:.1}%"),
            bold.fg(score_color(score)),
        ),
        Span::raw(format!(
            "  {} / {} correct  ·  {} attempted  ·  time {}",
            result.correct_answers,
            result.total_questions,
            result.attempted(),
            format_clock(result.time_spent),
        )),
    ])];

    let mut flags = vec![format!("tab switches: {}", result.tab_switches)];
    if result.auto_submitted {
        flags.push("auto-submitted".to_string());
    }
    lines.push(Line::styled(
        flags.join("  ·  "),
        Style::default().add_modifier(Modifier::DIM),
    ));
    if result.invalid {
        lines.push(Line::styled(
            "This attempt was marked invalid.",
            bold.fg(Color::Red),
        ));
    }
    lines
}

fn section_row(section: &SectionResult) -> Row<'static> {
    Row::new(vec![
        Cell::from(section.name.clone()),
        Cell::from(format!("{}/{}", section.correct_answers, section.total_questions)),
        Cell::from(format!("{:.1}%", section.score))
            .style(Style::default().fg(score_color(section.score))),
        Cell::from(format_clock(section.time_spent)),
    ])
}

fn analysis_lines(idx: usize, q: &QuestionAnalysis) -> Vec<Line<'static>> {
    let (mark, color) = if !q.was_answered() {
        ("–", Color::DarkGray)
    } else if q.is_correct {
        ("✓", Color::Green)
    } else {
        ("✗", Color::Red)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{mark} "), Style::default().fg(color)),
        Span::styled(
            format!("{}. {}", idx + 1, q.question_text),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    let selected = q
        .option_label(q.selected_option)
        .unwrap_or_else(|| "not answered".to_string());
    let correct = q.option_label(q.correct_option).unwrap_or_default();
    lines.push(Line::raw(format!("   yours: {selected}   correct: {correct}")));
    lines
}

pub struct ResultScreenWidget<'a> {
    pub view: &'a ResultView,
}

impl Widget for ResultScreenWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Result {} ", self.view.result_id));

        let result = match &self.view.state {
            ResultState::Loading => {
                Paragraph::new("Loading result…")
                    .alignment(Alignment::Center)
                    .block(block)
                    .render(area, buf);
                return;
            }
            ResultState::Failed(message) => {
                Paragraph::new(vec![
                    Line::styled(message.clone(), Style::default().fg(Color::Red)),
                    Line::default(),
                    Line::raw("(q) quit"),
                ])
                .alignment(Alignment::Center)
                .block(block)
                .render(area, buf);
                return;
            }
            ResultState::Loaded(result) => result,
        };

        let inner = block.inner(area);
        block.render(area, buf);

        let summary = summary_lines(result);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(summary.len() as u16 + 1),
                Constraint::Length(result.sections.len() as u16 + 3),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(summary).render(chunks[0], buf);

        let header = Row::new(vec!["Section", "Correct", "Score", "Time"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let widths = [
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(10),
        ];
        Table::new(result.sections.iter().map(section_row), widths)
            .header(header)
            .block(Block::default().borders(Borders::TOP).title("Sections"))
            .column_spacing(2)
            .render(chunks[1], buf);

        // Scrolling is by question, so wrapped lines never skew the offset.
        let analysis: Vec<Line> = result
            .questions
            .iter()
            .enumerate()
            .skip(self.view.scroll)
            .flat_map(|(idx, q)| analysis_lines(idx, q))
            .collect();
        Paragraph::new(analysis)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title("Questions"))
            .render(chunks[2], buf);

        Paragraph::new("(↑/↓) scroll  (q) quit")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TestResult {
        TestResult {
            id: "r1".into(),
            total_questions: 4,
            correct_answers: 3,
            time_spent: 754,
            invalid: true,
            tab_switches: 2,
            auto_submitted: true,
            sections: vec![SectionResult {
                name: "Aptitude".into(),
                total_questions: 4,
                correct_answers: 3,
                score: 75.0,
                time_spent: 754,
            }],
            questions: vec![QuestionAnalysis {
                question_text: "2 + 2".into(),
                options: vec!["3".into(), "4".into()],
                correct_option: 1,
                selected_option: 1,
                is_correct: true,
            }],
        }
    }

    fn rendered(view: &ResultView) -> String {
        let area = Rect::new(0, 0, 90, 30);
        let mut buf = Buffer::empty(area);
        ResultScreenWidget { view }.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn summary_mentions_flags() {
        let text: String = summary_lines(&sample())
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("75.0%"));
        assert!(text.contains("3 / 4 correct"));
        assert!(text.contains("auto-submitted"));
        assert!(text.contains("marked invalid"));
        assert!(text.contains("time 12:34"));
    }

    #[test]
    fn renders_loaded_result() {
        let view = ResultView {
            result_id: "r1".into(),
            state: ResultState::Loaded(sample()),
            scroll: 0,
        };
        let text = rendered(&view);
        assert!(text.contains("Aptitude"));
        assert!(text.contains("yours: B. 4"));
    }

    #[test]
    fn scrolling_starts_the_list_at_a_later_question() {
        let mut result = sample();
        let mut second = result.questions[0].clone();
        second.question_text = "3 * 3".into();
        result.questions.push(second);

        let mut view = ResultView {
            result_id: "r1".into(),
            state: ResultState::Loaded(result),
            scroll: 0,
        };
        assert!(rendered(&view).contains("1. 2 + 2"));

        view.scroll = 1;
        let text = rendered(&view);
        assert!(!text.contains("1. 2 + 2"));
        assert!(text.contains("2. 3 * 3"));
    }

    #[test]
    fn renders_loading_and_failure() {
        let mut view = ResultView {
            result_id: "r1".into(),
            state: ResultState::Loading,
            scroll: 0,
        };
        assert!(rendered(&view).contains("Loading result"));

        view.state = ResultState::Failed("Test not found.".into());
        assert!(rendered(&view).contains("Test not found."));
    }
}
