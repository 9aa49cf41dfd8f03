pub mod dialogs;
pub mod palette;
pub mod result_view;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::model::QuestionContent;
use crate::result::option_letter;
use crate::session::{NoticeLevel, Phase, TestSession};
use crate::timer::{format_clock, Urgency};
use palette::SectionPalette;

const PALETTE_WIDTH: u16 = 30;
const HINTS: &str = "(←/→) move  (enter) save & next  (m) review  (g) go to  (v) overview  (n) next section  (s) submit";

/// Keys that pick an option on a question with `options` choices: digits up
/// to 9, letters up to d.
fn answer_keys(options: usize) -> Option<String> {
    let last_digit = options.min(9);
    let last_letter = option_letter(options.min(4).checked_sub(1)?).to_ascii_lowercase();
    Some(if options == 1 {
        "(1/a) answer".to_string()
    } else {
        format!("(1-{last_digit}/a-{last_letter}) answer")
    })
}

fn hint_line(session: &TestSession) -> String {
    match session.current_question().and_then(|q| answer_keys(q.option_count())) {
        Some(keys) => format!("{keys}  {HINTS}"),
        None => HINTS.to_string(),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self).render(self, area, buf);
    }
}

fn urgency_style(urgency: Urgency) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match urgency {
        Urgency::Normal => bold,
        Urgency::Warning => bold.fg(Color::Yellow),
        Urgency::Critical => bold.fg(Color::Red),
    }
}

fn centered_message(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let rect = Rect {
        y: area.y + top,
        height: height.min(area.height),
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rect, buf);
}

/// Everything on screen while a test id is being taken.
pub struct SessionWidget<'a> {
    pub session: &'a TestSession,
    /// Digits typed so far after `g`, when the jump prompt is open.
    pub jump_input: Option<&'a str>,
}

impl Widget for SessionWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dim = Style::default().add_modifier(Modifier::DIM);

        match self.session.phase() {
            Phase::Loading => centered_message(
                vec![Line::raw(format!("Loading test {}…", self.session.test_id()))],
                area,
                buf,
            ),
            Phase::LoadFailed(message) => centered_message(
                vec![
                    Line::styled(
                        "Could not load the test",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Line::raw(message.clone()),
                    Line::default(),
                    Line::styled("(q) quit", dim),
                ],
                area,
                buf,
            ),
            Phase::Consent => self.render_consent(area, buf),
            Phase::Ready | Phase::Submitting => self.render_attempt(area, buf),
            Phase::Submitted { result_id } => {
                let at = self
                    .session
                    .submitted_at()
                    .map(|t| format!(" at {}", t.format("%H:%M")))
                    .unwrap_or_default();
                let mut lines = vec![Line::styled(
                    format!("Test submitted{at}."),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )];
                if result_id.is_none() {
                    lines.push(Line::raw("Your result will be available from your dashboard."));
                }
                lines.push(Line::default());
                lines.push(Line::styled("(q) quit", dim));
                centered_message(lines, area, buf);
            }
        }
    }
}

impl SessionWidget<'_> {
    fn render_consent(&self, area: Rect, buf: &mut Buffer) {
        let Some(test) = self.session.test() else {
            return;
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::styled(test.name.clone(), bold),
            Line::raw(format!(
                "{} sections · {} questions",
                test.sections.len(),
                test.question_count()
            )),
            Line::default(),
        ];
        for section in &test.sections {
            let time = if section.duration_secs > 0 {
                format_clock(section.duration_secs)
            } else {
                "untimed".to_string()
            };
            lines.push(Line::raw(format!(
                "  • {}: {} questions, {time}",
                section.name,
                section.questions.len()
            )));
        }
        if test.total_duration_secs > 0 {
            lines.push(Line::raw(format!(
                "  Total time: {}",
                format_clock(test.total_duration_secs)
            )));
        }

        lines.push(Line::default());
        lines.push(Line::styled("Rules", bold));
        lines.push(Line::raw(
            "  Sections are one-way: once you move on you cannot return.",
        ));
        lines.push(Line::raw(
            "  When a section's time runs out you are moved on automatically.",
        ));
        if test.proctoring_enabled {
            lines.push(Line::raw(format!(
                "  Leaving this window counts as a tab switch. At {} switches the test is submitted automatically.",
                self.session.max_tab_switches()
            )));
        }
        lines.push(Line::default());
        lines.push(Line::styled(
            "(enter) start  (q) quit",
            Style::default().fg(Color::Cyan),
        ));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Before you begin "),
            )
            .render(area, buf);
    }

    fn render_attempt(&self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(PALETTE_WIDTH)])
            .split(rows[1]);

        self.render_header(rows[0], buf);
        self.render_question(body[0], buf);
        SectionPalette {
            session: self.session,
        }
        .render(body[1], buf);
        self.render_footer(rows[2], buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let (Some(test), Some(nav)) = (session.test(), session.navigator()) else {
            return;
        };

        let mut spans = vec![Span::raw(format!(
            "Section {}/{}: {}",
            nav.section_index() + 1,
            nav.section_count(),
            session.current_section().map_or("", |s| s.name.as_str())
        ))];

        let mut clock = |label: &str, remaining: u64| {
            spans.push(Span::raw("  │  "));
            spans.push(Span::raw(format!("{label} ")));
            spans.push(Span::styled(
                format_clock(remaining),
                urgency_style(Urgency::for_remaining(remaining)),
            ));
        };
        if let Some(remaining) = session.section_remaining() {
            clock("Section", remaining);
        }
        if let Some(remaining) = session.total_remaining() {
            clock("Total", remaining);
        }

        if test.proctoring_enabled {
            let switches = session.tab_switches();
            let style = if switches > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            spans.push(Span::raw("  │  "));
            spans.push(Span::styled(
                format!("Tab switches {}/{}", switches, session.max_tab_switches()),
                style,
            ));
        }

        Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", test.name)),
            )
            .render(area, buf);
    }

    fn render_question(&self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let Some(nav) = session.navigator() else {
            return;
        };

        let Some(question) = session.current_question() else {
            Paragraph::new("This section has no questions. Press n to continue.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL))
                .render(area, buf);
            return;
        };

        let marked = session
            .tracker()
            .is_some_and(|t| t.is_marked(&question.id));
        let title = format!(
            " Question {} of {}{} ",
            nav.question_index() + 1,
            nav.section_len(),
            if marked { " · marked for review" } else { "" }
        );

        let mut lines: Vec<Line> = match &question.content {
            QuestionContent::Text(text) => text.lines().map(|l| Line::raw(l.to_string())).collect(),
            QuestionContent::Image { url, alt } => {
                let mut lines = vec![
                    Line::styled(
                        format!("[image] {url}"),
                        Style::default().fg(Color::Cyan),
                    ),
                    Line::styled(
                        "(o) open in browser",
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ];
                if alt.trim() != url {
                    lines.push(Line::raw(alt.clone()));
                }
                lines
            }
        };
        lines.push(Line::default());

        let selected = session.selected_option();
        for (idx, option) in question.options.iter().enumerate() {
            let chosen = selected == Some(idx);
            let style = if chosen {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if chosen { "(●)" } else { "( )" };
            lines.push(Line::styled(
                format!("{marker} {}. {option}", option_letter(idx)),
                style,
            ));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title))
            .render(area, buf);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let status = if *self.session.phase() == Phase::Submitting {
            Line::styled(
                "Submitting…",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else if let Some(input) = self.jump_input {
            Line::raw(format!("Go to question: {input}_"))
        } else if let Some(notice) = self.session.notice() {
            let color = match notice.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Warning => Color::Yellow,
            };
            Line::styled(notice.text.clone(), Style::default().fg(color))
        } else {
            let answered = self.session.tracker().map_or(0, |t| t.answers().len());
            let total = self.session.test().map_or(0, |t| t.question_count());
            Line::raw(
                [
                    format!("{answered}/{total} answered"),
                    format!("elapsed {}", format_clock(self.session.elapsed().as_secs())),
                ]
                .iter()
                .join("  ·  "),
            )
        };

        Paragraph::new(vec![
            status,
            Line::styled(hint_line(self.session), Style::default().add_modifier(Modifier::DIM)),
        ])
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionId, Section, Test};
    use crate::session::{Action, SessionSettings};

    fn sample_test() -> Test {
        Test {
            id: "t1".into(),
            name: "GATE Mock".into(),
            total_duration_secs: 5400,
            proctoring_enabled: true,
            sections: vec![Section {
                id: "t1-section-1".into(),
                name: "Aptitude".into(),
                duration_secs: 240,
                questions: vec![
                    Question {
                        id: QuestionId::new("q1"),
                        content: QuestionContent::Text("Pick the prime".into()),
                        options: vec!["4".into(), "7".into()],
                    },
                    Question {
                        id: QuestionId::new("q2"),
                        content: QuestionContent::Image {
                            url: "https://img.example.com/q2.png".into(),
                            alt: "https://img.example.com/q2.png".into(),
                        },
                        options: vec!["x".into(), "y".into()],
                    },
                ],
            }],
        }
    }

    fn render(session: &TestSession, jump_input: Option<&str>) -> String {
        let area = Rect::new(0, 0, 120, 30);
        let mut buffer = Buffer::empty(area);
        SessionWidget {
            session,
            jump_input,
        }
        .render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn loaded() -> TestSession {
        let mut session = TestSession::new("t1", SessionSettings::default());
        session.on_loaded(Ok(sample_test()));
        session
    }

    #[test]
    fn loading_screen_names_the_test() {
        let session = TestSession::new("abc123", SessionSettings::default());
        assert!(render(&session, None).contains("Loading test abc123"));
    }

    #[test]
    fn consent_screen_lists_rules() {
        let rendered = render(&loaded(), None);
        assert!(rendered.contains("Before you begin"));
        assert!(rendered.contains("Aptitude: 2 questions, 04:00"));
        assert!(rendered.contains("At 3 switches"));
    }

    #[test]
    fn question_view_shows_timers_options_and_selection() {
        let mut session = loaded();
        session.start();
        session.apply(Action::SelectOption(1));

        let rendered = render(&session, None);
        assert!(rendered.contains("Section 1/1: Aptitude"));
        assert!(rendered.contains("Section 04:00"));
        assert!(rendered.contains("Total 01:30:00"));
        assert!(rendered.contains("Question 1 of 2"));
        assert!(rendered.contains("Pick the prime"));
        assert!(rendered.contains("(●) B. 7"));
        assert!(rendered.contains("( ) A. 4"));
        assert!(rendered.contains("Tab switches 0/3"));
    }

    #[test]
    fn image_questions_offer_the_browser() {
        let mut session = loaded();
        session.start();
        session.apply(Action::NextQuestion);
        let rendered = render(&session, None);
        assert!(rendered.contains("[image] https://img.example.com/q2.png"));
        assert!(rendered.contains("(o) open in browser"));
    }

    #[test]
    fn footer_shows_jump_prompt() {
        let mut session = loaded();
        session.start();
        assert!(render(&session, Some("12")).contains("Go to question: 12_"));
    }

    #[test]
    fn answer_hint_follows_option_count() {
        assert_eq!(answer_keys(0), None);
        assert_eq!(answer_keys(1).as_deref(), Some("(1/a) answer"));
        assert_eq!(answer_keys(2).as_deref(), Some("(1-2/a-b) answer"));
        assert_eq!(answer_keys(4).as_deref(), Some("(1-4/a-d) answer"));
        assert_eq!(answer_keys(6).as_deref(), Some("(1-6/a-d) answer"));

        let mut session = loaded();
        session.start();
        assert!(render(&session, None).contains("(1-2/a-b) answer"));
    }

    #[test]
    fn urgency_colors() {
        assert_eq!(urgency_style(Urgency::Critical).fg, Some(Color::Red));
        assert_eq!(urgency_style(Urgency::Warning).fg, Some(Color::Yellow));
        assert_eq!(urgency_style(Urgency::Normal).fg, None);
    }

    #[test]
    fn small_area_does_not_panic() {
        let mut session = loaded();
        session.start();
        let area = Rect::new(0, 0, 20, 5);
        let mut buffer = Buffer::empty(area);
        SessionWidget {
            session: &session,
            jump_input: None,
        }
        .render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }
}
