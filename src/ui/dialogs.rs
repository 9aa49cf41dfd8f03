use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::proctor::warning_message;
use crate::session::Dialog;

pub struct DialogContent {
    pub title: String,
    pub body: Vec<String>,
    pub hint: &'static str,
    pub color: Color,
}

pub fn content_for(dialog: &Dialog) -> DialogContent {
    match dialog {
        Dialog::SectionAdvance {
            from,
            to,
            unanswered,
        } => DialogContent {
            title: format!("Leave {from}?"),
            body: vec![
                format!("You are moving on to {to}."),
                "You cannot return to this section after moving forward.".to_string(),
                format!(
                    "{unanswered} unanswered question(s) here will be skipped permanently."
                ),
            ],
            hint: "(enter) continue  (esc) stay",
            color: Color::Yellow,
        },
        Dialog::SubmitConfirm { unanswered, marked } => DialogContent {
            title: "Submit test?".to_string(),
            body: vec![
                format!("Unanswered: {unanswered}"),
                format!("Marked for review: {marked}"),
                "Answers cannot be changed after submission.".to_string(),
            ],
            hint: "(enter) submit  (esc) keep working",
            color: Color::Cyan,
        },
        Dialog::TabWarning {
            count,
            max,
            is_final,
        } => DialogContent {
            title: if *is_final {
                "Final warning".to_string()
            } else {
                "Warning".to_string()
            },
            body: vec![warning_message(*count, *max, *is_final)],
            hint: "(enter) back to the test",
            color: Color::Red,
        },
        Dialog::SubmitFailed { message } => DialogContent {
            title: "Submission failed".to_string(),
            body: vec![message.clone(), "Your answers are still here.".to_string()],
            hint: "(enter) retry  (esc) close",
            color: Color::Red,
        },
    }
}

/// Centered rect of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub struct DialogWidget<'a> {
    pub dialog: &'a Dialog,
}

impl Widget for DialogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let content = content_for(self.dialog);

        let text_width = content
            .body
            .iter()
            .map(|l| l.width())
            .chain([content.title.width(), content.hint.width()])
            .max()
            .unwrap_or(0);
        let width = (text_width as u16).saturating_add(4).clamp(30, 70);
        let height = content.body.len() as u16 + 6;
        let rect = centered(area, width, height);

        let mut lines: Vec<Line> = content.body.iter().map(|l| Line::from(l.as_str())).collect();
        lines.push(Line::default());
        lines.push(Line::styled(
            content.hint,
            Style::default().add_modifier(Modifier::DIM),
        ));

        Clear.render(rect, buf);
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(content.color))
                    .title(content.title.clone())
                    .title_style(Style::default().fg(content.color).add_modifier(Modifier::BOLD)),
            )
            .render(rect, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_dialog_states_the_lock() {
        let content = content_for(&Dialog::SectionAdvance {
            from: "Aptitude".into(),
            to: "Core".into(),
            unanswered: 2,
        });
        assert_eq!(content.title, "Leave Aptitude?");
        assert!(content.body.iter().any(|l| l.contains("cannot return")));
        assert!(content.body.iter().any(|l| l.starts_with("2 unanswered")));
    }

    #[test]
    fn final_tab_warning_is_flagged() {
        let content = content_for(&Dialog::TabWarning {
            count: 2,
            max: 3,
            is_final: true,
        });
        assert_eq!(content.title, "Final warning");
    }

    #[test]
    fn centered_rect_fits_small_areas() {
        let rect = centered(Rect::new(0, 0, 20, 5), 40, 10);
        assert_eq!(rect, Rect::new(0, 0, 20, 5));
        let rect = centered(Rect::new(0, 0, 80, 24), 40, 10);
        assert_eq!(rect, Rect::new(20, 7, 40, 10));
    }

    #[test]
    fn renders_inside_the_buffer() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        DialogWidget {
            dialog: &Dialog::SubmitConfirm {
                unanswered: 3,
                marked: 1,
            },
        }
        .render(area, &mut buf);

        let rendered: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("Submit test?"));
        assert!(rendered.contains("Unanswered: 3"));
    }
}
