use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::app::App;
use crate::ui::{
    dialogs::DialogWidget, palette::Overview, result_view::ResultScreenWidget, SessionWidget,
};

/// A UI Screen boundary: one per top-level view of the app
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Loading, consent, question view and the terminal session states
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(session) = &app.session else {
            return;
        };
        SessionWidget {
            session,
            jump_input: app.jump.as_ref().map(|j| j.input()),
        }
        .render(area, buf);

        if let Some(dialog) = session.dialog() {
            DialogWidget { dialog }.render(area, buf);
        }
    }
}

/// Whole-test palette overlay
pub struct OverviewScreen;

impl Screen for OverviewScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(session) = &app.session else {
            return;
        };
        Overview { session }.render(area, buf);
        if let Some(dialog) = session.dialog() {
            DialogWidget { dialog }.render(area, buf);
        }
    }
}

pub struct ResultScreen;

impl Screen for ResultScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        if let Some(view) = &app.result {
            ResultScreenWidget { view }.render(area, buf);
        }
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    if app.result.is_some() {
        Box::new(ResultScreen)
    } else if app.show_overview {
        Box::new(OverviewScreen)
    } else {
        Box::new(SessionScreen)
    }
}
