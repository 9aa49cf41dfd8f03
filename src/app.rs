use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use webbrowser::Browser;

use crate::api::TestBackend;
use crate::error::ApiError;
use crate::keymap::{command_for, Command, JumpOutcome, JumpPrompt, KeyMode};
use crate::result::TestResult;
use crate::runtime::{self, AppEvent};
use crate::session::{Action, Phase, SessionSettings, SubmitRequest, TestSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Loading,
    Loaded(TestResult),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub result_id: String,
    pub state: ResultState,
    pub scroll: usize,
}

/// A focus loss this soon after the app itself opened the browser is not a
/// tab switch.
pub const IMAGE_FOCUS_GRACE: Duration = Duration::from_secs(3);

pub type ImageOpener = fn(&str) -> io::Result<()>;

fn open_in_browser(url: &str) -> io::Result<()> {
    if !Browser::is_available() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no browser available"));
    }
    webbrowser::open(url)
}

impl ResultView {
    fn loading(result_id: String) -> Self {
        Self {
            result_id,
            state: ResultState::Loading,
            scroll: 0,
        }
    }

    /// `scroll` is the first question shown in the analysis list.
    fn max_scroll(&self) -> usize {
        match &self.state {
            ResultState::Loaded(result) => result.questions.len().saturating_sub(1),
            ResultState::Loading | ResultState::Failed(_) => 0,
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = (self.scroll + 1).min(self.max_scroll());
    }
}

/// Owns the screen-level state and wires events into the session.
pub struct App {
    pub session: Option<TestSession>,
    pub result: Option<ResultView>,
    pub show_overview: bool,
    pub jump: Option<JumpPrompt>,
    backend: Arc<dyn TestBackend>,
    tx: Sender<AppEvent>,
    last_tick: Instant,
    image_opener: ImageOpener,
    image_opened_at: Option<Instant>,
}

impl App {
    /// Start loading `test_id`; the fetch runs in the background.
    pub fn for_test(
        test_id: impl Into<String>,
        settings: SessionSettings,
        backend: Arc<dyn TestBackend>,
        tx: Sender<AppEvent>,
    ) -> Self {
        let test_id = test_id.into();
        runtime::spawn_fetch_test(backend.clone(), test_id.clone(), tx.clone());
        Self {
            session: Some(TestSession::new(test_id, settings)),
            result: None,
            show_overview: false,
            jump: None,
            backend,
            tx,
            last_tick: Instant::now(),
            image_opener: open_in_browser,
            image_opened_at: None,
        }
    }

    /// Show an existing result without taking a test.
    pub fn for_result(
        result_id: impl Into<String>,
        backend: Arc<dyn TestBackend>,
        tx: Sender<AppEvent>,
    ) -> Self {
        let mut app = Self {
            session: None,
            result: None,
            show_overview: false,
            jump: None,
            backend,
            tx,
            last_tick: Instant::now(),
            image_opener: open_in_browser,
            image_opened_at: None,
        };
        app.open_result(result_id.into());
        app
    }

    /// Replace how image questions are opened; headless runs use a stub.
    pub fn with_image_opener(mut self, opener: ImageOpener) -> Self {
        self.image_opener = opener;
        self
    }

    pub fn key_mode(&self) -> KeyMode {
        if self.result.is_some() {
            return KeyMode::Finished;
        }
        let Some(session) = &self.session else {
            return KeyMode::Finished;
        };
        match session.phase() {
            Phase::Loading | Phase::Consent => KeyMode::Consent,
            Phase::LoadFailed(_) | Phase::Submitted { .. } => KeyMode::Finished,
            Phase::Ready | Phase::Submitting => {
                if session.dialog().is_some() {
                    KeyMode::Dialog
                } else if self.show_overview {
                    KeyMode::Overview
                } else {
                    KeyMode::Session
                }
            }
        }
    }

    pub fn handle(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Key(key) => return self.on_key(key),
            AppEvent::Tick => self.on_tick(Instant::now()),
            AppEvent::FocusLost(at) => {
                if self.image_focus_expected(at) {
                    tracing::debug!("focus moved to the image viewer, not counted");
                } else {
                    let request = self.session.as_mut().and_then(|s| s.on_focus_lost(at));
                    self.dispatch(request);
                }
            }
            AppEvent::FocusGained | AppEvent::Resize => {}
            AppEvent::TestLoaded(outcome) => {
                if let Some(session) = self.session.as_mut() {
                    session.on_loaded(outcome);
                }
            }
            AppEvent::SubmitFinished(outcome) => self.on_submit_finished(outcome),
            AppEvent::ResultLoaded(outcome) => {
                if let Some(view) = self.result.as_mut() {
                    view.state = match outcome {
                        Ok(result) => ResultState::Loaded(result),
                        Err(err) => {
                            tracing::error!(result_id = %view.result_id, error = %err, "failed to load result");
                            ResultState::Failed(err.user_message())
                        }
                    };
                }
            }
        }
        Flow::Continue
    }

    /// Feed the wall time since the previous tick into the session clocks.
    pub fn on_tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        let request = self.session.as_mut().and_then(|s| s.on_tick(elapsed));
        self.dispatch(request);
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        let mode = self.key_mode();
        if let Some(prompt) = self.jump.as_mut() {
            if mode == KeyMode::Session {
                match prompt.handle(key) {
                    JumpOutcome::Pending => {}
                    JumpOutcome::Cancelled => self.jump = None,
                    JumpOutcome::Jump(index) => {
                        self.jump = None;
                        self.apply(Action::JumpTo(index));
                    }
                }
                return Flow::Continue;
            }
            self.jump = None;
        }

        let Some(command) = command_for(key, mode) else {
            return Flow::Continue;
        };

        match command {
            Command::Quit => return Flow::Quit,
            Command::Session(action) => self.apply(action),
            Command::ToggleOverview => self.show_overview = !self.show_overview,
            Command::BeginJump => self.jump = Some(JumpPrompt::default()),
            Command::OpenImage => self.open_image(),
            Command::ScrollUp => {
                if let Some(view) = self.result.as_mut() {
                    view.scroll_up();
                }
            }
            Command::ScrollDown => {
                if let Some(view) = self.result.as_mut() {
                    view.scroll_down();
                }
            }
        }
        Flow::Continue
    }

    fn apply(&mut self, action: Action) {
        let request = self.session.as_mut().and_then(|s| s.apply(action));
        self.dispatch(request);
    }

    fn dispatch(&mut self, request: Option<SubmitRequest>) {
        if let Some(request) = request {
            self.show_overview = false;
            self.jump = None;
            runtime::spawn_submit(self.backend.clone(), request, self.tx.clone());
        }
    }

    fn on_submit_finished(&mut self, outcome: Result<Option<String>, ApiError>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.on_submit_finished(outcome);
        let result_id = match session.phase() {
            Phase::Submitted {
                result_id: Some(id),
            } => Some(id.clone()),
            _ => None,
        };
        if let Some(result_id) = result_id {
            self.open_result(result_id);
        }
    }

    fn open_result(&mut self, result_id: String) {
        runtime::spawn_fetch_result(self.backend.clone(), result_id.clone(), self.tx.clone());
        self.result = Some(ResultView::loading(result_id));
    }

    fn open_image(&mut self) {
        let Some(url) = self
            .session
            .as_ref()
            .and_then(|s| s.current_question())
            .and_then(|q| q.content.image_url())
        else {
            return;
        };
        match (self.image_opener)(url) {
            Ok(()) => self.image_opened_at = Some(Instant::now()),
            Err(err) => tracing::warn!(%url, error = %err, "could not open image"),
        }
    }

    /// Consumes the grace window: only the first focus loss after opening
    /// an image is excused.
    fn image_focus_expected(&mut self, at: Instant) -> bool {
        self.image_opened_at
            .take()
            .is_some_and(|opened| at.saturating_duration_since(opened) < IMAGE_FOCUS_GRACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{QuestionAnalysis, TestResult};

    fn loaded(questions: usize) -> ResultView {
        let analysis = QuestionAnalysis {
            question_text: "q".into(),
            options: vec!["a".into(), "b".into()],
            correct_option: 0,
            selected_option: 1,
            is_correct: false,
        };
        ResultView {
            result_id: "r1".into(),
            state: ResultState::Loaded(TestResult {
                id: "r1".into(),
                total_questions: questions as u32,
                correct_answers: 0,
                time_spent: 10,
                invalid: false,
                tab_switches: 0,
                auto_submitted: false,
                sections: vec![],
                questions: vec![analysis; questions],
            }),
            scroll: 0,
        }
    }

    #[test]
    fn scroll_stops_at_the_last_question() {
        let mut view = loaded(3);
        for _ in 0..10 {
            view.scroll_down();
        }
        assert_eq!(view.scroll, 2);
        view.scroll_up();
        assert_eq!(view.scroll, 1);
    }

    #[test]
    fn scroll_is_pinned_while_loading() {
        let mut view = ResultView::loading("r1".into());
        view.scroll_down();
        assert_eq!(view.scroll, 0);
        view.scroll_up();
        assert_eq!(view.scroll, 0);
    }
}
