use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::error::ApiError;
use crate::model::{Question, Section, Test};
use crate::navigator::SectionNavigator;
use crate::proctor::{
    TabSwitchMonitor, ViolationOutcome, DEFAULT_MAX_TAB_SWITCHES, DEFAULT_VIOLATION_COOLDOWN,
};
use crate::status::{QuestionStatus, StatusCounts, StatusTracker};
use crate::submission::{assemble, AutoSubmission, SubmitPayload};
use crate::timer::{Countdown, TimerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    LoadFailed(String),
    /// Rules shown; clocks and proctoring stay inert until the student starts.
    Consent,
    Ready,
    Submitting,
    Submitted { result_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    SectionAdvance {
        from: String,
        to: String,
        unanswered: usize,
    },
    SubmitConfirm {
        unanswered: usize,
        marked: usize,
    },
    TabWarning {
        count: u32,
        max: u32,
        is_final: bool,
    },
    SubmitFailed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Info,
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Warning,
        }
    }
}

/// Student intents, already decoded from key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    /// Zero-based option index.
    SelectOption(usize),
    ToggleReview,
    NextQuestion,
    PreviousQuestion,
    SaveAndNext,
    /// Zero-based index within the current section.
    JumpTo(usize),
    RequestNextSection,
    RequestSubmit,
    Confirm,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SubmitTrigger {
    #[strum(to_string = "manual")]
    Manual,
    #[strum(to_string = "time_up")]
    TimeUp,
    #[strum(to_string = "tab_switches")]
    TabSwitches,
}

impl SubmitTrigger {
    pub fn is_auto(self) -> bool {
        !matches!(self, SubmitTrigger::Manual)
    }
}

/// A submit the caller must send to the backend, reporting back through
/// [`TestSession::on_submit_finished`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub test_id: String,
    pub payload: SubmitPayload,
    pub trigger: SubmitTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub max_tab_switches: u32,
    pub violation_cooldown: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_tab_switches: DEFAULT_MAX_TAB_SWITCHES,
            violation_cooldown: DEFAULT_VIOLATION_COOLDOWN,
        }
    }
}

/// Mutable state of one attempt over a loaded test.
#[derive(Debug)]
struct Attempt {
    test: Test,
    tracker: StatusTracker,
    navigator: SectionNavigator,
    /// `None` for untimed sections.
    section_timer: Option<Countdown>,
    total_timer: Option<Countdown>,
    monitor: TabSwitchMonitor,
    elapsed: Duration,
    /// First automatic trigger; later submits of this attempt stay automatic.
    forced: Option<SubmitTrigger>,
}

fn countdown_for(duration_secs: u64) -> Option<Countdown> {
    (duration_secs > 0).then(|| Countdown::new(duration_secs))
}

impl Attempt {
    fn new(test: Test, settings: SessionSettings) -> Self {
        let navigator = SectionNavigator::new(test.section_lengths());
        let section_timer = test
            .section(0)
            .and_then(|section| countdown_for(section.duration_secs));
        let total_timer = countdown_for(test.total_duration_secs);

        Self {
            test,
            tracker: StatusTracker::new(),
            navigator,
            section_timer,
            total_timer,
            monitor: TabSwitchMonitor::new(settings.max_tab_switches, settings.violation_cooldown),
            elapsed: Duration::ZERO,
            forced: None,
        }
    }

    fn current_section(&self) -> Option<&Section> {
        self.test.section(self.navigator.section_index())
    }

    fn current_question(&self) -> Option<&Question> {
        self.current_section()?
            .questions
            .get(self.navigator.question_index())
    }

    fn visit_current(&mut self) {
        if let Some(id) = self.current_question().map(|q| q.id.clone()) {
            self.tracker.visit(&id);
        }
    }

    fn section_counts(&self, index: usize) -> StatusCounts {
        let ids = self
            .test
            .section(index)
            .into_iter()
            .flat_map(|s| s.questions.iter().map(|q| &q.id));
        self.tracker.counts(ids)
    }

    fn enter_current_section(&mut self) {
        let duration = self.current_section().map_or(0, |s| s.duration_secs);
        self.section_timer = countdown_for(duration).map(|mut timer| {
            timer.start();
            timer
        });
        self.visit_current();
    }

    fn timers_mut(&mut self) -> impl Iterator<Item = &mut Countdown> {
        self.section_timer
            .iter_mut()
            .chain(self.total_timer.iter_mut())
    }
}

/// Orchestrates one test attempt: loading, consent, answering, section
/// transitions, proctoring and submission.
///
/// All inputs arrive as discrete calls from a single event loop. Network work
/// is not performed here; a submit is handed out as a [`SubmitRequest`] after
/// the submission lock has been taken, and its outcome is fed back in.
#[derive(Debug)]
pub struct TestSession {
    test_id: String,
    phase: Phase,
    attempt: Option<Attempt>,
    dialog: Option<Dialog>,
    notice: Option<Notice>,
    submit_locked: bool,
    submitted_at: Option<DateTime<Local>>,
    settings: SessionSettings,
}

impl TestSession {
    pub fn new(test_id: impl Into<String>, settings: SessionSettings) -> Self {
        Self {
            test_id: test_id.into(),
            phase: Phase::Loading,
            attempt: None,
            dialog: None,
            notice: None,
            submit_locked: false,
            submitted_at: None,
            settings,
        }
    }

    pub fn on_loaded(&mut self, outcome: Result<Test, ApiError>) {
        if self.phase != Phase::Loading {
            tracing::debug!(test_id = %self.test_id, "late test load ignored");
            return;
        }

        match outcome {
            Ok(test) if test.sections.is_empty() => {
                tracing::error!(test_id = %self.test_id, "test has no sections");
                self.phase = Phase::LoadFailed("This test has no sections.".to_string());
            }
            Ok(test) => {
                tracing::info!(
                    test_id = %self.test_id,
                    sections = test.sections.len(),
                    questions = test.question_count(),
                    "test loaded"
                );
                self.attempt = Some(Attempt::new(test, self.settings));
                self.phase = Phase::Consent;
            }
            Err(err) => {
                tracing::error!(test_id = %self.test_id, error = %err, "failed to load test");
                self.phase = Phase::LoadFailed(err.user_message());
            }
        }
    }

    /// Leave the consent screen: visit the first question, start the clocks
    /// and arm the tab-switch monitor.
    pub fn start(&mut self) {
        if self.phase != Phase::Consent {
            return;
        }
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };

        attempt.visit_current();
        attempt.timers_mut().for_each(Countdown::start);
        if attempt.test.proctoring_enabled {
            attempt.monitor.start();
        }
        self.phase = Phase::Ready;
        tracing::info!(test_id = %self.test_id, "session started");
    }

    pub fn apply(&mut self, action: Action) -> Option<SubmitRequest> {
        self.notice = None;

        if self.dialog.is_some() {
            return match action {
                Action::Confirm => self.confirm_dialog(),
                Action::Dismiss => {
                    self.dialog = None;
                    None
                }
                _ => None,
            };
        }

        match self.phase {
            Phase::Consent => {
                if matches!(action, Action::Start | Action::Confirm) {
                    self.start();
                }
                return None;
            }
            Phase::Ready => {}
            _ => return None,
        }

        match action {
            Action::SelectOption(index) => self.select_option(index),
            Action::ToggleReview => self.toggle_review(),
            Action::NextQuestion => self.next_question(),
            Action::PreviousQuestion => {
                if let Some(attempt) = self.attempt.as_mut() {
                    if attempt.navigator.previous_question() {
                        attempt.visit_current();
                    }
                }
            }
            Action::SaveAndNext => self.save_and_next(),
            Action::JumpTo(index) => self.jump_to(index),
            Action::RequestNextSection => self.request_next_section(),
            Action::RequestSubmit => self.request_submit(),
            Action::Start | Action::Confirm | Action::Dismiss => {}
        }
        None
    }

    fn select_option(&mut self, index: usize) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        let Some(question) = attempt.current_question() else {
            return;
        };
        if index >= question.option_count() {
            self.notice = Some(Notice::warning(format!(
                "This question has {} options.",
                question.option_count()
            )));
            return;
        }
        let id = question.id.clone();
        attempt.tracker.select(&id, index);
    }

    fn toggle_review(&mut self) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if let Some(id) = attempt.current_question().map(|q| q.id.clone()) {
            attempt.tracker.toggle_review(&id);
        }
    }

    fn next_question(&mut self) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.navigator.next_question() {
            attempt.visit_current();
        } else if attempt.navigator.is_last_section() {
            self.notice = Some(Notice::info("Last question. Press s to submit."));
        } else {
            self.notice = Some(Notice::info(
                "Last question of this section. Press n to continue to the next section.",
            ));
        }
    }

    fn save_and_next(&mut self) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.navigator.next_question() {
            attempt.visit_current();
        } else if attempt.navigator.is_last_section() {
            self.request_submit();
        } else {
            self.request_next_section();
        }
    }

    fn jump_to(&mut self, index: usize) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        match attempt.navigator.jump_to(index) {
            Ok(()) => attempt.visit_current(),
            Err(err) => self.notice = Some(Notice::warning(err.to_string())),
        }
    }

    fn request_next_section(&mut self) {
        let Some(attempt) = self.attempt.as_ref() else {
            return;
        };
        if !attempt.navigator.can_advance_section() {
            let text = if attempt.navigator.is_last_section() {
                "This is the last section."
            } else {
                "Reach the last question of this section to move on."
            };
            self.notice = Some(Notice::info(text));
            return;
        }

        let from = attempt.navigator.section_index();
        let name = |i: usize| attempt.test.section(i).map(|s| s.name.clone()).unwrap_or_default();
        let unanswered = attempt.test.section(from).map_or(0, |s| {
            attempt.tracker.unanswered(s.questions.iter().map(|q| &q.id))
        });
        self.dialog = Some(Dialog::SectionAdvance {
            from: name(from),
            to: name(from + 1),
            unanswered,
        });
    }

    fn request_submit(&mut self) {
        let Some(attempt) = self.attempt.as_ref() else {
            return;
        };
        if !attempt.navigator.can_submit() && attempt.forced.is_none() {
            self.notice = Some(Notice::info(
                "Submit is available on the last question of the last section.",
            ));
            return;
        }

        let ids: Vec<_> = attempt.test.questions().map(|(_, q)| &q.id).collect();
        let unanswered = attempt.tracker.unanswered(ids.iter().copied());
        let marked = ids.iter().filter(|id| attempt.tracker.is_marked(id)).count();
        self.dialog = Some(Dialog::SubmitConfirm { unanswered, marked });
    }

    fn confirm_dialog(&mut self) -> Option<SubmitRequest> {
        let dialog = self.dialog.take()?;
        match dialog {
            Dialog::SectionAdvance { to, .. } => {
                if self.phase != Phase::Ready {
                    return None;
                }
                let attempt = self.attempt.as_mut()?;
                match attempt.navigator.advance_section() {
                    Ok(index) => {
                        attempt.enter_current_section();
                        tracing::info!(test_id = %self.test_id, section = index, "advanced to next section");
                        self.notice = Some(Notice::info(format!("Now in section: {to}")));
                    }
                    Err(err) => self.notice = Some(Notice::warning(err.to_string())),
                }
                None
            }
            Dialog::SubmitConfirm { .. } | Dialog::SubmitFailed { .. } => {
                self.begin_submit(SubmitTrigger::Manual)
            }
            Dialog::TabWarning { .. } => None,
        }
    }

    /// Advance the clocks by `elapsed` wall time. Only a live session counts.
    pub fn on_tick(&mut self, elapsed: Duration) -> Option<SubmitRequest> {
        if self.phase != Phase::Ready {
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        attempt.elapsed += elapsed;

        let section_expired = attempt
            .section_timer
            .as_mut()
            .is_some_and(|timer| timer.advance(elapsed).contains(&TimerEvent::Expired));

        if section_expired {
            let departed = attempt.current_section().map(|s| s.name.clone()).unwrap_or_default();
            match attempt.navigator.force_advance_section() {
                Some(index) => {
                    attempt.enter_current_section();
                    let arrived = attempt.current_section().map(|s| s.name.clone()).unwrap_or_default();
                    tracing::info!(test_id = %self.test_id, section = index, "section time expired, advanced");
                    if matches!(self.dialog, Some(Dialog::SectionAdvance { .. } | Dialog::SubmitConfirm { .. })) {
                        self.dialog = None;
                    }
                    self.notice = Some(Notice::warning(format!(
                        "Time is up for {departed}. Moved to {arrived}."
                    )));
                }
                None => {
                    tracing::info!(test_id = %self.test_id, "final section time expired");
                    return self.begin_submit(SubmitTrigger::TimeUp);
                }
            }
        }

        let attempt = self.attempt.as_mut()?;
        let total_expired = attempt
            .total_timer
            .as_mut()
            .is_some_and(|timer| timer.advance(elapsed).contains(&TimerEvent::Expired));
        if total_expired {
            tracing::info!(test_id = %self.test_id, "test time expired");
            return self.begin_submit(SubmitTrigger::TimeUp);
        }
        None
    }

    /// Count a tab switch. Only a live session counts: the monitor is paused
    /// while a submission is in flight, since its payload is already built.
    pub fn on_focus_lost(&mut self, at: Instant) -> Option<SubmitRequest> {
        if self.phase != Phase::Ready {
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        if !attempt.test.proctoring_enabled {
            return None;
        }

        match attempt.monitor.record_focus_lost(at) {
            ViolationOutcome::Ignored => None,
            ViolationOutcome::Warning { count, max, is_final } => {
                self.dialog = Some(Dialog::TabWarning { count, max, is_final });
                None
            }
            ViolationOutcome::AutoSubmit { count } => {
                attempt.forced.get_or_insert(SubmitTrigger::TabSwitches);
                tracing::warn!(test_id = %self.test_id, count, "forcing submission after tab switches");
                self.begin_submit(SubmitTrigger::TabSwitches)
            }
        }
    }

    /// Take the submission lock and hand out the payload. Returns `None` when
    /// a submit is already in flight or the session is not live.
    fn begin_submit(&mut self, trigger: SubmitTrigger) -> Option<SubmitRequest> {
        if self.submit_locked {
            tracing::debug!(test_id = %self.test_id, %trigger, "submit already in flight");
            return None;
        }
        if self.phase != Phase::Ready {
            return None;
        }
        let attempt = self.attempt.as_mut()?;

        if trigger.is_auto() {
            attempt.forced.get_or_insert(trigger);
        }
        self.submit_locked = true;
        self.phase = Phase::Submitting;
        self.dialog = None;
        attempt.timers_mut().for_each(Countdown::pause);
        attempt.monitor.stop();

        let auto_submission = AutoSubmission {
            is_auto_submitted: trigger.is_auto() || attempt.forced.is_some(),
            tab_switches: attempt.monitor.count(),
        };
        let payload = assemble(&attempt.test, &attempt.tracker, attempt.elapsed, auto_submission);
        tracing::info!(
            test_id = %self.test_id,
            %trigger,
            answered = payload.answered_count(),
            time_taken = payload.time_taken,
            "submitting"
        );

        Some(SubmitRequest {
            test_id: self.test_id.clone(),
            payload,
            trigger,
        })
    }

    pub fn on_submit_finished(&mut self, outcome: Result<Option<String>, ApiError>) {
        if self.phase != Phase::Submitting {
            tracing::debug!(test_id = %self.test_id, "stale submit result ignored");
            return;
        }
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };

        match outcome {
            Ok(result_id) => {
                attempt.monitor.stop();
                attempt.timers_mut().for_each(Countdown::cancel);
                tracing::info!(test_id = %self.test_id, result_id = ?result_id, "submitted");
                self.submitted_at = Some(Local::now());
                self.phase = Phase::Submitted { result_id };
            }
            Err(err) => {
                tracing::warn!(test_id = %self.test_id, error = %err, "submit failed");
                attempt.timers_mut().for_each(Countdown::start);
                if attempt.test.proctoring_enabled {
                    attempt.monitor.start();
                }
                self.submit_locked = false;
                self.phase = Phase::Ready;
                self.dialog = Some(Dialog::SubmitFailed {
                    message: err.user_message(),
                });
            }
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Local>> {
        self.submitted_at
    }

    pub fn is_submit_locked(&self) -> bool {
        self.submit_locked
    }

    pub fn test(&self) -> Option<&Test> {
        self.attempt.as_ref().map(|a| &a.test)
    }

    pub fn navigator(&self) -> Option<&SectionNavigator> {
        self.attempt.as_ref().map(|a| &a.navigator)
    }

    pub fn tracker(&self) -> Option<&StatusTracker> {
        self.attempt.as_ref().map(|a| &a.tracker)
    }

    pub fn current_section(&self) -> Option<&Section> {
        self.attempt.as_ref()?.current_section()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.attempt.as_ref()?.current_question()
    }

    pub fn selected_option(&self) -> Option<usize> {
        let attempt = self.attempt.as_ref()?;
        attempt.tracker.answer(&attempt.current_question()?.id)
    }

    pub fn section_remaining(&self) -> Option<u64> {
        self.attempt
            .as_ref()?
            .section_timer
            .as_ref()
            .map(Countdown::remaining_secs)
    }

    pub fn total_remaining(&self) -> Option<u64> {
        self.attempt
            .as_ref()?
            .total_timer
            .as_ref()
            .map(Countdown::remaining_secs)
    }

    pub fn elapsed(&self) -> Duration {
        self.attempt.as_ref().map_or(Duration::ZERO, |a| a.elapsed)
    }

    pub fn tab_switches(&self) -> u32 {
        self.attempt.as_ref().map_or(0, |a| a.monitor.count())
    }

    pub fn max_tab_switches(&self) -> u32 {
        self.attempt
            .as_ref()
            .map_or(self.settings.max_tab_switches, |a| a.monitor.max_switches())
    }

    /// Palette states of one section, in question order.
    pub fn section_statuses(&self, index: usize) -> Vec<QuestionStatus> {
        let Some(attempt) = self.attempt.as_ref() else {
            return Vec::new();
        };
        attempt
            .test
            .section(index)
            .map(|s| s.questions.iter().map(|q| attempt.tracker.status(&q.id)).collect())
            .unwrap_or_default()
    }

    pub fn section_counts(&self, index: usize) -> StatusCounts {
        self.attempt
            .as_ref()
            .map(|a| a.section_counts(index))
            .unwrap_or_default()
    }
}
