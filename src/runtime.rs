use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::api::TestBackend;
use crate::error::ApiError;
use crate::model::Test;
use crate::result::TestResult;
use crate::session::SubmitRequest;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    FocusLost(Instant),
    FocusGained,
    Resize,
    Tick,
    TestLoaded(Result<Test, ApiError>),
    SubmitFinished(Result<Option<String>, ApiError>),
    ResultLoaded(Result<TestResult, ApiError>),
}

/// Source of app events (terminal input and background job results)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Handle for background jobs to post their outcome.
    fn sender(&self) -> Sender<AppEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input = tx.clone();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => AppEvent::Key(key),
                Ok(CtEvent::FocusLost) => AppEvent::FocusLost(Instant::now()),
                Ok(CtEvent::FocusGained) => AppEvent::FocusGained,
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!(error = %err, "terminal input closed");
                    break;
                }
            };
            if input.send(evt).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for headless tests
pub struct TestEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.event_source.sender()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

// Background jobs. A closed channel means the session is gone; the outcome is dropped.

pub fn spawn_fetch_test(backend: Arc<dyn TestBackend>, test_id: String, tx: Sender<AppEvent>) {
    std::thread::spawn(move || {
        let _ = tx.send(AppEvent::TestLoaded(backend.fetch_test(&test_id)));
    });
}

pub fn spawn_submit(backend: Arc<dyn TestBackend>, request: SubmitRequest, tx: Sender<AppEvent>) {
    std::thread::spawn(move || {
        let outcome = backend.submit_test(&request.test_id, &request.payload);
        let _ = tx.send(AppEvent::SubmitFinished(outcome));
    });
}

pub fn spawn_fetch_result(backend: Arc<dyn TestBackend>, result_id: String, tx: Sender<AppEvent>) {
    std::thread::spawn(move || {
        let _ = tx.send(AppEvent::ResultLoaded(backend.fetch_result(&result_id)));
    });
}
