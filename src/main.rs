use std::fs::File;
use std::io::{self, stdin};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use mocktest::{
    api::{CreateTestRequest, EducationLevel, HttpBackend, TestBackend},
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    result::write_analysis_csv,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    telemetry,
};

const TICK_RATE_MS: u64 = 100;

/// proctored mock tests in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take timed, sectioned multiple-choice tests in the terminal. Sections are one-way, leaving the window counts as a tab switch, and results are scored by the test backend."
)]
pub struct Cli {
    /// backend base url, overrides config and MOCKTEST_BACKEND_URL
    #[clap(long, global = true)]
    backend_url: Option<String>,

    /// write the log file as JSON lines
    #[clap(long, global = true)]
    log_json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// take an existing test by id
    Take { test_id: String },
    /// generate a new test and start it right away
    Create {
        #[clap(subcommand)]
        kind: CreateKind,
    },
    /// show the scored result of a submitted attempt
    Result {
        result_id: String,
        /// export the question analysis as CSV instead of opening the viewer
        #[clap(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum CreateKind {
    /// GATE pattern test
    Gate,
    /// company specific placement test
    Company { name: String },
    /// CET pattern test
    Cet,
    /// custom test from a topic list
    Custom {
        #[clap(long, value_enum)]
        level: Level,
        /// duration in minutes
        #[clap(long)]
        minutes: u32,
        #[clap(long)]
        questions: u32,
        /// topic to include, repeatable
        #[clap(long = "topic", required = true)]
        topics: Vec<String>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Level {
    Undergraduate,
    #[value(name = "juniorcollege")]
    JuniorCollege,
}

impl From<CreateKind> for CreateTestRequest {
    fn from(kind: CreateKind) -> Self {
        match kind {
            CreateKind::Gate => CreateTestRequest::Gate,
            CreateKind::Company { name } => CreateTestRequest::Company { name },
            CreateKind::Cet => CreateTestRequest::Cet,
            CreateKind::Custom {
                level,
                minutes,
                questions,
                topics,
            } => CreateTestRequest::Custom {
                level: match level {
                    Level::Undergraduate => EducationLevel::Undergraduate,
                    Level::JuniorCollege => EducationLevel::JuniorCollege,
                },
                minutes,
                questions,
                topics,
            },
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let store = FileConfigStore::new();
    let mut config = store
        .load()
        .with_context(|| format!("failed to read config {}", store.path().display()))?
        .apply_env()
        .context("invalid environment override")?;
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("mocktest.log"));
    telemetry::init_tracing(&log_path, &config.log_level, cli.log_json)?;

    let backend: Arc<dyn TestBackend> =
        Arc::new(HttpBackend::from_config(&config).context("failed to build http client")?);
    let settings = config.session_settings();

    match cli.command {
        Commands::Take { test_id } => {
            run_tui(|tx| App::for_test(test_id, settings, backend.clone(), tx))
        }
        Commands::Create { kind } => {
            let request = CreateTestRequest::from(kind);
            let test_id = backend
                .create_test(&request)
                .with_context(|| format!("failed to create test via {}", request.path()))?;
            tracing::info!(%test_id, "created test");
            println!("created test {test_id}");
            run_tui(|tx| App::for_test(test_id, settings, backend.clone(), tx))
        }
        Commands::Result {
            result_id,
            csv: Some(path),
        } => {
            let result = backend
                .fetch_result(&result_id)
                .with_context(|| format!("failed to fetch result {result_id}"))?;
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_analysis_csv(&result, file).context("failed to write csv")?;
            println!("wrote {} questions to {}", result.questions.len(), path.display());
            Ok(())
        }
        Commands::Result {
            result_id,
            csv: None,
        } => run_tui(|tx| App::for_result(result_id, backend.clone(), tx)),
    }
}

fn run_tui(make_app: impl FnOnce(Sender<AppEvent>) -> App) -> anyhow::Result<()> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = make_app(runner.sender());
    let outcome = event_loop(&mut terminal, &runner, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    outcome
}

fn event_loop<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    runner: &Runner<E, T>,
    app: &mut App,
) -> anyhow::Result<()> {
    let interval = Duration::from_millis(TICK_RATE_MS);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let is_tick = matches!(event, AppEvent::Tick);
        if app.handle(event) == Flow::Quit {
            return Ok(());
        }

        // Keep the clocks moving under a steady stream of input.
        if is_tick {
            last_tick = Instant::now();
        } else if last_tick.elapsed() >= interval {
            last_tick = Instant::now();
            app.handle(AppEvent::Tick);
        }
    }
}
