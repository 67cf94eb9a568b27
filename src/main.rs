use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use typeclock::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, StoreBackend},
    leaderboard::Leaderboard,
    runtime::{CrosstermEventSource, Runner},
    sentences::RandomSentences,
    session::Session,
    store::{KeyValueStore, MemoryStore, SqliteStore},
    timer::ThreadTimer,
    ui::relative_time,
};

const REDRAW_INTERVAL_MS: u64 = 100;

/// timed typing test with live wpm, accuracy, and a persistent leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// number of seconds to run the test
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// where to keep scores
    #[clap(long, value_enum)]
    backend: Option<StoreBackend>,

    /// path to the score database
    #[clap(long)]
    db: Option<PathBuf>,

    /// print the leaderboard and exit
    #[clap(long)]
    scores: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line overrides on top of the saved config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.secs {
            cfg.duration_secs = secs;
        }
        if let Some(backend) = self.backend {
            cfg.backend = backend;
        }
        if let Some(db) = &self.db {
            cfg.db_path = Some(db.clone());
        }
        cfg.duration_secs = cfg.duration_secs.max(1);
        cfg
    }
}

/// Log to a file under the state directory; the terminal belongs to the UI.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("TYPECLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

fn open_store(cfg: &Config) -> Box<dyn KeyValueStore> {
    match cfg.backend {
        StoreBackend::Memory => Box::new(MemoryStore::new()),
        StoreBackend::Sqlite => {
            let path = cfg.resolved_db_path();
            match SqliteStore::open(&path) {
                Ok(store) => Box::new(store),
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "falling back to in-memory scores");
                    Box::new(MemoryStore::new())
                }
            }
        }
    }
}

fn print_scores(store: Box<dyn KeyValueStore>) {
    let mut board = Leaderboard::new(store);
    board.load();

    if board.entries().is_empty() {
        println!("no scores yet");
        return;
    }
    let now_ms = chrono::Utc::now().timestamp_millis();
    for (idx, entry) in board.entries().iter().enumerate() {
        println!(
            "{}. {:>4.0} wpm  {:>5.1}% acc  {}",
            idx + 1,
            entry.wpm,
            entry.accuracy,
            relative_time(entry.timestamp, now_ms)
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let cfg = cli.apply(config_store.load());
    tracing::info!(?cfg, "starting typeclock");

    if cli.save_config {
        config_store.save(&cfg)?;
    }

    let store = open_store(&cfg);

    if cli.scores {
        print_scores(store);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &cfg, store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    cfg: &Config,
    store: Box<dyn KeyValueStore>,
) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let timer = ThreadTimer::new(events.sender());
    let session = Session::with_duration(RandomSentences::new(), timer, cfg.duration_secs);
    let mut app = App::new(session, Leaderboard::new(store));
    let runner = Runner::new(events, Duration::from_millis(REDRAW_INTERVAL_MS));

    loop {
        terminal.draw(|f| f.render_widget(&app, f.area()))?;
        if app.handle(runner.step()) == Flow::Quit {
            break;
        }
    }

    Ok(())
}
