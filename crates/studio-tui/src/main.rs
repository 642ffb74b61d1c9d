mod app;
mod handler;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use studio_core::{Config, Locale, SessionStore, SqliteSessionStore};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppOptions};
use tui::{EventHandler, TICK_RATE};

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Turn a project description into a proposal and an interactive flow canvas")]
#[command(version)]
struct Cli {
    /// Project description to start with
    #[arg(short, long)]
    desc: Option<String>,

    /// Interface and proposal language (en, pt)
    #[arg(short, long)]
    locale: Option<String>,

    /// Resume a saved session by id
    #[arg(short, long)]
    session: Option<String>,

    /// Always use the single-column canvas layout
    #[arg(long)]
    compact: bool,

    /// Directory for exported SVG and Markdown files
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

/// File logging only; the terminal belongs to the UI.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = std::env::var_os("STUDIO_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "studio.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("STUDIO_LOG")
        .unwrap_or_else(|_| EnvFilter::new("studio_core=info,studio=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// Persist the locale to the config file. Only the file's own contents are
/// written back, never values that came from the environment.
fn remember_locale(locale: Locale) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut stored = Config::load_from(&path)?;
    stored.locale = Some(locale.as_str().to_string());
    stored.save_to(&path)
}

fn open_store(config: &Config) -> Option<Arc<dyn SessionStore>> {
    let path = match config.database_path() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "no session database path, sessions will not be saved");
            return None;
        }
    };
    match SqliteSessionStore::open(&path) {
        Ok(store) => {
            info!(path = %path.display(), "session store opened");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session store unavailable, sessions will not be saved");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging()?;

    let mut config = Config::load()?;
    if let Some(locale) = cli.locale.as_deref() {
        match Locale::from_str(locale) {
            Some(l) => {
                config.locale = Some(l.as_str().to_string());
                if let Err(e) = remember_locale(l) {
                    warn!(error = %e, "could not save locale");
                }
            }
            None => warn!(locale, "unknown locale, keeping configured one"),
        }
    }

    let store = open_store(&config);
    let resumed = match (&store, cli.session.as_deref()) {
        (Some(store), Some(id)) => match store.fetch(id) {
            Ok(state) => state,
            Err(e) => {
                warn!(session_id = id, error = %e, "could not load session");
                None
            }
        },
        _ => None,
    };

    let export_dir = cli
        .export_dir
        .or_else(dirs::download_dir)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(std::env::temp_dir);

    let mut events = EventHandler::new(TICK_RATE);
    let options = AppOptions {
        force_compact: cli.compact,
        session_id: cli.session.clone(),
        export_dir,
    };
    let mut app = App::new(&config, options, events.stream_sender(), store);
    info!(session_id = %app.session_id, provider = app.generator.effective_provider().as_str(), "studio started");

    if let Some(state) = resumed {
        app.restore(state);
    } else if let Some(desc) = cli.desc {
        app.start_with_description(desc);
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;

    app.teardown();
    tui::restore()?;

    info!(session_id = %app.session_id, "studio closed");
    eprintln!("Session: {}", app.session_id);
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }
        app.poll_generation().await;
    }
    Ok(())
}
