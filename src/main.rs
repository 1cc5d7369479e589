//! usrdir-console binary entry point.
//!
//! Resolves settings, sets up logging and the tokio runtime, initializes the
//! terminal in raw mode, runs the TUI event loop, and restores the terminal
//! state on exit.
//!
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use usrdir_console::api::HttpDirectory;
use usrdir_console::app::{self, AppState, intents::Dispatcher, keymap::Keymap};
use usrdir_console::config::{Cli, Settings};
use usrdir_console::store::Store;

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Route tracing to the log file; without one, logs are discarded so the TUI stays clean.
fn init_logging(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
    match &settings.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("load settings")?;
    if cli.print_config {
        print!("{}", settings.render());
        return Ok(());
    }
    init_logging(&settings)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("start async runtime")?;
    let directory = HttpDirectory::new(settings.directory_options()).context("build HTTP client")?;
    tracing::info!(base_url = directory.base_url(), "starting");
    let (dispatcher, mut completions) = Dispatcher::new(Arc::new(directory), runtime.handle().clone());

    let keymap = Keymap::load_or_init(&settings.keybinds);
    let mut state = AppState::new(Store::new(), keymap, &settings);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state, &dispatcher, &mut completions);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err:#}");
    }
    Ok(())
}
