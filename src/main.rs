//! newswatch: a terminal dashboard for a news and social media monitor.
//!
//! ## Architecture overview
//!
//! ```text
//!   REST / Socket.IO
//!         ▲
//! ┌───────┴──────┐ WorkerMsg ┌──────────┐  draw()  ┌──────────┐
//! │  worker.rs   │ ────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ realtime.rs  │ (channel) │ (state)  │          │ (render) │
//! │   (tokio)    │ ◄──────── │          │          │          │
//! └──────────────┘  Command  └──────────┘          └──────────┘
//!                                 ▲
//!                                 │ handle_key_event()
//!                            ┌──────────┐
//!                            │ input.rs │
//!                            └──────────┘
//! ```
//!
//! * **`api/`**: HTTP client and the backend's response envelopes.
//! * **`query`**, **`fetch`**, **`pagination`**, **`filter`**, **`debounce`**:
//!   what to ask for, and which answer to show.
//! * **`catalog`**, **`schema`**, **`render`**, **`highlight`**: which sources
//!   exist and how their records become table cells.
//! * **`parser`**, **`log_panel`**, **`realtime`**: parser run/stop control
//!   and the live log.
//! * **`worker`**: runs [`worker::Command`]s on the tokio runtime.
//! * **`app`**: owns all application state.
//! * **`ui`** / **`input`**: rendering and key bindings.
//! * **`config`** / **`session`**: command line, environment and the UI state
//!   kept between runs.

mod api;
mod app;
mod catalog;
mod config;
mod debounce;
mod error;
mod fetch;
mod filter;
mod highlight;
mod input;
mod log_panel;
mod pagination;
mod parser;
mod query;
mod realtime;
mod render;
mod schema;
mod session;
mod ui;
mod worker;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use app::{App, Settings};
use config::Config;
use session::UiSessionState;
use worker::Worker;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Log to a file; the terminal belongs to the UI.  `RUST_LOG` overrides the
/// default `info` level.
fn init_tracing(config: &Config) -> Result<()> {
    let path = config.log_path();
    let file = File::create(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config)?;
    install_panic_hook();
    info!(api = %config.api_url, source = %config.source, "starting");

    // -- background runtime ----------------------------------------------------
    let runtime = tokio::runtime::Runtime::new().context("cannot start tokio runtime")?;
    let client = ApiClient::new(config.api_url.clone())?;
    let (worker, rx) = Worker::new(runtime.handle().clone(), client);
    worker.spawn_realtime(config.realtime_url());

    // -- application state -----------------------------------------------------
    let session_path = config.session_path();
    let mut app = App::new(Settings {
        source: config.source.clone(),
        days: config.days,
        list: config.list_config(),
        ordering: config.ordering,
        debounce: config.debounce(),
    });
    app.restore_session(&UiSessionState::load(&session_path));
    app.start();

    // -- terminal setup (RAII: Drop restores on exit or panic) -----------------
    let mut guard = TerminalGuard::new()?;

    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply worker results and fire due debounced work.
    //   2. Hand queued commands to the worker.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.handle_worker_msg(msg);
        }
        app.tick(Instant::now());

        for command in app.take_commands() {
            worker.dispatch(command);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key, Instant::now());
            }
        }

        if app.quit {
            break;
        }
    }

    drop(guard);
    if let Err(err) = app.session_state().save(&session_path) {
        warn!(error = %err, "saving session failed");
    }
    info!("exiting");
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
