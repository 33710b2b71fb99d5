mod app;
mod components;
mod config;
mod editor;
mod error;
mod event;
mod fs;
mod handler;
mod jobs;
mod logging;
mod session;
mod state;
mod syntax;
mod tags;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig};
use crate::event::{Event, EventHandler};
use crate::fs::backend::{Backend, LocalBackend};
use crate::jobs::JobRunner;
use crate::state::{AppState, StateFile};
use crate::tui::{install_panic_hook, Tui};

/// A terminal manager for the config files scattered across your machine.
#[derive(Parser, Debug)]
#[command(name = "cfm", version, about)]
struct Cli {
    /// Files or folders to add to the managed set on startup
    paths: Vec<String>,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where managed items, tags and preferences are stored
    #[arg(long, value_name = "FILE")]
    state_file: Option<String>,

    /// Color scheme to start with (dark or light)
    #[arg(long)]
    theme: Option<String>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Do not show the first-run file picker
    #[arg(long)]
    skip_onboarding: bool,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                onboarding: self.skip_onboarding.then_some(false),
                state_file: self.state_file.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let state_file = StateFile::new(config.state_file());
    let mut state = state_file.load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %state_file.path().display(), "unreadable state, starting fresh");
        AppState::default()
    });
    if let Some(theme) = &cli.theme {
        state.theme = Some(theme.clone());
    }

    let backend: Arc<dyn Backend> = Arc::new(LocalBackend::new(fs::paths::home_dir()));
    let runner = JobRunner::new(
        Arc::clone(&backend),
        Duration::from_millis(config.scan_timeout_ms()),
        config.dirs_first(),
        config.scan_max_depth(),
        config.scan_mode(),
    );
    let mouse = config.mouse_enabled();
    tracing::info!(
        platform = ?backend.platform_id(),
        state = %state_file.path().display(),
        "starting cfm"
    );

    let mut app = App::new(config, backend, state, Some(state_file));
    if !cli.paths.is_empty() {
        for raw in &cli.paths {
            if let Err(e) = app.add_path(raw) {
                tracing::info!(path = %raw, error = %e, "skipped startup path");
            }
        }
        app.refresh_view();
        app.persist();
    }

    install_panic_hook();

    let mut tui = Tui::new(mouse)?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let event_tx = events.sender();

    loop {
        for job in app.take_jobs() {
            runner.spawn(job, event_tx.clone());
        }

        tui.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Paste(text) => handler::handle_paste(&mut app, &text),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::ChildrenLoaded { path, result } => app.handle_children_loaded(path, result),
            Event::ScanFinished { root, result } => app.handle_scan_finished(root, result),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
