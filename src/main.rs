mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod logging;
mod theme;
mod tui;
mod ui;
mod vcs;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::app::{App, Target};
use crate::config::{AppConfig, GeneralConfig, ThemeConfig, WatcherConfig};
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};
use crate::vcs::watcher::WorkingCopyWatcher;

/// A terminal front-end for Subversion working copies and repositories.
#[derive(Parser, Debug)]
#[command(name = "svnview", version, about)]
struct Cli {
    /// Working copy directory or repository URL (defaults to current directory)
    #[arg(default_value = ".")]
    target: String,

    /// Repository path or URL shown in the repository tree
    #[arg(long)]
    repo: Option<String>,

    /// Show the repository tree at this revision
    #[arg(short, long)]
    revision: Option<String>,

    /// Repository path to open in the tree on startup
    #[arg(long)]
    open: Option<String>,

    /// Config file to read before the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the log here instead of the data directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log debug records
    #[arg(short, long)]
    verbose: bool,

    /// Disable the working copy watcher (auto-refresh of the status view)
    #[arg(long)]
    no_watcher: bool,

    /// Enable mouse scrolling
    #[arg(long)]
    mouse: bool,

    /// Color scheme: dark, light or custom
    #[arg(long)]
    theme: Option<String>,
}

impl Cli {
    /// Settings given on the command line, layered over the config files.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.mouse.then_some(true),
                log_file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                ..Default::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..Default::default()
        }
    }

    fn resolve_target(&self) -> error::Result<Target> {
        let (working_copy, default_root) = if self.target.contains("://") {
            (None, self.target.clone())
        } else {
            let path = PathBuf::from(&self.target).canonicalize().map_err(|_| {
                error::AppError::InvalidPath(format!("{} does not exist", self.target))
            })?;
            let root = path.to_string_lossy().into_owned();
            (Some(path), root)
        };
        Ok(Target {
            working_copy,
            repo_root: self.repo.clone().unwrap_or(default_root),
            revision: self.revision.clone(),
            open_path: self.open.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Some(log_file) = config.log_file() {
        if !logging::init(&log_file, cli.verbose) {
            eprintln!("Warning: cannot write log file {}", log_file.display());
        }
    }

    let target = cli.resolve_target()?;
    info!(
        working_copy = ?target.working_copy,
        repo = %target.repo_root,
        revision = ?target.revision,
        theme = config.theme_scheme(),
        "starting"
    );

    install_panic_hook();

    let mut events = EventHandler::new(Duration::from_millis(100));
    let event_tx = events.sender();

    let watch_root = target
        .working_copy
        .clone()
        .filter(|_| config.watcher_enabled());
    let debounce = Duration::from_millis(config.debounce_ms());
    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut app = App::new(config, target, event_tx.clone());

    let watcher = match watch_root {
        Some(root) => match WorkingCopyWatcher::new(&root, debounce, event_tx.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "watcher unavailable");
                app.watcher_active = false;
                app.set_error_message(format!("Watcher unavailable: {e}"));
                None
            }
        },
        None => None,
    };

    app.start();

    loop {
        if app.take_redraw() {
            tui.draw(&mut app)?;
        }

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.tick(),
            Event::Resize(_, _) => app.mark_dirty(),
            Event::Link(id) => app.handle_link(id),
            Event::FsChange(paths) => app.handle_fs_change(paths),
        }

        // Sync watcher pause/resume state
        if let Some(ref watcher) = watcher {
            if app.watcher_active && !watcher.is_active() {
                watcher.resume();
            } else if !app.watcher_active && watcher.is_active() {
                watcher.pause();
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    if let Err(e) = app.save_state() {
        warn!(error = %e, "could not save expansion state");
    }
    tui.restore()?;
    info!("exiting");
    Ok(())
}
