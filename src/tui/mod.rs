//! Terminal panel for ClickCmds
//!
//! Lists the effective commands from `.cmmds` and lets the user run them,
//! set temporary overrides, toggle the run mode and open the file.
//! The list reloads whenever the file changes on disk.

pub mod app;
pub mod events;
pub mod msg; // TEA message types (what happened)
pub mod state; // Pure state transformations (functional core)
pub mod ui;
pub mod update; // TEA update function (state transitions)

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::prelude::*;

use crate::panel::{Notice, Panel};
use crate::terminal::ShellTerminals;
use app::App;
use events::{handle_event, handle_mouse, handle_resize};
use msg::Msg;

/// Run the panel until the user quits
pub fn run(panel: Panel<ShellTerminals>) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app, ensuring cleanup happens even on error
    let result = run_app_inner(&mut terminal, panel);

    // Restore terminal - this MUST run even if app fails
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    );
    let _ = terminal.show_cursor();

    result
}

fn run_app_inner<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    panel: Panel<ShellTerminals>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(panel);
    let size = terminal.size()?;
    app.dispatch(Msg::Resize(size.width, size.height));

    // Watch the workspace folder rather than the file so that creating or
    // deleting .cmmds is noticed too
    let (tx, rx) = mpsc::channel();
    let _watcher = match app.config_path() {
        Some(path) => match watch_config(&path, tx) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("File watching disabled: {}", e);
                app.set_notice(Notice::Warning(format!("File watching disabled: {}", e)));
                None
            }
        },
        None => None,
    };

    let result = run_event_loop(terminal, &mut app, rx);
    app.shutdown();
    result
}

fn watch_config(
    path: &Path,
    tx: mpsc::Sender<()>,
) -> Result<RecommendedWatcher, Box<dyn std::error::Error>> {
    let dir = path.parent().ok_or("config file has no parent folder")?.to_path_buf();
    let file_name: OsString = path.file_name().ok_or("config file has no name")?.to_os_string();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) if is_config_event(&event, &file_name) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => log::warn!("Watch error: {}", e),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    log::debug!("Watching {} for changes to {:?}", dir.display(), path.file_name());
    Ok(watcher)
}

/// A create, modify or remove event that touches the config file
fn is_config_event(event: &notify::Event, file_name: &OsStr) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

fn run_event_loop<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    file_change_rx: mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(path) = app.take_pending_editor() {
            match open_in_editor(terminal, &path) {
                Ok(()) => app.set_notice(Notice::Info(format!("Edited {}", path.display()))),
                Err(e) => app.set_notice(Notice::Error(e.to_string())),
            }
            app.dispatch(Msg::Refresh);
        }

        // Handle input with timeout
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if poll(timeout)? {
            match read()? {
                Event::Key(key) => {
                    if handle_event(app, key) {
                        return Ok(()); // Quit signal
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => handle_resize(app, width, height),
                _ => {}
            }
        }

        // Editors often write several events per save; one reload covers them
        if file_change_rx.try_recv().is_ok() {
            while file_change_rx.try_recv().is_ok() {}
            app.dispatch(Msg::ConfigChanged);
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}

/// Suspend the TUI, open the file in the editor, then resume
fn open_in_editor<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    disable_raw_mode()?;

    let result = crate::editor::open_in_editor(path);

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)?;
    terminal.clear()?;

    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_config_event() {
        let name = OsStr::new(".cmmds");
        assert!(is_config_event(
            &event(EventKind::Modify(ModifyKind::Any), "/w/.cmmds"),
            name
        ));
        assert!(is_config_event(
            &event(EventKind::Create(CreateKind::File), "/w/.cmmds"),
            name
        ));
        assert!(is_config_event(
            &event(EventKind::Remove(RemoveKind::File), "/w/.cmmds"),
            name
        ));
        assert!(!is_config_event(
            &event(EventKind::Modify(ModifyKind::Any), "/w/Cargo.toml"),
            name
        ));
        assert!(!is_config_event(&event(EventKind::Any, "/w/.cmmds"), name));
    }
}
