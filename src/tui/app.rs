//! Application state for the TUI (imperative shell)
//!
//! Owns the panel controller and runs the [`Cmd`]s that the pure update
//! function asks for.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::msg::Msg;
use super::state;
use super::update::{update, Cmd, Model};
use crate::panel::{Notice, Panel, Reaction};
use crate::terminal::{ShellTerminals, TerminalProvider};

/// How long the "[Updated]" marker stays in the header
const REFRESH_INDICATOR: Duration = Duration::from_secs(2);

/// How long a status message stays in the footer
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Only this much of the end of a session log is read for the output pane
const TAIL_BYTES: u64 = 8 * 1024;

/// Main application state
pub struct App {
    panel: Panel<ShellTerminals>,
    pub model: Model,

    // Refresh indicator
    pub show_refresh_indicator: bool,
    refresh_shown_at: Option<Instant>,

    // Footer status
    pub notice: Option<Notice>,
    notice_shown_at: Option<Instant>,

    // Tail of the most recent session's output
    pub output_title: Option<String>,
    pub output: Vec<String>,

    pending_editor: Option<PathBuf>,
}

impl App {
    pub fn new(panel: Panel<ShellTerminals>) -> Self {
        let view = panel.render();
        Self {
            panel,
            model: Model::with_view(view),
            show_refresh_indicator: false,
            refresh_shown_at: None,
            notice: None,
            notice_shown_at: None,
            output_title: None,
            output: Vec::new(),
            pending_editor: None,
        }
    }

    /// Path of the config file, if there is a workspace
    pub fn config_path(&self) -> Option<PathBuf> {
        self.panel.store().config_path()
    }

    /// Feed one message through update and run the resulting command.
    /// Returns true when the app should quit.
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        let (model, cmd) = update(msg, std::mem::take(&mut self.model));
        self.model = model;
        self.execute(cmd)
    }

    fn execute(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::None => false,
            Cmd::Quit => true,
            Cmd::Batch(cmds) => {
                let mut quit = false;
                for cmd in cmds {
                    quit |= self.execute(cmd);
                }
                quit
            }
            Cmd::Panel(message) => {
                let reaction = self.panel.handle(message);
                self.react(reaction)
            }
            Cmd::ShowRefreshIndicator => {
                self.show_refresh_indicator = true;
                self.refresh_shown_at = Some(Instant::now());
                false
            }
            Cmd::SetStatus(text) => {
                self.set_notice(Notice::Info(text));
                false
            }
        }
    }

    fn react(&mut self, reaction: Reaction) -> bool {
        match reaction {
            Reaction::Render(view, notice) => {
                if let Some(notice) = notice {
                    self.set_notice(notice);
                }
                self.dispatch(Msg::Rendered(view))
            }
            Reaction::Notify(notice) => {
                self.set_notice(notice);
                self.refresh_output();
                false
            }
            Reaction::OpenEditor(path) => {
                self.pending_editor = Some(path);
                false
            }
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        match &notice {
            Notice::Info(text) => log::info!("{}", text),
            Notice::Warning(text) => log::warn!("{}", text),
            Notice::Error(text) => log::error!("{}", text),
        }
        self.notice = Some(notice);
        self.notice_shown_at = Some(Instant::now());
    }

    /// Take the path waiting to be opened in the editor, if any
    pub fn take_pending_editor(&mut self) -> Option<PathBuf> {
        self.pending_editor.take()
    }

    /// Expire indicators and pick up new session output
    pub fn tick(&mut self) {
        if self
            .refresh_shown_at
            .is_some_and(|at| at.elapsed() >= REFRESH_INDICATOR)
        {
            self.show_refresh_indicator = false;
            self.refresh_shown_at = None;
        }

        if self
            .notice_shown_at
            .is_some_and(|at| at.elapsed() >= STATUS_TIMEOUT)
        {
            self.notice = None;
            self.notice_shown_at = None;
        }

        self.refresh_output();
    }

    /// Close the sessions and delete their logs before exiting
    pub fn shutdown(&mut self) {
        self.panel.terminals_mut().remove_logs();
    }

    /// Re-read the tail of the newest session's log
    fn refresh_output(&mut self) {
        let terminals = self.panel.terminals();
        let Some(id) = terminals.latest_session() else {
            return;
        };
        self.output_title = terminals.session_name(id);
        if let Some(path) = terminals.log_path(id) {
            self.output = read_tail(path);
        }
    }
}

/// Last lines of a log file. Invalid UTF-8 is replaced, not rejected.
fn read_tail(path: &Path) -> Vec<String> {
    match read_end(path, TAIL_BYTES) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            state::tail_lines(&text, state::OUTPUT_LINES)
        }
        Err(e) => {
            log::debug!("Could not read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_end(path: &Path, max: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(max);
    file.seek(SeekFrom::Start(start))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    // A cut in the middle of the file leaves a partial first line
    if start > 0 {
        let first_newline = bytes.iter().position(|b| *b == b'\n').map_or(0, |i| i + 1);
        bytes.drain(..first_newline);
    }
    Ok(bytes)
}
