//! Panel controller: UI messages in, reactions out
//!
//! Front ends (the terminal panel, the CLI) turn user actions into
//! [`PanelMessage`]s and act on the returned [`Reaction`]. Every message is
//! handled to completion before the next one.

use std::path::PathBuf;

use serde::Serialize;

use crate::dispatch::{DispatchError, DispatchOutcome, Dispatcher};
use crate::document::{compute_effective, Document, EffectiveConfig};
use crate::store::ConfigStore;
use crate::terminal::TerminalProvider;

/// Everything the UI can ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMessage {
    Run { name: String },
    SetOverride { name: String, value: String },
    ToggleMode { value: bool },
    OpenConfig,
    Refresh,
    ClearOverlay,
}

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }
}

/// What the front end should do after a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Redraw with this view, optionally telling the user something
    Render(PanelView, Option<Notice>),
    /// Keep the current view and show a notice
    Notify(Notice),
    /// Open the config file in an editor
    OpenEditor(PathBuf),
}

/// One command as the panel shows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRow {
    pub name: String,
    /// The command that would run
    pub command: String,
    /// Command from the base layer, if any
    pub base: Option<String>,
    /// Temporary override, if any
    pub overlay: Option<String>,
}

impl CommandRow {
    pub fn is_overridden(&self) -> bool {
        self.overlay.is_some()
    }
}

/// Everything needed to draw the panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub rows: Vec<CommandRow>,
    pub run_in_current_terminal: bool,
    pub config_path: Option<PathBuf>,
}

impl PanelView {
    /// Build the view from a document and its merged form
    pub fn build(doc: &Document, effective: &EffectiveConfig, config_path: Option<PathBuf>) -> Self {
        let rows = effective
            .commands
            .iter()
            .map(|(name, command)| CommandRow {
                name: name.clone(),
                command: command.clone(),
                base: doc.base_command(name).map(str::to_string),
                overlay: doc.overlay_command(name).map(str::to_string),
            })
            .collect();

        Self {
            rows,
            run_in_current_terminal: effective.run_in_current_terminal,
            config_path,
        }
    }

    pub fn row(&self, name: &str) -> Option<&CommandRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Resolve a pick-list answer: a 1-based index or an exact name
pub fn parse_selection<'a>(input: &str, names: &[&'a str]) -> Option<&'a str> {
    let answer = input.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| names.get(i)).copied();
    }
    names.iter().find(|name| **name == answer).copied()
}

/// Store, dispatcher and terminals behind one message handler
pub struct Panel<T: TerminalProvider> {
    store: ConfigStore,
    dispatcher: Dispatcher,
    terminals: T,
}

impl<T: TerminalProvider> Panel<T> {
    pub fn new(store: ConfigStore, dispatcher: Dispatcher, terminals: T) -> Self {
        Self {
            store,
            dispatcher,
            terminals,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn terminals(&self) -> &T {
        &self.terminals
    }

    pub fn terminals_mut(&mut self) -> &mut T {
        &mut self.terminals
    }

    /// Seed the file if needed, read it and build the view
    pub fn render(&self) -> PanelView {
        self.store.ensure_initialized();
        let doc = self.store.read();
        let effective = compute_effective(&doc);
        log::debug!("Rendering {} command(s)", effective.commands.len());
        PanelView::build(&doc, &effective, self.store.config_path())
    }

    /// Run a command, returning the dispatch result untouched
    pub fn run(&mut self, name: &str) -> Result<DispatchOutcome, DispatchError> {
        self.dispatcher.dispatch(&self.store, &mut self.terminals, name)
    }

    /// Handle one UI message
    pub fn handle(&mut self, message: PanelMessage) -> Reaction {
        log::debug!("Received message: {:?}", message);
        match message {
            PanelMessage::Run { name } => match self.run(&name) {
                Ok(outcome) => Reaction::Notify(Notice::Info(format!(
                    "Sent '{}' to {}",
                    outcome.name, outcome.session_name
                ))),
                Err(DispatchError::NotFound(name)) => {
                    Reaction::Notify(Notice::Warning(format!("Command not found: {}", name)))
                }
                Err(e) => {
                    log::error!("Failed to run command {}: {}", name, e);
                    Reaction::Notify(Notice::Error(format!("Failed to run command {}: {}", name, e)))
                }
            },
            PanelMessage::SetOverride { name, value } => {
                self.store.set_overlay_command(&name, &value);
                Reaction::Render(self.render(), None)
            }
            PanelMessage::ToggleMode { value } => {
                self.store.set_overlay_run_mode(value);
                Reaction::Render(self.render(), None)
            }
            PanelMessage::OpenConfig => match self.store.config_path() {
                Some(path) => {
                    self.store.ensure_initialized();
                    Reaction::OpenEditor(path)
                }
                None => Reaction::Notify(Notice::Warning("No workspace folder open".to_string())),
            },
            PanelMessage::Refresh => Reaction::Render(self.render(), None),
            PanelMessage::ClearOverlay => {
                self.store.clear_overlay();
                Reaction::Render(
                    self.render(),
                    Some(Notice::Info("Temporary settings cleared".to_string())),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::FakeTerminals;
    use crate::store::Workspace;
    use tempfile::TempDir;

    fn panel_in(dir: &TempDir, contents: &str) -> Panel<FakeTerminals> {
        std::fs::write(dir.path().join(".cmmds"), contents).unwrap();
        let store = ConfigStore::new(Workspace::at(dir.path()), ".cmmds");
        Panel::new(store, Dispatcher::default(), FakeTerminals::default())
    }

    fn rendered(reaction: Reaction) -> PanelView {
        match reaction {
            Reaction::Render(view, _) => view,
            other => panic!("expected render, got {:?}", other),
        }
    }

    #[test]
    fn test_view_marks_overrides() {
        let dir = TempDir::new().unwrap();
        let mut panel = panel_in(
            &dir,
            "commands:\n  build: echo A\n  test: echo T\ntemporary:\n  commands:\n    build: echo B\n    only: echo O\n",
        );

        let view = rendered(panel.handle(PanelMessage::Refresh));
        assert_eq!(view.names(), vec!["build", "only", "test"]);

        let build = view.row("build").unwrap();
        assert_eq!(build.command, "echo B");
        assert_eq!(build.base.as_deref(), Some("echo A"));
        assert!(build.is_overridden());

        let only = view.row("only").unwrap();
        assert_eq!(only.base, None);
        assert!(!view.row("test").unwrap().is_overridden());
        assert!(view.run_in_current_terminal);
    }

    #[test]
    fn test_set_override_then_clear() {
        let dir = TempDir::new().unwrap();
        let mut panel = panel_in(&dir, "commands:\n  build: echo A\n");

        let view = rendered(panel.handle(PanelMessage::SetOverride {
            name: "build".to_string(),
            value: "echo B".to_string(),
        }));
        assert_eq!(view.row("build").unwrap().command, "echo B");

        let view = rendered(panel.handle(PanelMessage::SetOverride {
            name: "build".to_string(),
            value: " ".to_string(),
        }));
        let build = view.row("build").unwrap();
        assert_eq!(build.command, "echo A");
        assert!(!build.is_overridden());
    }

    #[test]
    fn test_toggle_and_clear_overlay() {
        let dir = TempDir::new().unwrap();
        let mut panel = panel_in(&dir, "settings:\n  runInCurrentTerminal: true\ncommands:\n  a: echo a\n");

        let view = rendered(panel.handle(PanelMessage::ToggleMode { value: false }));
        assert!(!view.run_in_current_terminal);

        match panel.handle(PanelMessage::ClearOverlay) {
            Reaction::Render(view, Some(Notice::Info(_))) => assert!(view.run_in_current_terminal),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_run_reports_outcome() {
        let dir = TempDir::new().unwrap();
        let mut panel = panel_in(&dir, "commands:\n  build: echo A\n");

        match panel.handle(PanelMessage::Run { name: "build".to_string() }) {
            Reaction::Notify(Notice::Info(text)) => assert!(text.contains("ClickCmds")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(panel.terminals().created(), 1);

        match panel.handle(PanelMessage::Run { name: "nope".to_string() }) {
            Reaction::Notify(Notice::Warning(text)) => assert_eq!(text, "Command not found: nope"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(panel.terminals().created(), 1);
    }

    #[test]
    fn test_run_terminal_failure_is_error_notice() {
        let dir = TempDir::new().unwrap();
        let mut panel = panel_in(&dir, "commands:\n  build: echo A\n");
        panel.terminals_mut().fail_send = true;

        assert!(matches!(
            panel.handle(PanelMessage::Run { name: "build".to_string() }),
            Reaction::Notify(Notice::Error(_))
        ));
    }

    #[test]
    fn test_open_config() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(Workspace::at(dir.path()), ".cmmds");
        let mut panel = Panel::new(store, Dispatcher::default(), FakeTerminals::default());

        let path = dir.path().join(".cmmds");
        assert_eq!(panel.handle(PanelMessage::OpenConfig), Reaction::OpenEditor(path.clone()));
        assert!(path.exists());

        let store = ConfigStore::new(Workspace::none(), ".cmmds");
        let mut panel = Panel::new(store, Dispatcher::default(), FakeTerminals::default());
        assert!(matches!(
            panel.handle(PanelMessage::OpenConfig),
            Reaction::Notify(Notice::Warning(_))
        ));
    }

    #[test]
    fn test_render_seeds_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(Workspace::at(dir.path()), ".cmmds");
        let panel = Panel::new(store, Dispatcher::default(), FakeTerminals::default());

        let view = panel.render();
        assert_eq!(view.names(), vec!["build", "deploy", "dev", "test"]);
        assert_eq!(view.config_path, Some(dir.path().join(".cmmds")));
    }

    #[test]
    fn test_parse_selection() {
        let names = ["build", "test"];
        assert_eq!(parse_selection("1", &names), Some("build"));
        assert_eq!(parse_selection(" 2\n", &names), Some("test"));
        assert_eq!(parse_selection("test", &names), Some("test"));
        assert_eq!(parse_selection("0", &names), None);
        assert_eq!(parse_selection("3", &names), None);
        assert_eq!(parse_selection("", &names), None);
        assert_eq!(parse_selection("deploy", &names), None);
    }
}
