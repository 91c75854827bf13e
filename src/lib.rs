//! ClickCmds - clickable project commands
//!
//! Reads a small YAML file (`.cmmds`) from the workspace root, shows its
//! commands in a terminal panel and sends the chosen one to a shell session.
//!
//! # Layers
//!
//! | Layer | Key | Purpose |
//! |-------|-----|---------|
//! | base | `settings`, `commands` | What the project declares |
//! | overlay | `temporary` | Session overrides, persisted in the same file |
//!
//! The overlay wins on name collisions, and its `runInCurrentTerminal` flag
//! wins over the base one, which defaults to `true`.
//!
//! # Quick Start
//!
//! ```no_run
//! use clickcmds::{ConfigStore, Workspace};
//!
//! let store = ConfigStore::new(Workspace::at("."), ".cmmds");
//! store.ensure_initialized();
//!
//! // Override a command for now
//! store.set_overlay_command("build", "cargo build --release");
//!
//! let effective = store.effective();
//! println!("build -> {:?}", effective.command("build"));
//! ```

pub mod config;
pub mod dispatch;
pub mod document;
pub mod editor;
pub mod init;
pub mod logging;
pub mod panel;
pub mod store;
pub mod terminal;
pub mod tui;

pub use config::Preferences;
pub use dispatch::{select_target, DispatchError, DispatchOutcome, Dispatcher, Target};
pub use document::{compute_effective, CommandMap, Document, EffectiveConfig, Overlay, Settings};
pub use init::InitStatus;
pub use panel::{CommandRow, Notice, Panel, PanelMessage, PanelView, Reaction};
pub use store::{ConfigStore, StoreError, Workspace};
pub use terminal::{OutputSink, SessionId, SessionRequest, ShellTerminals, TerminalError, TerminalProvider};
