//! Preferences for the clickcmds tool itself
//!
//! Reads from .clickcmds/config.toml. These are not the project's commands
//! (those live in `.cmmds`, see [`crate::document`]), only how the tool
//! behaves: which file to read and how terminal sessions are named and shown.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the command file at the workspace root
pub const DEFAULT_CONFIG_FILE: &str = ".cmmds";

/// Default name of the shared terminal session
pub const DEFAULT_SESSION_NAME: &str = "ClickCmds";

/// Preferences structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Preferences {
    /// Terminal session settings
    #[serde(default)]
    pub terminal: TerminalPrefs,

    /// Command file settings
    #[serde(default)]
    pub file: FilePrefs,
}

/// Terminal-related preferences
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TerminalPrefs {
    /// Name of the shared session used when running in the current terminal.
    /// Dedicated sessions are named "<session_name>: <command>".
    /// Default: "ClickCmds"
    #[serde(default = "default_session_name")]
    pub session_name: String,

    /// Whether dedicated (one per run) sessions are brought to the foreground
    /// Default: false
    #[serde(default)]
    pub reveal_dedicated: bool,
}

/// Command file preferences
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilePrefs {
    /// File name looked up in the workspace root
    /// Default: ".cmmds"
    #[serde(default = "default_file_name")]
    pub name: String,
}

fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

fn default_file_name() -> String {
    DEFAULT_CONFIG_FILE.to_string()
}

impl Default for TerminalPrefs {
    fn default() -> Self {
        Self {
            session_name: default_session_name(),
            reveal_dedicated: false,
        }
    }
}

impl TerminalPrefs {
    /// Name of the dedicated session for `command`
    pub fn dedicated_session_name(&self, command: &str) -> String {
        format!("{}: {}", self.session_name, command)
    }
}

impl Default for FilePrefs {
    fn default() -> Self {
        Self {
            name: default_file_name(),
        }
    }
}

impl Preferences {
    /// Load preferences starting the lookup at `start`.
    /// Returns defaults if no file is found or it does not parse.
    pub fn load_from(start: &Path) -> Self {
        if let Some(path) = Self::find_path(start) {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(prefs) => {
                        log::debug!("Loaded preferences from {}", path.display());
                        return prefs;
                    }
                    Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up the directory tree from `start`
    fn find_path(start: &Path) -> Option<PathBuf> {
        let mut dir = start;

        loop {
            let path = dir.join(".clickcmds").join("config.toml");
            if path.exists() {
                return Some(path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

}
