//! Opening the config file in the user's editor

use std::fmt;
use std::path::Path;
use std::process::Command;

/// Error type for editor launches
#[derive(Debug)]
pub enum EditorError {
    Spawn(String, std::io::Error),
    Status(String, Option<i32>),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Spawn(editor, e) => write!(f, "Failed to start {}: {}", editor, e),
            EditorError::Status(editor, Some(code)) => {
                write!(f, "{} exited with status {}", editor, code)
            }
            EditorError::Status(editor, None) => write!(f, "{} was terminated", editor),
        }
    }
}

impl std::error::Error for EditorError {}

/// Editor command from `$VISUAL`, then `$EDITOR`, then `vi`
pub fn editor_command() -> String {
    resolve_editor(std::env::var("VISUAL").ok(), std::env::var("EDITOR").ok())
}

fn resolve_editor(visual: Option<String>, editor: Option<String>) -> String {
    visual
        .filter(|v| !v.trim().is_empty())
        .or_else(|| editor.filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| "vi".to_string())
}

/// Open `path` in the editor and wait for it to exit
pub fn open_in_editor(path: &Path) -> Result<(), EditorError> {
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");

    log::info!("Opening {} with {}", path.display(), editor);
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| EditorError::Spawn(editor.clone(), e))?;

    if status.success() {
        Ok(())
    } else {
        Err(EditorError::Status(editor, status.code()))
    }
}
