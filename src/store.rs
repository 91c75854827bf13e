//! File-backed store for the `.cmmds` document
//!
//! Every operation re-reads the file; nothing is cached between calls, so an
//! external edit is picked up by the next read. Mutations are plain
//! read-modify-write cycles without locking (last writer wins).
//!
//! `read` and `write` never fail: read problems yield an empty document and
//! write problems are logged. The fallible forms are `load` and `save`.
//! Mutations leave a file that cannot be parsed untouched.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::document::{compute_effective, is_blank, Document, EffectiveConfig, Overlay};
use crate::init::{self, InitStatus};

/// Error type for store operations
#[derive(Debug)]
pub enum StoreError {
    NoWorkspace,
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NoWorkspace => write!(f, "No workspace folder open"),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Yaml(e) => write!(f, "YAML error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(e: serde_yaml::Error) -> Self {
        StoreError::Yaml(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Zero or one workspace root directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    root: Option<PathBuf>,
}

impl Workspace {
    /// Workspace rooted at `root`, or none if it is not an existing directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if root.is_dir() {
            Self { root: Some(root) }
        } else {
            log::warn!("Workspace root {} is not a directory", root.display());
            Self::none()
        }
    }

    /// No workspace available
    pub fn none() -> Self {
        Self { root: None }
    }

    /// Resolve the workspace root.
    ///
    /// An explicit root wins. Otherwise walk up from the current directory
    /// looking for an existing `file_name`, and fall back to the current
    /// directory itself.
    pub fn discover(explicit: Option<&Path>, file_name: &str) -> Self {
        if let Some(root) = explicit {
            return Self::at(root);
        }

        let Ok(cwd) = std::env::current_dir() else {
            return Self::none();
        };

        let mut dir = cwd.as_path();
        loop {
            if dir.join(file_name).is_file() {
                return Self::at(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        Self::at(cwd)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// Reads and writes the command document of one workspace
#[derive(Debug, Clone)]
pub struct ConfigStore {
    workspace: Workspace,
    file_name: String,
}

impl ConfigStore {
    pub fn new(workspace: Workspace, file_name: impl Into<String>) -> Self {
        Self {
            workspace,
            file_name: file_name.into(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Path of the document, if there is a workspace
    pub fn config_path(&self) -> Option<PathBuf> {
        self.workspace.root().map(|root| root.join(&self.file_name))
    }

    /// Write the sample document unless one already exists
    pub fn initialize(&self) -> Result<InitStatus> {
        let Some(path) = self.config_path() else {
            return Ok(InitStatus::NoWorkspace);
        };
        if path.exists() {
            return Ok(InitStatus::AlreadyPresent);
        }

        std::fs::write(&path, init::sample_yaml()?)?;
        log::info!("Created sample {}", path.display());
        Ok(InitStatus::Created)
    }

    /// Seed the document if it is missing. Never overwrites, never fails.
    pub fn ensure_initialized(&self) {
        if let Err(e) = self.initialize() {
            log::error!("Failed to create sample config: {}", e);
        }
    }

    /// Load and parse the document
    pub fn load(&self) -> Result<Document> {
        let path = self.config_path().ok_or(StoreError::NoWorkspace)?;
        let text = std::fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Document::default());
        }

        let value: Value = serde_yaml::from_str(&text)?;
        if value.is_null() {
            return Ok(Document::default());
        }
        Ok(serde_yaml::from_value(value)?)
    }

    /// Load the document, treating any failure as an empty document
    pub fn read(&self) -> Document {
        match self.load() {
            Ok(doc) => doc,
            Err(StoreError::NoWorkspace) => Document::default(),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Config file not found, using empty document");
                Document::default()
            }
            Err(e) => {
                log::warn!("Failed to read config: {}", e);
                Document::default()
            }
        }
    }

    /// The document to base a mutation on. `None` when the file exists but
    /// cannot be parsed, so that a mutation never replaces it.
    fn read_for_update(&self) -> Option<Document> {
        match self.load() {
            Ok(doc) => Some(doc),
            Err(StoreError::NoWorkspace) => Some(Document::default()),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Some(Document::default())
            }
            Err(e) => {
                log::error!("Not updating config, it could not be read: {}", e);
                None
            }
        }
    }

    /// Serialize and replace the whole document
    pub fn save(&self, doc: &Document) -> Result<()> {
        let path = self.config_path().ok_or(StoreError::NoWorkspace)?;
        let yaml = serde_yaml::to_string(doc)?;
        std::fs::write(&path, yaml)?;
        Ok(())
    }

    /// Replace the whole document, logging failures
    pub fn write(&self, doc: &Document) {
        match self.save(doc) {
            Ok(()) => {}
            Err(StoreError::NoWorkspace) => log::debug!("No workspace, config not written"),
            Err(e) => log::error!("Failed to write config: {}", e),
        }
    }

    /// Read the document and merge its layers
    pub fn effective(&self) -> EffectiveConfig {
        compute_effective(&self.read())
    }

    /// Set a temporary override for `name`; a blank `value` removes it
    pub fn set_overlay_command(&self, name: &str, value: &str) {
        let Some(mut doc) = self.read_for_update() else {
            return;
        };
        let overlay = doc.overlay_mut();

        if is_blank(value) {
            overlay.commands.remove(name);
            log::debug!("Cleared temporary command: {}", name);
        } else {
            overlay.commands.insert(name.to_string(), value.to_string());
            log::debug!("Set temporary command: {} = {}", name, value);
        }

        self.write(&doc);
    }

    /// Set the temporary `runInCurrentTerminal` flag
    pub fn set_overlay_run_mode(&self, value: bool) {
        let Some(mut doc) = self.read_for_update() else {
            return;
        };
        doc.overlay_mut().settings.run_in_current_terminal = Some(value);

        self.write(&doc);
        log::debug!("Set temporary runInCurrentTerminal: {}", value);
    }

    /// Drop every temporary setting and command
    pub fn clear_overlay(&self) {
        let Some(mut doc) = self.read_for_update() else {
            return;
        };
        doc.temporary = Some(Overlay::default());

        self.write(&doc);
        log::info!("Cleared all temporary settings");
    }
}
