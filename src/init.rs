//! Project initialization for clickcmds
//!
//! `clickcmds init` (and every panel render) seeds the `.cmmds` file with a
//! sample document when the workspace has none.

use colored::Colorize;

use crate::document::{CommandMap, Document, Overlay, Settings};
use crate::store::ConfigStore;

/// Comment written above the sample document
pub const SAMPLE_HEADER: &str = "# ClickCmds configuration\n";

/// Commands the sample document declares
const SAMPLE_COMMANDS: &[(&str, &str)] = &[
    ("build", "echo 'Building project...'"),
    ("test", "echo 'Running tests...'"),
    ("dev", "echo 'Starting dev server...'"),
    ("deploy", "echo 'Deploying application...'"),
];

/// Result of an initialization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// The sample document was written
    Created,
    /// A document already existed and was left untouched
    AlreadyPresent,
    /// There is no workspace root to write into
    NoWorkspace,
}

/// The document written on first access
pub fn sample_document() -> Document {
    let commands: CommandMap = SAMPLE_COMMANDS
        .iter()
        .map(|(name, cmd)| (name.to_string(), cmd.to_string()))
        .collect();

    Document {
        settings: Some(Settings {
            run_in_current_terminal: Some(true),
            ..Default::default()
        }),
        commands: Some(commands),
        temporary: Some(Overlay::default()),
        ..Default::default()
    }
}

/// Sample document rendered as file contents, header included
pub fn sample_yaml() -> Result<String, serde_yaml::Error> {
    Ok(format!(
        "{}{}",
        SAMPLE_HEADER,
        serde_yaml::to_string(&sample_document())?
    ))
}

/// `clickcmds init`: create the sample file and report what happened
pub fn init_project(store: &ConfigStore) -> Result<InitStatus, String> {
    println!("\n{}", "Initializing ClickCmds...".cyan().bold());

    let status = store.initialize().map_err(|e| e.to_string())?;
    let path = store
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match status {
        InitStatus::Created => {
            println!("   {} {}", "Creating".green(), path);
            println!("\n{}", "ClickCmds initialized!".green().bold());
            println!("\nNext steps:");
            println!("  1. Edit the commands in {}", path.cyan());
            println!("  2. Run {} to open the panel", "clickcmds".cyan());
            println!("  3. Or run one directly: {}", "clickcmds run build".cyan());
            println!();
        }
        InitStatus::AlreadyPresent => {
            println!("   {} {} (already exists)", "Skipping".yellow(), path);
        }
        InitStatus::NoWorkspace => {
            println!("   {} no workspace folder available", "Skipping".yellow());
        }
    }

    Ok(status)
}
