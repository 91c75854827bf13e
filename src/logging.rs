//! Diagnostic log setup
//!
//! Lines look like `[INFO] 2026-10-17T09:30:00.123Z: message`. The CLI logs
//! to stderr; the panel logs to a file so the screen stays intact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};

/// Environment variable holding an env_logger filter, e.g. `clickcmds=debug`
pub const LOG_ENV: &str = "CLICKCMDS_LOG";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Default log file used by the panel
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("clickcmds.log")
}

/// Filter used when `CLICKCMDS_LOG` is unset
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Render one log line
pub fn format_line(level: log::Level, timestamp: &str, message: &str) -> String {
    format!("[{}] {}: {}", level, timestamp, message)
}

/// Install the global logger. Only the first call has an effect.
pub fn init(verbosity: u8, target: LogTarget) {
    let env = env_logger::Env::new().filter_or(LOG_ENV, level_for_verbosity(verbosity));
    let mut builder = env_logger::Builder::from_env(env);

    builder.format(|buf, record| {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(
            buf,
            "{}",
            format_line(record.level(), &timestamp, &record.args().to_string())
        )
    });

    if let LogTarget::File(path) = target {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                // No logger at all rather than drawing over the UI
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                return;
            }
        }
    }

    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(5), "debug");
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(log::Level::Error, "2026-01-01T00:00:00.000Z", "Failed to write config"),
            "[ERROR] 2026-01-01T00:00:00.000Z: Failed to write config"
        );
    }
}
