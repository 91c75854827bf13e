//! Terminal sessions that receive command lines
//!
//! A session is a long-lived shell process reading commands from its stdin,
//! so several submissions to one session run one after another in the same
//! shell, like typing into a terminal. Output either goes straight to our own
//! terminal or into a per-session log file.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Identifier of a session within one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a new session should look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub name: String,
    /// Whether the session's output should be visible
    pub reveal: bool,
    /// Shell program; falls back to `$SHELL`, then the platform shell
    pub shell: Option<String>,
}

/// Error type for terminal operations
#[derive(Debug)]
pub enum TerminalError {
    Spawn(std::io::Error),
    Io(std::io::Error),
    Write(SessionId, std::io::Error),
    UnknownSession(SessionId),
    Closed(SessionId),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::Spawn(e) => write!(f, "Failed to start shell: {}", e),
            TerminalError::Io(e) => write!(f, "IO error: {}", e),
            TerminalError::Write(id, e) => write!(f, "Failed to send to session {}: {}", id, e),
            TerminalError::UnknownSession(id) => write!(f, "No such session: {}", id),
            TerminalError::Closed(id) => write!(f, "Session {} has exited", id),
        }
    }
}

impl std::error::Error for TerminalError {}

/// The terminal host the dispatcher talks to
pub trait TerminalProvider {
    /// The session currently in the foreground, if it is still usable
    fn active_session(&mut self) -> Option<SessionId>;

    /// Start a new session
    fn create_session(&mut self, request: &SessionRequest) -> Result<SessionId, TerminalError>;

    /// Bring a session to the foreground
    fn show(&mut self, id: SessionId) -> Result<(), TerminalError>;

    /// Submit one line of text for execution
    fn send_text(&mut self, id: SessionId, text: &str) -> Result<(), TerminalError>;

    /// Display name of a session
    fn session_name(&self, id: SessionId) -> Option<String>;
}

/// Where session output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Share our stdout/stderr; hidden sessions discard output
    Inherit,
    /// One `session-<n>.log` file per session in this directory
    LogDir(PathBuf),
}

struct Session {
    id: SessionId,
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    log_path: Option<PathBuf>,
}

impl Session {
    fn is_alive(&mut self) -> bool {
        self.stdin.is_some() && matches!(self.child.try_wait(), Ok(None))
    }
}

/// Sessions backed by shell child processes
pub struct ShellTerminals {
    sink: OutputSink,
    sessions: Vec<Session>,
    active: Option<SessionId>,
    next_id: u32,
}

/// Shell used when neither the request nor `$SHELL` names one
pub const fn platform_shell() -> &'static str {
    if cfg!(windows) {
        "cmd"
    } else {
        "sh"
    }
}

/// Pick a unique name among `taken` by appending " (n)"
pub fn unique_name<'a>(base: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    if !taken.clone().any(|name| name == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !taken.clone().any(|name| name == candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

impl ShellTerminals {
    pub fn new(sink: OutputSink) -> Self {
        Self {
            sink,
            sessions: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Log file of a session, when output goes to files
    pub fn log_path(&self, id: SessionId) -> Option<&Path> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.log_path.as_deref())
    }

    /// Most recently started session
    pub fn latest_session(&self) -> Option<SessionId> {
        self.sessions.last().map(|s| s.id)
    }

    /// Close every session's input and wait for the shells to finish
    pub fn wait_all(&mut self) {
        for mut session in self.sessions.drain(..) {
            drop(session.stdin.take());
            match session.child.wait() {
                Ok(status) if !status.success() => {
                    log::info!("Session {} exited with {}", session.name, status)
                }
                Ok(_) => {}
                Err(e) => log::error!("Failed to wait for session {}: {}", session.name, e),
            }
        }
        self.active = None;
    }

    /// Close every session's input and delete the log folder, if any.
    /// Shells that are still busy keep running; their output is discarded.
    pub fn remove_logs(&mut self) {
        for session in &mut self.sessions {
            drop(session.stdin.take());
        }
        let OutputSink::LogDir(dir) = &self.sink else {
            return;
        };
        match std::fs::remove_dir_all(dir) {
            Ok(()) => log::debug!("Removed session logs in {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {}", dir.display(), e),
        }
    }

    fn resolve_shell(request: &SessionRequest) -> String {
        request
            .shell
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| platform_shell().to_string())
    }

    fn output_for(&self, id: SessionId, reveal: bool) -> Result<(Stdio, Stdio, Option<PathBuf>), TerminalError> {
        match &self.sink {
            OutputSink::Inherit if reveal => Ok((Stdio::inherit(), Stdio::inherit(), None)),
            OutputSink::Inherit => Ok((Stdio::null(), Stdio::null(), None)),
            OutputSink::LogDir(dir) => {
                std::fs::create_dir_all(dir).map_err(TerminalError::Io)?;
                let path = dir.join(format!("session-{}.log", id.0));
                let out = File::create(&path).map_err(TerminalError::Io)?;
                let err = out.try_clone().map_err(TerminalError::Io)?;
                Ok((Stdio::from(out), Stdio::from(err), Some(path)))
            }
        }
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session, TerminalError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(TerminalError::UnknownSession(id))
    }
}

impl TerminalProvider for ShellTerminals {
    fn active_session(&mut self) -> Option<SessionId> {
        let id = self.active?;
        let alive = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .map(Session::is_alive)
            .unwrap_or(false);

        if alive {
            Some(id)
        } else {
            self.active = None;
            None
        }
    }

    fn create_session(&mut self, request: &SessionRequest) -> Result<SessionId, TerminalError> {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let live: Vec<String> = self
            .sessions
            .iter_mut()
            .filter_map(|s| s.is_alive().then(|| s.name.clone()))
            .collect();
        let name = unique_name(&request.name, live.iter().map(String::as_str));

        let shell = Self::resolve_shell(request);
        let mut parts = shell.split_whitespace();
        let program = parts.next().unwrap_or(platform_shell());
        let (stdout, stderr, log_path) = self.output_for(id, request.reveal)?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(TerminalError::Spawn)?;
        let stdin = child.stdin.take();

        log::info!("Started session {} '{}' ({})", id, name, program);
        self.sessions.push(Session {
            id,
            name,
            child,
            stdin,
            log_path,
        });
        Ok(id)
    }

    fn show(&mut self, id: SessionId) -> Result<(), TerminalError> {
        let session = self.session_mut(id)?;
        if !session.is_alive() {
            return Err(TerminalError::Closed(id));
        }
        self.active = Some(id);
        Ok(())
    }

    fn send_text(&mut self, id: SessionId, text: &str) -> Result<(), TerminalError> {
        let session = self.session_mut(id)?;
        let stdin = session.stdin.as_mut().ok_or(TerminalError::Closed(id))?;

        let result = writeln!(stdin, "{}", text).and_then(|_| stdin.flush());
        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                session.stdin = None;
                return Err(TerminalError::Closed(id));
            }
            return Err(TerminalError::Write(id, e));
        }
        Ok(())
    }

    fn session_name(&self, id: SessionId) -> Option<String> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
    }
}

impl Drop for ShellTerminals {
    fn drop(&mut self) {
        // EOF lets each shell finish its queued commands and exit
        for session in &mut self.sessions {
            drop(session.stdin.take());
        }
    }
}
