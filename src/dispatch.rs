//! Command dispatch: resolve a name and hand the command line to a session

use std::fmt;

use crate::config::{Preferences, TerminalPrefs};
use crate::document::EffectiveConfig;
use crate::store::ConfigStore;
use crate::terminal::{SessionId, SessionRequest, TerminalError, TerminalProvider};

/// Where a command will be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The session already in the foreground
    Reuse(SessionId),
    /// A new shared session, which then becomes the foreground one
    CreateShared,
    /// A new session just for this run
    CreateDedicated,
}

/// Choose the target session.
///
/// Running in the current terminal reuses the active session when there is
/// one; otherwise every run gets its own session.
pub fn select_target(run_in_current_terminal: bool, active: Option<SessionId>) -> Target {
    match (run_in_current_terminal, active) {
        (true, Some(id)) => Target::Reuse(id),
        (true, None) => Target::CreateShared,
        (false, _) => Target::CreateDedicated,
    }
}

/// A submitted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub name: String,
    pub command: String,
    pub session: SessionId,
    pub session_name: String,
    pub target: Target,
}

/// Error type for dispatch
#[derive(Debug)]
pub enum DispatchError {
    NotFound(String),
    Terminal(TerminalError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound(name) => write!(f, "Command not found: {}", name),
            DispatchError::Terminal(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<TerminalError> for DispatchError {
    fn from(e: TerminalError) -> Self {
        DispatchError::Terminal(e)
    }
}

/// Resolves command names and submits them
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    prefs: TerminalPrefs,
}

impl Dispatcher {
    pub fn new(prefs: TerminalPrefs) -> Self {
        Self { prefs }
    }

    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(prefs.terminal.clone())
    }

    /// Read the store, resolve `name` and submit it
    pub fn dispatch<T: TerminalProvider + ?Sized>(
        &self,
        store: &ConfigStore,
        terminals: &mut T,
        name: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_effective(&store.effective(), terminals, name)
    }

    /// Submit `name` from an already merged configuration
    pub fn dispatch_effective<T: TerminalProvider + ?Sized>(
        &self,
        effective: &EffectiveConfig,
        terminals: &mut T,
        name: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        let command = effective
            .command(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;

        log::info!("Executing command: {} -> {}", name, command);

        let active = if effective.run_in_current_terminal {
            terminals.active_session()
        } else {
            None
        };
        let target = select_target(effective.run_in_current_terminal, active);

        let session = match target {
            Target::Reuse(id) => {
                terminals.show(id)?;
                terminals.send_text(id, command)?;
                id
            }
            Target::CreateShared => {
                let id = terminals.create_session(&SessionRequest {
                    name: self.prefs.session_name.clone(),
                    reveal: true,
                    shell: effective.shell.clone(),
                })?;
                terminals.show(id)?;
                terminals.send_text(id, command)?;
                id
            }
            Target::CreateDedicated => {
                let id = terminals.create_session(&SessionRequest {
                    name: self.prefs.dedicated_session_name(name),
                    reveal: self.prefs.reveal_dedicated,
                    shell: effective.shell.clone(),
                })?;
                terminals.send_text(id, command)?;
                if self.prefs.reveal_dedicated {
                    terminals.show(id)?;
                }
                id
            }
        };

        Ok(DispatchOutcome {
            name: name.to_string(),
            command: command.to_string(),
            session,
            session_name: terminals.session_name(session).unwrap_or_default(),
            target,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Something the fake terminal was asked to do
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Create(SessionRequest),
        Show(SessionId),
        Send(SessionId, String),
    }

    /// Records calls instead of starting shells
    #[derive(Debug, Default)]
    pub struct FakeTerminals {
        pub calls: Vec<Call>,
        pub names: Vec<(SessionId, String)>,
        pub active: Option<SessionId>,
        pub fail_send: bool,
        pub next: u32,
    }

    impl FakeTerminals {
        pub fn created(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Create(_)))
                .count()
        }

        pub fn sent(&self) -> Vec<(SessionId, String)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Send(id, text) => Some((*id, text.clone())),
                    _ => None,
                })
                .collect()
        }
    }

    impl TerminalProvider for FakeTerminals {
        fn active_session(&mut self) -> Option<SessionId> {
            self.active
        }

        fn create_session(&mut self, request: &SessionRequest) -> Result<SessionId, TerminalError> {
            self.next += 1;
            let id = SessionId(self.next);
            self.calls.push(Call::Create(request.clone()));
            self.names.push((id, request.name.clone()));
            Ok(id)
        }

        fn show(&mut self, id: SessionId) -> Result<(), TerminalError> {
            self.calls.push(Call::Show(id));
            self.active = Some(id);
            Ok(())
        }

        fn send_text(&mut self, id: SessionId, text: &str) -> Result<(), TerminalError> {
            if self.fail_send {
                return Err(TerminalError::Closed(id));
            }
            self.calls.push(Call::Send(id, text.to_string()));
            Ok(())
        }

        fn session_name(&self, id: SessionId) -> Option<String> {
            self.names
                .iter()
                .find(|(sid, _)| *sid == id)
                .map(|(_, name)| name.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, FakeTerminals};
    use super::*;
    use crate::document::CommandMap;

    fn effective(run_in_current_terminal: bool) -> EffectiveConfig {
        let mut commands = CommandMap::new();
        commands.insert("build".to_string(), "cargo build".to_string());
        commands.insert("blank".to_string(), "  ".to_string());
        EffectiveConfig {
            commands,
            run_in_current_terminal,
            shell: None,
        }
    }

    #[test]
    fn test_select_target() {
        let id = SessionId(3);
        assert_eq!(select_target(true, Some(id)), Target::Reuse(id));
        assert_eq!(select_target(true, None), Target::CreateShared);
        assert_eq!(select_target(false, Some(id)), Target::CreateDedicated);
        assert_eq!(select_target(false, None), Target::CreateDedicated);
    }

    #[test]
    fn test_not_found_touches_no_terminal() {
        let mut terms = FakeTerminals::default();
        let dispatcher = Dispatcher::default();

        let err = dispatcher
            .dispatch_effective(&effective(true), &mut terms, "deploy")
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(ref n) if n == "deploy"));
        assert!(terms.calls.is_empty());

        let err = dispatcher
            .dispatch_effective(&effective(true), &mut terms, "blank")
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
        assert!(terms.calls.is_empty());
    }

    #[test]
    fn test_current_terminal_creates_then_reuses() {
        let mut terms = FakeTerminals::default();
        let dispatcher = Dispatcher::new(TerminalPrefs::default());

        let first = dispatcher
            .dispatch_effective(&effective(true), &mut terms, "build")
            .unwrap();
        assert_eq!(first.target, Target::CreateShared);
        assert_eq!(first.session_name, "ClickCmds");

        let second = dispatcher
            .dispatch_effective(&effective(true), &mut terms, "build")
            .unwrap();
        assert_eq!(second.target, Target::Reuse(first.session));
        assert_eq!(terms.created(), 1);
        assert_eq!(
            terms.sent(),
            vec![
                (first.session, "cargo build".to_string()),
                (first.session, "cargo build".to_string()),
            ]
        );
    }

    #[test]
    fn test_current_terminal_uses_existing_active_session() {
        let mut terms = FakeTerminals {
            active: Some(SessionId(42)),
            ..Default::default()
        };
        let outcome = Dispatcher::default()
            .dispatch_effective(&effective(true), &mut terms, "build")
            .unwrap();
        assert_eq!(outcome.session, SessionId(42));
        assert_eq!(terms.created(), 0);
        assert_eq!(terms.calls[0], Call::Show(SessionId(42)));
    }

    #[test]
    fn test_dedicated_session_per_run() {
        let mut terms = FakeTerminals {
            active: Some(SessionId(42)),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(TerminalPrefs::default());

        let a = dispatcher
            .dispatch_effective(&effective(false), &mut terms, "build")
            .unwrap();
        let b = dispatcher
            .dispatch_effective(&effective(false), &mut terms, "build")
            .unwrap();

        assert_ne!(a.session, b.session);
        assert_eq!(a.target, Target::CreateDedicated);
        assert_eq!(a.session_name, "ClickCmds: build");
        assert_eq!(terms.created(), 2);
        // Hidden by default: nothing is brought to the foreground
        assert!(!terms.calls.iter().any(|c| matches!(c, Call::Show(_))));
        assert_eq!(terms.active, Some(SessionId(42)));
    }

    #[test]
    fn test_dedicated_session_revealed_when_configured() {
        let mut terms = FakeTerminals::default();
        let prefs = TerminalPrefs {
            reveal_dedicated: true,
            ..Default::default()
        };

        let outcome = Dispatcher::new(prefs)
            .dispatch_effective(&effective(false), &mut terms, "build")
            .unwrap();

        match &terms.calls[0] {
            Call::Create(request) => assert!(request.reveal),
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(terms.calls.last(), Some(&Call::Show(outcome.session)));
    }

    #[test]
    fn test_terminal_failure_is_reported() {
        let mut terms = FakeTerminals {
            fail_send: true,
            ..Default::default()
        };
        let err = Dispatcher::default()
            .dispatch_effective(&effective(true), &mut terms, "build")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Terminal(TerminalError::Closed(_))));
    }

    #[test]
    fn test_dispatch_reads_store() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".cmmds"),
            "commands:\n  build: echo A\ntemporary:\n  commands:\n    build: echo B\n",
        )
        .unwrap();
        let store = ConfigStore::new(crate::store::Workspace::at(dir.path()), ".cmmds");
        let mut terms = FakeTerminals::default();

        let outcome = Dispatcher::default()
            .dispatch(&store, &mut terms, "build")
            .unwrap();
        assert_eq!(outcome.command, "echo B");
    }

    #[test]
    fn test_empty_store_is_not_found() {
        let store = ConfigStore::new(crate::store::Workspace::none(), ".cmmds");
        let mut terms = FakeTerminals::default();
        let err = Dispatcher::default()
            .dispatch(&store, &mut terms, "anything")
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
        assert_eq!(terms.created(), 0);
    }
}
