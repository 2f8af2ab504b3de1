//! # In-Memory Backend
//!
//! A model of the backing server kept in process memory: databases,
//! accounts and per-database grants with the same idempotent semantics as
//! the SQL the MariaDB backend issues. Used for local development
//! (`serve --backend memory`) and for tests, which can inject failures and
//! compare state snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::backend::{AdminBackend, AdminCommand, AdminSession, BackendError, CommandKind};

/// Observable state of the backing server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSnapshot {
    pub databases: BTreeSet<String>,
    /// Account name to password
    pub users: BTreeMap<String, String>,
    /// Account name to databases it holds all privileges on
    pub grants: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Default)]
struct MemoryServer {
    state: ServerSnapshot,
    journal: Vec<AdminCommand>,
    refuse_connections: bool,
    failing: Option<CommandKind>,
    open_sessions: usize,
}

impl MemoryServer {
    fn apply(&mut self, command: &AdminCommand) -> Result<(), BackendError> {
        if self.failing == Some(command.kind()) {
            return Err(BackendError::new(format!(
                "injected failure: {}",
                command.describe()
            )));
        }

        let state = &mut self.state;
        match command {
            AdminCommand::CreateDatabase { database } => {
                state.databases.insert(database.clone());
            }
            AdminCommand::CreateUser { username, password } => {
                state.users.insert(username.clone(), password.clone());
            }
            AdminCommand::GrantAll { database, username } => {
                if !state.users.contains_key(username) {
                    return Err(BackendError::new(format!(
                        "account {} does not exist",
                        username
                    )));
                }
                state
                    .grants
                    .entry(username.clone())
                    .or_default()
                    .insert(database.clone());
            }
            AdminCommand::DropDatabase { database } => {
                // Like MariaDB, grants on a dropped database outlive it
                state.databases.remove(database);
            }
            AdminCommand::DropUser { username } => {
                state.users.remove(username);
                state.grants.remove(username);
            }
        }

        self.journal.push(command.clone());
        Ok(())
    }
}

/// Shared in-memory backing server. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryServer>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn server(&self) -> MutexGuard<'_, MemoryServer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refuse (or accept again) administrative connections
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.server().refuse_connections = refuse;
    }

    /// Make every command of `kind` fail until cleared with `None`
    pub fn fail_command(&self, kind: Option<CommandKind>) {
        self.server().failing = kind;
    }

    /// Current server state
    pub fn snapshot(&self) -> ServerSnapshot {
        self.server().state.clone()
    }

    /// Commands that took effect, in order
    pub fn journal(&self) -> Vec<AdminCommand> {
        self.server().journal.clone()
    }

    /// Administrative connections currently open
    pub fn open_sessions(&self) -> usize {
        self.server().open_sessions
    }

    /// Whether `username`/`password` can log in and use `database`
    pub fn authenticate(&self, username: &str, password: &str, database: &str) -> bool {
        let server = self.server();
        let state = &server.state;

        state.users.get(username).map(String::as_str) == Some(password)
            && state.databases.contains(database)
            && state
                .grants
                .get(username)
                .is_some_and(|dbs| dbs.contains(database))
    }
}

impl AdminBackend for MemoryBackend {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession, BackendError> {
        let mut server = self.server();
        if server.refuse_connections {
            return Err(BackendError::new("connection refused"));
        }
        server.open_sessions += 1;

        Ok(MemorySession {
            backend: self.clone(),
        })
    }
}

/// Open connection to a [`MemoryBackend`]
#[derive(Debug)]
pub struct MemorySession {
    backend: MemoryBackend,
}

impl AdminSession for MemorySession {
    async fn execute(&mut self, command: &AdminCommand) -> Result<(), BackendError> {
        self.backend.server().apply(command)
    }

    async fn close(self) {}
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut server = self.backend.server();
        server.open_sessions = server.open_sessions.saturating_sub(1);
    }
}
