//! # Administrative Backend
//!
//! The command surface the controller issues against the backing server,
//! and the traits a backing server implementation provides.
//!
//! Every command is idempotent: replaying a command that already took
//! effect is a no-op on the backing server.

use std::fmt;
use std::future::Future;

use thiserror::Error;

/// An administrative command
#[derive(Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Create the database unless it already exists
    CreateDatabase { database: String },
    /// Create the account unless it exists, then set its password
    CreateUser { username: String, password: String },
    /// Grant every privilege on one database and nothing else
    GrantAll { database: String, username: String },
    /// Drop the database if it exists
    DropDatabase { database: String },
    /// Drop the account if it exists
    DropUser { username: String },
}

/// Kind of an [`AdminCommand`], without its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateDatabase,
    CreateUser,
    GrantAll,
    DropDatabase,
    DropUser,
}

impl AdminCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::CreateDatabase { .. } => CommandKind::CreateDatabase,
            Self::CreateUser { .. } => CommandKind::CreateUser,
            Self::GrantAll { .. } => CommandKind::GrantAll,
            Self::DropDatabase { .. } => CommandKind::DropDatabase,
            Self::DropUser { .. } => CommandKind::DropUser,
        }
    }

    /// Human readable form, safe to log (never includes the password)
    pub fn describe(&self) -> String {
        match self {
            Self::CreateDatabase { database } => format!("create database {}", database),
            Self::CreateUser { username, .. } => format!("create user {}", username),
            Self::GrantAll { database, username } => {
                format!("grant all on {} to {}", database, username)
            }
            Self::DropDatabase { database } => format!("drop database {}", database),
            Self::DropUser { username } => format!("drop user {}", username),
        }
    }
}

impl fmt::Debug for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminCommand({})", self.describe())
    }
}

/// Failure reported by the backing server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A backing database server reachable with administrative credentials
pub trait AdminBackend: Send + Sync {
    /// Open administrative connection
    type Session: AdminSession;

    /// Open a fresh administrative connection.
    ///
    /// Called once per lifecycle operation.
    fn open(&self) -> impl Future<Output = Result<Self::Session, BackendError>> + Send;
}

/// One open administrative connection
pub trait AdminSession: Send {
    /// Execute one command
    fn execute(
        &mut self,
        command: &AdminCommand,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Release the connection
    fn close(self) -> impl Future<Output = ()> + Send;
}
