//! # MariaDB Backend
//!
//! Executes administrative commands on a MariaDB (or MySQL) server over a
//! dedicated connection opened for each lifecycle operation.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

use super::backend::{AdminBackend, AdminCommand, AdminSession, BackendError};
use super::config::AdminConfig;

/// Quote an identifier with backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a string literal.
///
/// Assumes backslash escapes are enabled (no `NO_BACKSLASH_ESCAPES` in
/// `sql_mode`); configured account hosts are validated to contain no
/// backslashes or quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

fn account(username: &str, user_host: &str) -> String {
    format!("{}@{}", quote_identifier(username), quote_literal(user_host))
}

/// SQL statements implementing one command, in execution order
pub fn render_statements(command: &AdminCommand, user_host: &str) -> Vec<String> {
    match command {
        AdminCommand::CreateDatabase { database } => {
            vec![format!(
                "CREATE DATABASE IF NOT EXISTS {}",
                quote_identifier(database)
            )]
        }
        AdminCommand::CreateUser { username, password } => {
            let account = account(username, user_host);
            let password = quote_literal(password);
            // ALTER re-asserts the password when the account already existed
            vec![
                format!("CREATE USER IF NOT EXISTS {} IDENTIFIED BY {}", account, password),
                format!("ALTER USER {} IDENTIFIED BY {}", account, password),
            ]
        }
        AdminCommand::GrantAll { database, username } => {
            vec![format!(
                "GRANT ALL PRIVILEGES ON {}.* TO {}",
                quote_identifier(database),
                account(username, user_host)
            )]
        }
        AdminCommand::DropDatabase { database } => {
            vec![format!(
                "DROP DATABASE IF EXISTS {}",
                quote_identifier(database)
            )]
        }
        AdminCommand::DropUser { username } => {
            vec![format!("DROP USER IF EXISTS {}", account(username, user_host))]
        }
    }
}

/// Administrative access to a MariaDB server
#[derive(Clone)]
pub struct MySqlAdmin {
    options: MySqlConnectOptions,
    user_host: String,
    connect_timeout: Duration,
}

impl MySqlAdmin {
    pub fn new(config: &AdminConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password);

        Self {
            options,
            user_host: config.user_host.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl AdminBackend for MySqlAdmin {
    type Session = MySqlSession;

    async fn open(&self) -> Result<MySqlSession, BackendError> {
        let conn = tokio::time::timeout(
            self.connect_timeout,
            MySqlConnection::connect_with(&self.options),
        )
        .await
        .map_err(|_| {
            BackendError::new(format!(
                "timed out after {}s",
                self.connect_timeout.as_secs()
            ))
        })?
        .map_err(|e| BackendError::new(e.to_string()))?;

        Ok(MySqlSession {
            conn,
            user_host: self.user_host.clone(),
        })
    }
}

/// Open administrative connection to a MariaDB server
pub struct MySqlSession {
    conn: MySqlConnection,
    user_host: String,
}

impl AdminSession for MySqlSession {
    async fn execute(&mut self, command: &AdminCommand) -> Result<(), BackendError> {
        for statement in render_statements(command, &self.user_host) {
            // Executor::execute returns a boxed Send future
            (&mut self.conn)
                .execute(sqlx::raw_sql(&statement))
                .await
                .map_err(|e| BackendError::new(e.to_string()))?;
        }
        Ok(())
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(error = %e, "Failed to close administrative connection cleanly");
        }
    }
}
