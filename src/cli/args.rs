//! CLI argument definitions using clap
//!
//! Commands:
//! - mariadb-broker serve [--config <path>] [--port <port>] [--backend <mysql|memory>]
//! - mariadb-broker catalog
//! - mariadb-broker derive <instance-id> [--show-password]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::observability::LogFormat;

/// MariaDB service broker
#[derive(Parser, Debug)]
#[command(name = "mariadb-broker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Backing server implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// MariaDB/MySQL server from the admin configuration
    Mysql,
    /// In-process server, state lost on exit (development only)
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the broker API
    ///
    /// Admin connection settings come from the config file, overridden by
    /// MARIADB_HOST, MARIADB_PORT, MARIADB_USER and MARIADB_PASS.
    Serve {
        /// Path to TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to bind to (overrides the config file)
        #[arg(long)]
        port: Option<u16>,

        /// Backing server to provision on
        #[arg(long, value_enum, default_value = "mysql")]
        backend: BackendKind,

        /// Log output format (overrides the config file)
        #[arg(long, value_enum)]
        log_format: Option<LogFormat>,
    },

    /// Print the service catalog as JSON
    Catalog,

    /// Print the database and account names derived for an instance
    Derive {
        /// Instance identifier
        instance_id: String,

        /// Also print the derived password
        #[arg(long)]
        show_password: bool,
    },
}
