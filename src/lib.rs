//! mariadb-broker - A stateless service broker for MariaDB databases
//!
//! Provisions an isolated database and account per service instance on a
//! shared MariaDB server. Names and passwords are derived from the instance
//! identifier, so the broker stores nothing.

pub mod broker;
pub mod cli;
pub mod config_validator;
pub mod http_server;
pub mod observability;
