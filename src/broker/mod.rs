//! # Broker Module
//!
//! Provisions isolated MariaDB databases for service instances without
//! keeping any state of its own.
//!
//! ## Components
//!
//! - `identity`: Deterministic database/user/password derivation
//! - `catalog`: Advertised service and plan
//! - `controller`: Instance and binding lifecycle
//! - `backend`: Administrative command surface and backend traits
//! - `mysql`: MariaDB backend over sqlx
//! - `memory`: In-process backend for development and tests
//! - `config`: Administrative connection and server settings
//! - `errors`: Broker errors
//!
//! ## Instance Lifecycle
//!
//! An instance is either absent or provisioned. `create_instance` and
//! `remove_instance` move between the two and are idempotent in both
//! directions. Bindings have no state of their own.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod errors;
pub mod identity;
pub mod memory;
pub mod mysql;

pub use backend::*;
pub use catalog::*;
pub use config::*;
pub use controller::*;
pub use errors::*;
pub use identity::*;
pub use memory::*;
pub use mysql::*;
