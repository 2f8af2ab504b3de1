//! # Identity Derivation
//!
//! Maps an instance identifier to the database name, username and password
//! of that instance. Derivation is a pure function of the identifier, so
//! bind and remove recompute exactly what create produced and no
//! instance record is ever stored.

use std::fmt;

use md5::{Digest, Md5};

/// Number of hex characters kept from the digest
pub const TOKEN_LEN: usize = 8;

/// What a derived token is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Database (schema) name
    Database,
    /// Account name
    User,
    /// Account password
    Password,
}

impl Role {
    /// Tag prepended to the instance identifier before hashing
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Database => "db",
            Self::User => "user",
            Self::Password => "pass",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::User => write!(f, "user"),
            Self::Password => write!(f, "password"),
        }
    }
}

/// Hash a seed into a short lowercase hex token.
///
/// MD5 truncated to 8 hex characters. The digest must stay MD5: every
/// database already provisioned was named with it.
pub fn hashed_value(seed: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(seed.as_bytes());
    let mut token = hex::encode(hasher.finalize());
    token.truncate(TOKEN_LEN);
    token
}

/// Derive the token for one role of an instance
pub fn derive(role: Role, instance_id: &str) -> String {
    hashed_value(&format!("{}{}", role.tag(), instance_id))
}

/// All derived names and secrets of one instance
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedIdentity {
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DerivedIdentity {
    pub fn for_instance(instance_id: &str) -> Self {
        Self {
            database: derive(Role::Database, instance_id),
            username: derive(Role::User, instance_id),
            password: derive(Role::Password, instance_id),
        }
    }
}

impl fmt::Debug for DerivedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedIdentity")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
