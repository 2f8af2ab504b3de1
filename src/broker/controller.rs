//! # Provisioning Controller
//!
//! Instance and binding lifecycle against the backing server.
//!
//! Nothing is persisted. Every operation re-derives the names and password
//! of an instance from its identifier, opens its own administrative
//! connection and closes it before returning. Concurrent calls for the same
//! identifier are serialized only by the backing server's DDL handling.

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use super::backend::{AdminBackend, AdminCommand, AdminSession};
use super::catalog::{mariadb_catalog, Catalog};
use super::config::AdminConfig;
use super::errors::{BrokerError, BrokerResult};
use super::identity::DerivedIdentity;

/// Connection credentials handed out by a bind
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub host: String,
    /// Rendered as a string, as earlier bindings were
    #[serde(serialize_with = "port_as_string")]
    pub port: u16,
    pub database: String,
}

fn port_as_string<S: Serializer>(port: &u16, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(port)
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Host as it appears in a URI authority; IPv6 literals are bracketed
fn uri_host(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Lifecycle controller over one backing server
pub struct ProvisioningController<B> {
    backend: B,
    admin: AdminConfig,
}

impl<B: AdminBackend> ProvisioningController<B> {
    pub fn new(backend: B, admin: AdminConfig) -> Self {
        Self { backend, admin }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The advertised catalog
    pub fn get_catalog(&self) -> &'static Catalog {
        mariadb_catalog()
    }

    /// Create the database and account of an instance.
    ///
    /// Safe to repeat. A failure after the connection is open yields
    /// [`BrokerError::ProvisioningFailed`]; nothing is rolled back.
    pub async fn create_instance(&self, instance_id: &str) -> BrokerResult<()> {
        let identity = DerivedIdentity::for_instance(instance_id);
        let commands = [
            AdminCommand::CreateDatabase {
                database: identity.database.clone(),
            },
            AdminCommand::CreateUser {
                username: identity.username.clone(),
                password: identity.password.clone(),
            },
            AdminCommand::GrantAll {
                database: identity.database.clone(),
                username: identity.username.clone(),
            },
        ];

        match self.run(&commands).await? {
            Ok(()) => {
                info!(
                    instance_id,
                    database = %identity.database,
                    username = %identity.username,
                    "Created instance"
                );
                Ok(())
            }
            Err(reason) => {
                error!(
                    instance_id,
                    database = %identity.database,
                    username = %identity.username,
                    %reason,
                    "Instance creation failed; instance may be partially provisioned"
                );
                Err(BrokerError::ProvisioningFailed {
                    instance_id: instance_id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Drop the database and account of an instance.
    ///
    /// Succeeds when they are already gone.
    pub async fn remove_instance(&self, instance_id: &str) -> BrokerResult<()> {
        let identity = DerivedIdentity::for_instance(instance_id);
        // Database first, so no stage leaves a privileged account behind
        let commands = [
            AdminCommand::DropDatabase {
                database: identity.database.clone(),
            },
            AdminCommand::DropUser {
                username: identity.username.clone(),
            },
        ];

        match self.run(&commands).await? {
            Ok(()) => {
                info!(
                    instance_id,
                    database = %identity.database,
                    username = %identity.username,
                    "Removed instance"
                );
                Ok(())
            }
            Err(reason) => {
                warn!(instance_id, %reason, "Instance removal failed");
                Err(BrokerError::DeprovisioningFailed {
                    instance_id: instance_id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Instance read-back is not offered
    pub async fn get_instance(&self, _instance_id: &str) -> BrokerResult<()> {
        Err(BrokerError::Unimplemented {
            operation: "get_instance",
        })
    }

    /// Reconstruct the credentials of an instance.
    ///
    /// Does not touch the backing server; the instance is trusted to exist.
    pub fn bind(&self, instance_id: &str, binding_id: &str) -> BrokerResult<Credentials> {
        let DerivedIdentity {
            database,
            username,
            password,
        } = DerivedIdentity::for_instance(instance_id);
        let host = self.admin.host.clone();
        let port = self.admin.port;

        info!(instance_id, binding_id, %username, "Issued binding credentials");

        Ok(Credentials {
            uri: format!(
                "mysql://{}:{}@{}:{}/{}",
                username,
                password,
                uri_host(&host),
                port,
                database
            ),
            username,
            password,
            host,
            port,
            database,
        })
    }

    /// Bindings hold no state, so there is nothing to release
    pub fn unbind(&self, instance_id: &str, binding_id: &str) -> BrokerResult<()> {
        info!(instance_id, binding_id, "Released binding");
        Ok(())
    }

    /// Run commands in order on a fresh connection.
    ///
    /// The outer error is a connection failure; the inner one names the
    /// first command that failed. The connection is closed either way.
    async fn run(&self, commands: &[AdminCommand]) -> BrokerResult<Result<(), String>> {
        let mut session = self.backend.open().await.map_err(|e| {
            warn!(error = %e, "Cannot open administrative connection");
            BrokerError::ConnectionFailed { message: e.message }
        })?;

        let mut outcome = Ok(());
        for command in commands {
            info!(command = %command.describe(), "Executing");
            if let Err(e) = session.execute(command).await {
                outcome = Err(format!("{}: {}", command.describe(), e));
                break;
            }
        }

        session.close().await;
        Ok(outcome)
    }
}
