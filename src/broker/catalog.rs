//! # Service Catalog
//!
//! The one service and plan this broker advertises. Constant for the
//! process lifetime.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{BrokerError, BrokerResult};

pub const SERVICE_ID: Uuid = Uuid::from_u128(0x3533e2f0_6335_4a4e_9d15_d7c0b90b75b5);
pub const PLAN_ID: Uuid = Uuid::from_u128(0xb9600ecb_d511_4621_b450_a0fa1738e632);

/// Broker catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

/// An offered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub id: Uuid,
    pub description: String,
    /// Whether instances of this service can be bound
    pub bindable: bool,
    pub plans: Vec<ServicePlan>,
}

/// A plan of an offered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub name: String,
    pub id: Uuid,
    pub description: String,
    pub free: bool,
}

impl Catalog {
    /// Find a service by ID
    pub fn find_service(&self, service_id: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.id.to_string().eq_ignore_ascii_case(service_id))
    }

    /// Resolve a service/plan pair, rejecting anything not advertised
    pub fn find_plan(&self, service_id: &str, plan_id: &str) -> BrokerResult<&ServicePlan> {
        let service = self
            .find_service(service_id)
            .ok_or_else(|| BrokerError::UnknownService {
                service_id: service_id.to_string(),
            })?;

        service
            .plans
            .iter()
            .find(|p| p.id.to_string().eq_ignore_ascii_case(plan_id))
            .ok_or_else(|| BrokerError::UnknownPlan {
                service_id: service_id.to_string(),
                plan_id: plan_id.to_string(),
            })
    }
}

/// The MariaDB catalog
pub fn mariadb_catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| Catalog {
        services: vec![Service {
            name: "mariadb".to_string(),
            id: SERVICE_ID,
            description: "MariaDB database".to_string(),
            bindable: true,
            plans: vec![ServicePlan {
                name: "default".to_string(),
                id: PLAN_ID,
                description: "MariaDB database".to_string(),
                free: true,
            }],
        }],
    })
}
