//! # Broker Routes
//!
//! Open Service Broker v2 endpoints over the provisioning controller.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::HaltSignal;
use crate::broker::{AdminBackend, BrokerError, Credentials, ErrorResponse, ProvisioningController};

/// Shared route state
pub struct BrokerState<B> {
    controller: Arc<ProvisioningController<B>>,
    halt: HaltSignal,
}

impl<B> BrokerState<B> {
    pub fn new(controller: Arc<ProvisioningController<B>>, halt: HaltSignal) -> Self {
        Self { controller, halt }
    }

    pub fn controller(&self) -> &ProvisioningController<B> {
        &self.controller
    }

    pub fn halt(&self) -> &HaltSignal {
        &self.halt
    }
}

/// Provision request body
#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub service_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: Option<String>,
    #[serde(default)]
    pub space_guid: Option<String>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Bind request body
#[derive(Debug, Deserialize)]
pub struct BindRequest {
    pub service_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub app_guid: Option<String>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Bind response body
#[derive(Debug, Serialize)]
pub struct BindResponse {
    pub credentials: Credentials,
}

/// Build broker routes
pub fn broker_routes<B: AdminBackend + 'static>(state: Arc<BrokerState<B>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v2/catalog", get(get_catalog::<B>))
        .route(
            "/v2/service_instances/:instance_id",
            put(create_instance::<B>)
                .get(get_instance::<B>)
                .delete(remove_instance::<B>),
        )
        .route(
            "/v2/service_instances/:instance_id/service_bindings/:binding_id",
            put(bind::<B>).delete(unbind::<B>),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn get_catalog<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.get_catalog()))
}

/// Provision an instance
async fn create_instance<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
    Path(instance_id): Path<String>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&state, invalid_body(rejection)),
    };

    if let Err(e) = state
        .controller
        .get_catalog()
        .find_plan(&request.service_id, &request.plan_id)
    {
        return error_response(&state, e);
    }

    match state.controller.create_instance(&instance_id).await {
        Ok(()) => (StatusCode::CREATED, Json(json!({}))).into_response(),
        Err(e) => error_response(&state, e),
    }
}

/// Instance read-back (unsupported)
async fn get_instance<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
    Path(instance_id): Path<String>,
) -> Response {
    match state.controller.get_instance(&instance_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(e) => error_response(&state, e),
    }
}

/// Deprovision an instance
async fn remove_instance<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
    Path(instance_id): Path<String>,
) -> Response {
    match state.controller.remove_instance(&instance_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(e) => error_response(&state, e),
    }
}

/// Issue credentials for an instance
async fn bind<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    body: Result<Json<BindRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&state, invalid_body(rejection)),
    };

    if let Err(e) = state
        .controller
        .get_catalog()
        .find_plan(&request.service_id, &request.plan_id)
    {
        return error_response(&state, e);
    }

    match state.controller.bind(&instance_id, &binding_id) {
        Ok(credentials) => {
            (StatusCode::CREATED, Json(BindResponse { credentials })).into_response()
        }
        Err(e) => error_response(&state, e),
    }
}

/// Release a binding
async fn unbind<B: AdminBackend + 'static>(
    State(state): State<Arc<BrokerState<B>>>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> Response {
    match state.controller.unbind(&instance_id, &binding_id) {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(e) => error_response(&state, e),
    }
}

fn invalid_body(rejection: JsonRejection) -> BrokerError {
    BrokerError::InvalidRequest {
        message: rejection.body_text(),
    }
}

/// Convert error to HTTP response, tripping the halt latch on fatal errors
fn error_response<B>(state: &BrokerState<B>, err: BrokerError) -> Response {
    state.halt.report(&err);

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}
