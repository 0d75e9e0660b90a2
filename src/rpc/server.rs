use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::rpc::{method_path, user::user_method_path, DeviceRpc, RpcStatus, UserRpc};

type SharedRpc = Arc<dyn DeviceRpc>;
type SharedUserRpc = Arc<dyn UserRpc>;

impl IntoResponse for RpcStatus {
    fn into_response(self) -> Response {
        (self.code.transport_status(), Json(self)).into_response()
    }
}

/// HTTP/JSON transport for the DeviceService: one POST route per method.
/// `health` is checked by `/health`.
pub fn router<H, F>(service: SharedRpc, health: H) -> Router
where
    H: Fn() -> F + Clone + Send + Sync + 'static,
    F: std::future::Future<Output = Result<(), String>> + Send + 'static,
{
    Router::new()
        .route(&method_path("CreateDevice"), post(create_device))
        .route(&method_path("GetDevice"), post(get_device))
        .route(&method_path("UpdateDeviceState"), post(update_device_state))
        .route(&method_path("ListDevices"), post(list_devices))
        .with_state(service)
        .route("/health", get(move || health_check(health.clone())))
        .layer(TraceLayer::new_for_http())
}

/// The same transport for a UserService implementation, as spoken by `UserRpcClient`
pub fn user_router(service: SharedUserRpc) -> Router {
    Router::new()
        .route(&user_method_path("CreateUser"), post(create_user))
        .route(&user_method_path("GetUser"), post(get_user))
        .route(&user_method_path("UpdateUser"), post(update_user))
        .route(&user_method_path("DeleteUser"), post(delete_user))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, RpcStatus> {
    serde_json::from_slice(body)
        .map_err(|e| RpcStatus::invalid_argument(format!("invalid request message: {}", e)))
}

fn reply<T: Serialize>(result: Result<T, RpcStatus>) -> Response {
    match result {
        Ok(message) => Json(message).into_response(),
        Err(status) => status.into_response(),
    }
}

async fn create_device(State(service): State<SharedRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.create_device(request).await),
        Err(status) => status.into_response(),
    }
}

async fn get_device(State(service): State<SharedRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.get_device(request).await),
        Err(status) => status.into_response(),
    }
}

async fn update_device_state(State(service): State<SharedRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.update_device_state(request).await),
        Err(status) => status.into_response(),
    }
}

async fn list_devices(State(service): State<SharedRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.list_devices(request).await),
        Err(status) => status.into_response(),
    }
}

async fn create_user(State(service): State<SharedUserRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.create_user(request).await),
        Err(status) => status.into_response(),
    }
}

async fn get_user(State(service): State<SharedUserRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.get_user(request).await),
        Err(status) => status.into_response(),
    }
}

async fn update_user(State(service): State<SharedUserRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.update_user(request).await),
        Err(status) => status.into_response(),
    }
}

async fn delete_user(State(service): State<SharedUserRpc>, body: Bytes) -> Response {
    match decode(&body) {
        Ok(request) => reply(service.delete_user(request).await),
        Err(status) => status.into_response(),
    }
}

async fn health_check<H, F>(health: H) -> Response
where
    H: Fn() -> F,
    F: std::future::Future<Output = Result<(), String>>,
{
    let now = chrono::Utc::now();
    match health().await {
        Ok(()) => Json(json!({
            "success": true,
            "data": { "status": "ok", "timestamp": now }
        }))
        .into_response(),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": { "status": "degraded", "timestamp": now, "store_error": e }
            })),
        )
            .into_response(),
    }
}
