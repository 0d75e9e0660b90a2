use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::de::DeserializeOwned;

use super::GatewayState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::rpc::{
    CreateDeviceRequest, DeviceMessage, GetDeviceRequest, ListDevicesRequest, ListDevicesResponse,
    UpdateDeviceStateRequest,
};

const DEVICE_NOT_FOUND: &str = "Device not found";

pub(super) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::invalid_json("Invalid request body")
    })
}

pub(super) fn caller(user: &Option<Extension<AuthUser>>) -> &str {
    user.as_ref().map(|Extension(u)| u.user_id.as_str()).unwrap_or("-")
}

/// GET /api/v1/devices - list a user's devices.
/// The JSON body carries the filter; an empty body falls back to the query string,
/// which must then name a `user_id`.
pub async fn list_devices(
    State(state): State<GatewayState>,
    user: Option<Extension<AuthUser>>,
    query: Result<Query<ListDevicesRequest>, QueryRejection>,
    body: Bytes,
) -> ApiResult<ListDevicesResponse> {
    let request: ListDevicesRequest = if body.is_empty() {
        let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
        // No body and no filter in the query: nothing usable to forward
        if params.user_id.is_empty() {
            return Err(ApiError::invalid_json("Invalid request body"));
        }
        params
    } else {
        parse_body(&body)?
    };

    tracing::debug!(
        caller = %caller(&user),
        user_id = %request.user_id,
        page = request.page,
        page_size = request.page_size,
        "List devices"
    );

    let page = state
        .devices
        .list_devices(request)
        .await
        .map_err(|status| ApiError::from_rpc(status, DEVICE_NOT_FOUND, "Failed to list devices"))?;

    Ok(ApiResponse::success(page))
}

/// POST /api/v1/devices - register a device
pub async fn create_device(
    State(state): State<GatewayState>,
    user: Option<Extension<AuthUser>>,
    body: Bytes,
) -> ApiResult<DeviceMessage> {
    let request: CreateDeviceRequest = parse_body(&body)?;
    tracing::debug!(caller = %caller(&user), user_id = %request.user_id, "Create device");

    let device = state
        .devices
        .create_device(request)
        .await
        .map_err(|status| ApiError::from_rpc(status, DEVICE_NOT_FOUND, "Failed to create device"))?;

    tracing::info!(device_id = %device.id, "Device created");
    Ok(ApiResponse::success(device))
}

/// GET /api/v1/devices/:id
pub async fn get_device(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<DeviceMessage> {
    let device = state
        .devices
        .get_device(GetDeviceRequest { id })
        .await
        .map_err(|status| ApiError::from_rpc(status, DEVICE_NOT_FOUND, "Failed to get device"))?;

    Ok(ApiResponse::success(device))
}

/// PUT /api/v1/devices/:id - body `{"state": "..."}`; the id always comes from the path
pub async fn update_device(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<DeviceMessage> {
    let mut request: UpdateDeviceStateRequest = parse_body(&body)?;
    request.id = id;

    let device = state
        .devices
        .update_device_state(request)
        .await
        .map_err(|status| ApiError::from_rpc(status, DEVICE_NOT_FOUND, "Failed to update device"))?;

    tracing::info!(device_id = %device.id, state = %device.state, "Device state updated");
    Ok(ApiResponse::success(device))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
