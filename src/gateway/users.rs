//! `/api/v1/users` handlers, forwarded to the external UserService

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde_json::json;

use super::handlers::{caller, parse_body};
use super::GatewayState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::rpc::{
    CreateUserRequest, DeleteUserRequest, GetUserRequest, UpdateUserRequest, UserMessage,
};

const USER_NOT_FOUND: &str = "User not found";

/// POST /api/v1/users - 201 with the created user
pub async fn create_user(
    State(state): State<GatewayState>,
    user: Option<Extension<AuthUser>>,
    body: Bytes,
) -> ApiResult<UserMessage> {
    let request: CreateUserRequest = parse_body(&body)?;
    tracing::debug!(caller = %caller(&user), email = %request.email, "Create user");

    let created = state
        .users
        .create_user(request)
        .await
        .map_err(|status| ApiError::from_rpc(status, USER_NOT_FOUND, "Failed to create user"))?;

    tracing::info!(user_id = %created.id, "User created");
    Ok(ApiResponse::created(created))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<UserMessage> {
    let user = state
        .users
        .get_user(GetUserRequest { id })
        .await
        .map_err(|status| ApiError::from_rpc(status, USER_NOT_FOUND, "Failed to get user"))?;

    Ok(ApiResponse::success(user))
}

/// PUT /api/v1/users/:id - the id always comes from the path
pub async fn update_user(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<UserMessage> {
    let mut request: UpdateUserRequest = parse_body(&body)?;
    request.id = id;

    let user = state
        .users
        .update_user(request)
        .await
        .map_err(|status| ApiError::from_rpc(status, USER_NOT_FOUND, "Failed to update user"))?;

    tracing::info!(user_id = %user.id, "User updated");
    Ok(ApiResponse::success(user))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    state
        .users
        .delete_user(DeleteUserRequest { id: id.clone() })
        .await
        .map_err(|status| ApiError::from_rpc(status, USER_NOT_FOUND, "Failed to delete user"))?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(ApiResponse::success(json!({ "message": "User deleted successfully" })))
}
