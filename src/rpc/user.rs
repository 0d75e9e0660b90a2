//! UserService RPC contract. The service itself runs elsewhere; the gateway only
//! forwards to it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{rpc_path, RpcStatus};

pub const USER_SERVICE_NAME: &str = "smarthome.user.v1.UserService";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteUserRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteUserResponse {
    pub success: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRpc: Send + Sync {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserMessage, RpcStatus>;

    async fn get_user(&self, request: GetUserRequest) -> Result<UserMessage, RpcStatus>;

    async fn update_user(&self, request: UpdateUserRequest) -> Result<UserMessage, RpcStatus>;

    async fn delete_user(
        &self,
        request: DeleteUserRequest,
    ) -> Result<DeleteUserResponse, RpcStatus>;
}

/// RPC path of one UserService method
pub fn user_method_path(method: &str) -> String {
    rpc_path(USER_SERVICE_NAME, method)
}
