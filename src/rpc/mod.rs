pub mod client;
pub mod messages;
pub mod server;
pub mod status;
pub mod user;

use async_trait::async_trait;

pub use client::{DeviceRpcClient, UserRpcClient};
pub use messages::{
    CreateDeviceRequest, DeviceMessage, GetDeviceRequest, ListDevicesRequest, ListDevicesResponse,
    UpdateDeviceStateRequest,
};
pub use status::{RpcCode, RpcStatus};
pub use user::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, UpdateUserRequest,
    UserMessage, UserRpc, USER_SERVICE_NAME,
};
#[cfg(test)]
pub use user::MockUserRpc;

/// Fully qualified service name, used as the RPC path prefix
pub const DEVICE_SERVICE_NAME: &str = "smarthome.device.v1.DeviceService";

/// The DeviceService RPC contract. Implemented by the service itself and by the
/// network client the gateway uses, so either can sit behind the gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRpc: Send + Sync {
    async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceMessage, RpcStatus>;

    async fn get_device(&self, request: GetDeviceRequest) -> Result<DeviceMessage, RpcStatus>;

    async fn update_device_state(
        &self,
        request: UpdateDeviceStateRequest,
    ) -> Result<DeviceMessage, RpcStatus>;

    async fn list_devices(
        &self,
        request: ListDevicesRequest,
    ) -> Result<ListDevicesResponse, RpcStatus>;
}

/// `/rpc/<service>/<method>`
pub fn rpc_path(service: &str, method: &str) -> String {
    format!("/rpc/{}/{}", service, method)
}

/// RPC path of one DeviceService method
pub fn method_path(method: &str) -> String {
    rpc_path(DEVICE_SERVICE_NAME, method)
}
