use async_trait::async_trait;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::rpc::{
    rpc_path, CreateDeviceRequest, CreateUserRequest, DeleteUserRequest, DeleteUserResponse,
    DeviceMessage, DeviceRpc, GetDeviceRequest, GetUserRequest, ListDevicesRequest,
    ListDevicesResponse, RpcCode, RpcStatus, UpdateDeviceStateRequest, UpdateUserRequest,
    UserMessage, UserRpc, DEVICE_SERVICE_NAME, USER_SERVICE_NAME,
};

/// HTTP/JSON transport to one remote service.
///
/// No per-call timeout is configured: a call lives as long as the caller's future.
#[derive(Clone, Debug)]
struct Transport {
    http: reqwest::Client,
    base_url: Url,
    service: &'static str,
}

impl Transport {
    fn new(base_url: &str, service: &'static str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid {} URL '{}': {}", service, base_url, e))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("{} URL must be http or https, got '{}'", service, base_url.scheme());
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            service,
        })
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, RpcStatus>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(&rpc_path(self.service, method))
            .map_err(|e| RpcStatus::internal(format!("cannot build RPC URL: {}", e)))?;

        let response = self.http.post(url).json(request).send().await.map_err(|e| {
            tracing::warn!(
                service = %self.service,
                method = %method,
                error = %e,
                "Backend unreachable"
            );
            RpcStatus::unavailable(format!("{} unreachable: {}", self.service, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Resp>().await.map_err(|e| {
                RpcStatus::internal(format!("invalid response from {}: {}", self.service, e))
            });
        }

        let code = RpcCode::from_transport_status(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        );
        let body = response.text().await.unwrap_or_default();
        Err(serde_json::from_str::<RpcStatus>(&body).unwrap_or_else(|_| RpcStatus::new(code, body)))
    }
}

/// Network client for a remote DeviceService
#[derive(Clone, Debug)]
pub struct DeviceRpcClient {
    transport: Transport,
}

impl DeviceRpcClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url, DEVICE_SERVICE_NAME)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.transport.base_url
    }
}

#[async_trait]
impl DeviceRpc for DeviceRpcClient {
    async fn create_device(
        &self,
        request: CreateDeviceRequest,
    ) -> Result<DeviceMessage, RpcStatus> {
        self.transport.call("CreateDevice", &request).await
    }

    async fn get_device(&self, request: GetDeviceRequest) -> Result<DeviceMessage, RpcStatus> {
        self.transport.call("GetDevice", &request).await
    }

    async fn update_device_state(
        &self,
        request: UpdateDeviceStateRequest,
    ) -> Result<DeviceMessage, RpcStatus> {
        self.transport.call("UpdateDeviceState", &request).await
    }

    async fn list_devices(
        &self,
        request: ListDevicesRequest,
    ) -> Result<ListDevicesResponse, RpcStatus> {
        self.transport.call("ListDevices", &request).await
    }
}

/// Network client for the external UserService
#[derive(Clone, Debug)]
pub struct UserRpcClient {
    transport: Transport,
}

impl UserRpcClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url, USER_SERVICE_NAME)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.transport.base_url
    }
}

#[async_trait]
impl UserRpc for UserRpcClient {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserMessage, RpcStatus> {
        self.transport.call("CreateUser", &request).await
    }

    async fn get_user(&self, request: GetUserRequest) -> Result<UserMessage, RpcStatus> {
        self.transport.call("GetUser", &request).await
    }

    async fn update_user(&self, request: UpdateUserRequest) -> Result<UserMessage, RpcStatus> {
        self.transport.call("UpdateUser", &request).await
    }

    async fn delete_user(
        &self,
        request: DeleteUserRequest,
    ) -> Result<DeleteUserResponse, RpcStatus> {
        self.transport.call("DeleteUser", &request).await
    }
}
