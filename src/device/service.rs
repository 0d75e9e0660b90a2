use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::device::command::{
    CreateDeviceCommand, CreateDeviceHandler, UpdateDeviceStateCommand, UpdateDeviceStateHandler,
};
use crate::device::query::{GetDeviceHandler, GetDeviceQuery, ListDevicesHandler, ListDevicesQuery};
use crate::device::repository::{CommandDeviceRepository, QueryDeviceRepository};
use crate::rpc::{
    CreateDeviceRequest, DeviceMessage, DeviceRpc, GetDeviceRequest, ListDevicesRequest,
    ListDevicesResponse, RpcStatus, UpdateDeviceStateRequest,
};

/// RPC-facing façade over the device command and query handlers.
/// Handles message mapping and error conversion; no business rules live here.
pub struct DeviceService {
    create_device: CreateDeviceHandler,
    update_device_state: UpdateDeviceStateHandler,
    get_device: GetDeviceHandler,
    list_devices: ListDevicesHandler,
}

impl DeviceService {
    /// The two capabilities may be served by the same repository or by different ones
    pub fn new(
        commands: Arc<dyn CommandDeviceRepository>,
        queries: Arc<dyn QueryDeviceRepository>,
    ) -> Self {
        Self {
            create_device: CreateDeviceHandler::new(commands.clone()),
            update_device_state: UpdateDeviceStateHandler::new(commands),
            get_device: GetDeviceHandler::new(queries.clone()),
            list_devices: ListDevicesHandler::new(queries),
        }
    }
}

#[async_trait]
impl DeviceRpc for DeviceService {
    async fn create_device(
        &self,
        request: CreateDeviceRequest,
    ) -> Result<DeviceMessage, RpcStatus> {
        debug!(user_id = %request.user_id, name = %request.name, "Received CreateDevice request");

        let device = self
            .create_device
            .handle(CreateDeviceCommand {
                name: request.name,
                device_type: request.device_type,
                user_id: request.user_id,
            })
            .await?;

        info!(device_id = %device.id, "Device created successfully");
        Ok(device.into())
    }

    async fn get_device(&self, request: GetDeviceRequest) -> Result<DeviceMessage, RpcStatus> {
        debug!(device_id = %request.id, "Received GetDevice request");

        let device = self.get_device.handle(GetDeviceQuery { id: request.id }).await?;
        Ok(device.into())
    }

    async fn update_device_state(
        &self,
        request: UpdateDeviceStateRequest,
    ) -> Result<DeviceMessage, RpcStatus> {
        debug!(
            device_id = %request.id,
            state = %request.state,
            "Received UpdateDeviceState request"
        );

        let device = self
            .update_device_state
            .handle(UpdateDeviceStateCommand {
                id: request.id,
                state: request.state,
            })
            .await?;

        info!(device_id = %device.id, state = %device.state, "Device state updated");
        Ok(device.into())
    }

    async fn list_devices(
        &self,
        request: ListDevicesRequest,
    ) -> Result<ListDevicesResponse, RpcStatus> {
        debug!(
            user_id = %request.user_id,
            page = request.page,
            page_size = request.page_size,
            "Received ListDevices request"
        );

        let page = self
            .list_devices
            .handle(ListDevicesQuery {
                user_id: request.user_id,
                page: request.page,
                page_size: request.page_size,
            })
            .await?;

        info!(count = page.devices.len(), total = page.total, "Listed devices");
        Ok(ListDevicesResponse {
            devices: page.devices.into_iter().map(DeviceMessage::from).collect(),
            total: i32::try_from(page.total).unwrap_or(i32::MAX),
        })
    }
}
