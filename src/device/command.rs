use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::device::error::DeviceResult;
use crate::device::model::Device;
use crate::device::repository::CommandDeviceRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeviceCommand {
    pub name: String,
    pub device_type: String,
    pub user_id: String,
}

/// Creates devices in their initial `off` state
pub struct CreateDeviceHandler {
    repository: Arc<dyn CommandDeviceRepository>,
}

impl CreateDeviceHandler {
    pub fn new(repository: Arc<dyn CommandDeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, command: CreateDeviceCommand) -> DeviceResult<Device> {
        debug!(user_id = %command.user_id, name = %command.name, "Creating device");

        let device = Device::new(command.name, command.device_type, command.user_id, Utc::now());
        self.repository.create_device(device).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeviceStateCommand {
    pub id: String,
    pub state: String,
}

/// Sets a device's state. Any string is accepted; there is no transition table.
pub struct UpdateDeviceStateHandler {
    repository: Arc<dyn CommandDeviceRepository>,
}

impl UpdateDeviceStateHandler {
    pub fn new(repository: Arc<dyn CommandDeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, command: UpdateDeviceStateCommand) -> DeviceResult<Device> {
        debug!(device_id = %command.id, state = %command.state, "Updating device state");
        self.repository.update_device_state(&command.id, &command.state).await
    }
}
