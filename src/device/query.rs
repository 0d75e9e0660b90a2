use std::sync::Arc;

use crate::device::error::DeviceResult;
use crate::device::model::Device;
use crate::device::repository::QueryDeviceRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceQuery {
    pub id: String,
}

pub struct GetDeviceHandler {
    repository: Arc<dyn QueryDeviceRepository>,
}

impl GetDeviceHandler {
    pub fn new(repository: Arc<dyn QueryDeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetDeviceQuery) -> DeviceResult<Device> {
        self.repository.get_device(&query.id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDevicesQuery {
    pub user_id: String,
    /// 1-based
    pub page: i32,
    pub page_size: i32,
}

/// A page of devices together with the owner's total device count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePage {
    pub devices: Vec<Device>,
    pub total: i64,
}

pub struct ListDevicesHandler {
    repository: Arc<dyn QueryDeviceRepository>,
}

impl ListDevicesHandler {
    pub fn new(repository: Arc<dyn QueryDeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: ListDevicesQuery) -> DeviceResult<DevicePage> {
        let (devices, total) = self
            .repository
            .list_devices(&query.user_id, query.page, query.page_size)
            .await?;
        Ok(DevicePage { devices, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::error::DeviceError;
    use crate::device::repository::MockQueryDeviceRepository;
    use chrono::Utc;

    #[tokio::test]
    async fn get_passes_not_found_through() {
        let mut repo = MockQueryDeviceRepository::new();
        repo.expect_get_device()
            .withf(|id| id == "device123")
            .times(1)
            .return_once(|id| Err(DeviceError::not_found(id)));

        let handler = GetDeviceHandler::new(Arc::new(repo));
        let result = handler.handle(GetDeviceQuery { id: "device123".to_string() }).await;

        assert!(matches!(result, Err(DeviceError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_returns_items_with_total() {
        let devices = vec![
            Device::new("Device 1", "Sensor", "user123", Utc::now()),
            Device::new("Device 2", "Actuator", "user123", Utc::now()),
        ];
        let expected = devices.clone();

        let mut repo = MockQueryDeviceRepository::new();
        repo.expect_list_devices()
            .withf(|user_id, page, page_size| {
                user_id == "user123" && *page == 1 && *page_size == 10
            })
            .times(1)
            .return_once(move |_, _, _| Ok((devices, 12)));

        let handler = ListDevicesHandler::new(Arc::new(repo));
        let page = handler
            .handle(ListDevicesQuery {
                user_id: "user123".to_string(),
                page: 1,
                page_size: 10,
            })
            .await
            .unwrap();

        assert_eq!(page.devices, expected);
        assert_eq!(page.total, 12);
    }
}
