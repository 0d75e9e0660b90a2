use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::device::error::DeviceResult;
use crate::device::model::{Device, PageWindow};
use crate::device::repository::{
    CommandDeviceRepository, MirrorObserver, QueryDeviceRepository, ReadStore,
    SystemOfRecordStore, TracingMirrorObserver,
};
use crate::types::MirrorOperation;

/// Device repository spanning the system of record and the read store.
///
/// Writes go to the system of record first and fail if it fails. The result is then
/// copied into the read store on a best-effort basis: a mirror failure is handed to the
/// [`MirrorObserver`] and the write is still reported as successful. Reads are served by
/// the read store alone, so a device may be missing or stale there right after a write.
pub struct CombinedRepository {
    system_of_record: Arc<dyn SystemOfRecordStore>,
    read_store: Arc<dyn ReadStore>,
    observer: Arc<dyn MirrorObserver>,
}

impl CombinedRepository {
    pub fn new(
        system_of_record: Arc<dyn SystemOfRecordStore>,
        read_store: Arc<dyn ReadStore>,
    ) -> Self {
        Self {
            system_of_record,
            read_store,
            observer: Arc::new(TracingMirrorObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MirrorObserver>) -> Self {
        self.observer = observer;
        self
    }

    async fn mirror(&self, operation: MirrorOperation, device: &Device) {
        let result = match operation {
            MirrorOperation::Create => self.read_store.put_device(device).await,
            MirrorOperation::UpdateState => self.read_store.set_state(device).await,
        };

        match result {
            Ok(()) => debug!(
                operation = %operation,
                device_id = %device.id,
                "Mirrored device to read store"
            ),
            Err(err) => self.observer.mirror_failed(operation, &device.id, &err),
        }
    }
}

#[async_trait]
impl CommandDeviceRepository for CombinedRepository {
    async fn create_device(&self, device: Device) -> DeviceResult<Device> {
        let created = self.system_of_record.insert_device(device).await?;
        info!(
            device_id = %created.id,
            user_id = %created.user_id,
            "Device written to system of record"
        );

        self.mirror(MirrorOperation::Create, &created).await;
        Ok(created)
    }

    async fn update_device_state(&self, id: &str, state: &str) -> DeviceResult<Device> {
        let updated = self.system_of_record.update_state(id, state).await?;
        info!(
            device_id = %updated.id,
            state = %updated.state,
            "Device state updated in system of record"
        );

        self.mirror(MirrorOperation::UpdateState, &updated).await;
        Ok(updated)
    }
}

#[async_trait]
impl QueryDeviceRepository for CombinedRepository {
    async fn get_device(&self, id: &str) -> DeviceResult<Device> {
        self.read_store.find_device(id).await
    }

    async fn list_devices(
        &self,
        user_id: &str,
        page: i32,
        page_size: i32,
    ) -> DeviceResult<(Vec<Device>, i64)> {
        let window = PageWindow::from_page(page, page_size);
        debug!(
            user_id = %user_id,
            skip = window.skip,
            limit = window.limit,
            "Listing devices from read store"
        );
        self.read_store.list_by_user(user_id, window).await
    }
}
