use async_trait::async_trait;

use crate::device::error::{DeviceError, DeviceResult};
use crate::device::model::{Device, PageWindow};
use crate::types::MirrorOperation;

/// Write-side repository capability used by command handlers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandDeviceRepository: Send + Sync {
    /// Persist a new device and return it with its assigned id
    async fn create_device(&self, device: Device) -> DeviceResult<Device>;

    /// Replace the state of an existing device and return the updated record
    async fn update_device_state(&self, id: &str, state: &str) -> DeviceResult<Device>;
}

/// Read-side repository capability used by query handlers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryDeviceRepository: Send + Sync {
    async fn get_device(&self, id: &str) -> DeviceResult<Device>;

    /// One page of a user's devices plus the user's total device count
    async fn list_devices(
        &self,
        user_id: &str,
        page: i32,
        page_size: i32,
    ) -> DeviceResult<(Vec<Device>, i64)>;
}

/// Authoritative relational store. The only component allowed to assign device ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemOfRecordStore: Send + Sync {
    async fn insert_device(&self, device: Device) -> DeviceResult<Device>;

    /// Fails with `NotFound` when no row matches `id`
    async fn update_state(&self, id: &str, state: &str) -> DeviceResult<Device>;

    async fn find_device(&self, id: &str) -> DeviceResult<Device>;
}

/// Read-optimized document store. Holds copies of system-of-record rows keyed by their id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadStore: Send + Sync {
    /// Store a full copy of a persisted device
    async fn put_device(&self, device: &Device) -> DeviceResult<()>;

    /// Overwrite state and `updated_at` on an existing copy. A missing copy is not an error.
    async fn set_state(&self, device: &Device) -> DeviceResult<()>;

    async fn find_device(&self, id: &str) -> DeviceResult<Device>;

    async fn list_by_user(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> DeviceResult<(Vec<Device>, i64)>;
}

/// Hook notified when propagation to the read store fails.
/// The originating write has already succeeded when this is called.
pub trait MirrorObserver: Send + Sync {
    fn mirror_failed(&self, operation: MirrorOperation, device_id: &str, error: &DeviceError);
}

/// Default observer: one structured warning per failed mirror
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMirrorObserver;

impl MirrorObserver for TracingMirrorObserver {
    fn mirror_failed(&self, operation: MirrorOperation, device_id: &str, error: &DeviceError) {
        tracing::warn!(
            operation = %operation,
            device_id = %device_id,
            error = %error,
            "Read store mirror failed; reads will be stale until the next write"
        );
    }
}
