use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::device::error::{DeviceError, DeviceResult};
use crate::device::model::{Device, PageWindow};
use crate::device::repository::{ReadStore, SystemOfRecordStore};

/// Process-local system of record. Assigns UUID ids like the Postgres store does.
#[derive(Default)]
pub struct InMemorySystemOfRecord {
    rows: RwLock<HashMap<String, Device>>,
    failing: AtomicBool,
}

impl InMemorySystemOfRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with an infrastructure error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> DeviceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeviceError::infra("system of record unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SystemOfRecordStore for InMemorySystemOfRecord {
    async fn insert_device(&self, mut device: Device) -> DeviceResult<Device> {
        self.check_available()?;

        device.id = Uuid::new_v4().to_string();
        let mut rows = self.rows.write().await;
        rows.insert(device.id.clone(), device.clone());
        Ok(device)
    }

    async fn update_state(&self, id: &str, state: &str) -> DeviceResult<Device> {
        self.check_available()?;

        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or_else(|| DeviceError::not_found(id))?;
        row.state = state.to_string();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn find_device(&self, id: &str) -> DeviceResult<Device> {
        self.check_available()?;

        let rows = self.rows.read().await;
        rows.get(id).cloned().ok_or_else(|| DeviceError::not_found(id))
    }
}

/// Process-local read store. Keeps documents in mirror order, which is also list order.
#[derive(Default)]
pub struct InMemoryReadStore {
    documents: RwLock<Vec<Device>>,
    failing: AtomicBool,
}

impl InMemoryReadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with an infrastructure error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    fn check_available(&self) -> DeviceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeviceError::infra("read store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadStore for InMemoryReadStore {
    async fn put_device(&self, device: &Device) -> DeviceResult<()> {
        self.check_available()?;
        if !device.is_persisted() {
            return Err(DeviceError::InvalidArgument(
                "read store only accepts devices with an assigned id".to_string(),
            ));
        }

        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|doc| doc.id == device.id) {
            Some(existing) => *existing = device.clone(),
            None => documents.push(device.clone()),
        }
        Ok(())
    }

    async fn set_state(&self, device: &Device) -> DeviceResult<()> {
        self.check_available()?;

        let mut documents = self.documents.write().await;
        if let Some(existing) = documents.iter_mut().find(|doc| doc.id == device.id) {
            existing.state = device.state.clone();
            existing.updated_at = device.updated_at;
        }
        Ok(())
    }

    async fn find_device(&self, id: &str) -> DeviceResult<Device> {
        self.check_available()?;

        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .ok_or_else(|| DeviceError::not_found(id))
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> DeviceResult<(Vec<Device>, i64)> {
        self.check_available()?;
        // Same rejections Postgres applies to OFFSET/LIMIT
        if window.skip < 0 {
            return Err(DeviceError::infra("OFFSET must not be negative"));
        }
        if window.limit < 0 {
            return Err(DeviceError::infra("LIMIT must not be negative"));
        }

        let documents = self.documents.read().await;
        let owned: Vec<&Device> = documents.iter().filter(|doc| doc.user_id == user_id).collect();
        let total = owned.len() as i64;
        let page = owned
            .into_iter()
            .skip(window.skip as usize)
            .take(window.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }
}
