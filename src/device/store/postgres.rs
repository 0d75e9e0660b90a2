use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::device::error::{DeviceError, DeviceResult};
use crate::device::model::Device;
use crate::device::repository::SystemOfRecordStore;

const DEVICE_COLUMNS: &str = "id::text AS id, name, type, state, user_id, created_at, updated_at";

/// Relational system of record backed by the `devices` table (see `sql/devices.sql`).
/// Device ids come from the column default, `gen_random_uuid()`.
#[derive(Clone)]
pub struct PostgresDeviceStore {
    pool: PgPool,
}

impl PostgresDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ids that are not UUIDs cannot match any row
    fn parse_id(id: &str) -> DeviceResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| DeviceError::not_found(id))
    }
}

#[async_trait]
impl SystemOfRecordStore for PostgresDeviceStore {
    async fn insert_device(&self, device: Device) -> DeviceResult<Device> {
        let sql = format!(
            "INSERT INTO devices (name, type, state, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            DEVICE_COLUMNS
        );

        sqlx::query_as::<_, Device>(&sql)
            .bind(&device.name)
            .bind(&device.device_type)
            .bind(&device.state)
            .bind(&device.user_id)
            .bind(device.created_at)
            .bind(device.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert device for user {}: {}", device.user_id, e);
                DeviceError::from_sqlx(e)
            })
    }

    async fn update_state(&self, id: &str, state: &str) -> DeviceResult<Device> {
        let uuid = Self::parse_id(id)?;
        let sql = format!(
            "UPDATE devices SET state = $1, updated_at = now() WHERE id = $2 RETURNING {}",
            DEVICE_COLUMNS
        );

        sqlx::query_as::<_, Device>(&sql)
            .bind(state)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?
            .ok_or_else(|| DeviceError::not_found(id))
    }

    async fn find_device(&self, id: &str) -> DeviceResult<Device> {
        let uuid = Self::parse_id(id)?;
        let sql = format!("SELECT {} FROM devices WHERE id = $1", DEVICE_COLUMNS);

        sqlx::query_as::<_, Device>(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?
            .ok_or_else(|| DeviceError::not_found(id))
    }
}
