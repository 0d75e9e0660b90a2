use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::device::error::{DeviceError, DeviceResult};
use crate::device::model::{Device, PageWindow};
use crate::device::repository::ReadStore;

const UPSERT_SQL: &str = "INSERT INTO device_documents (id, user_id, created_at, doc) \
     VALUES ($1, $2, $3, $4) \
     ON CONFLICT (id) DO UPDATE SET user_id = EXCLUDED.user_id, doc = EXCLUDED.doc";

// Merges into the stored document; other fields keep their mirrored values
const SET_STATE_SQL: &str = "UPDATE device_documents \
     SET doc = doc || jsonb_build_object('state', $2::text, 'updated_at', $3::jsonb) \
     WHERE id = $1";

const FIND_SQL: &str = "SELECT doc FROM device_documents WHERE id = $1";

const LIST_SQL: &str = "SELECT doc FROM device_documents WHERE user_id = $1 \
     ORDER BY created_at, id OFFSET $2 LIMIT $3";

const COUNT_SQL: &str = "SELECT COUNT(*) FROM device_documents WHERE user_id = $1";

/// Read store keeping each device as a JSONB document in `device_documents`
/// (see `sql/device_documents.sql`). `user_id` and `created_at` are lifted out of the
/// document so listing can filter and order without touching the JSON.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadStore for PostgresDocumentStore {
    async fn put_device(&self, device: &Device) -> DeviceResult<()> {
        if !device.is_persisted() {
            return Err(DeviceError::InvalidArgument(
                "read store only accepts devices with an assigned id".to_string(),
            ));
        }

        sqlx::query(UPSERT_SQL)
            .bind(&device.id)
            .bind(&device.user_id)
            .bind(device.created_at)
            .bind(Json(device))
            .execute(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?;

        Ok(())
    }

    async fn set_state(&self, device: &Device) -> DeviceResult<()> {
        let result = sqlx::query(SET_STATE_SQL)
            .bind(&device.id)
            .bind(&device.state)
            .bind(Json(device.updated_at))
            .execute(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?;

        if result.rows_affected() == 0 {
            tracing::debug!(device_id = %device.id, "No read store document to update");
        }
        Ok(())
    }

    async fn find_device(&self, id: &str) -> DeviceResult<Device> {
        let doc = sqlx::query_scalar::<_, Json<Device>>(FIND_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?;

        doc.map(|Json(device)| device)
            .ok_or_else(|| DeviceError::not_found(id))
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> DeviceResult<(Vec<Device>, i64)> {
        let docs = sqlx::query_scalar::<_, Json<Device>>(LIST_SQL)
            .bind(user_id)
            .bind(window.skip)
            .bind(window.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?;

        let total: i64 = sqlx::query_scalar(COUNT_SQL)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DeviceError::from_sqlx)?;

        Ok((docs.into_iter().map(|Json(device)| device).collect(), total))
    }
}
