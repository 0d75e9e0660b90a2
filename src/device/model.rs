use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State assigned to every newly created device
pub const DEFAULT_STATE: &str = "off";

/// A smart-home device as stored by both the system of record and the read store.
///
/// `id` is empty until the system of record assigns one on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub device_type: String,
    pub state: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Build an unsaved device in its initial state. Both timestamps share one instant.
    pub fn new(
        name: impl Into<String>,
        device_type: impl Into<String>,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            device_type: device_type.into(),
            state: DEFAULT_STATE.to_string(),
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Offset/limit window for a list query, derived from a 1-based page number.
///
/// Inputs are not validated: `page < 1` yields a negative skip and `page_size <= 0`
/// a non-positive limit. Both stores follow Postgres OFFSET/LIMIT: a negative skip or
/// limit is an error, and `limit == 0` is an empty page rather than "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn from_page(page: i32, page_size: i32) -> Self {
        let page = i64::from(page);
        let page_size = i64::from(page_size);
        Self {
            skip: (page - 1) * page_size,
            limit: page_size,
        }
    }
}
