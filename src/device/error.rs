use thiserror::Error;

/// Failures raised by device stores, the combined repository and the handlers
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device conflict: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store unreachable or query failure
    #[error("Store error: {0}")]
    Infra(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

impl DeviceError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        DeviceError::NotFound(format!("device {} not found", id))
    }

    pub fn infra(message: impl Into<String>) -> Self {
        DeviceError::Infra(message.into())
    }

    /// Classify a sqlx error into the device taxonomy
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DeviceError::NotFound("device not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DeviceError::Conflict(db.message().to_string())
            }
            other => DeviceError::Infra(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DeviceError {
    fn from(err: serde_json::Error) -> Self {
        DeviceError::Infra(format!("document encoding failed: {}", err))
    }
}
