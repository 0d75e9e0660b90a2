use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::error::DeviceError;

/// Canonical RPC status codes (subset of the gRPC code space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Unauthenticated,
    Unavailable,
    DeadlineExceeded,
    Internal,
    Unknown,
}

impl RpcCode {
    /// HTTP status used when this code travels over the RPC transport
    pub fn transport_status(&self) -> StatusCode {
        match self {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::AlreadyExists => StatusCode::CONFLICT,
            RpcCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            RpcCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            RpcCode::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            RpcCode::Internal | RpcCode::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Best guess at the code when a transport response carries no status body
    pub fn from_transport_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => RpcCode::InvalidArgument,
            StatusCode::NOT_FOUND => RpcCode::NotFound,
            StatusCode::CONFLICT => RpcCode::AlreadyExists,
            StatusCode::UNAUTHORIZED => RpcCode::Unauthenticated,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => RpcCode::Unavailable,
            StatusCode::GATEWAY_TIMEOUT => RpcCode::DeadlineExceeded,
            StatusCode::INTERNAL_SERVER_ERROR => RpcCode::Internal,
            _ => RpcCode::Unknown,
        }
    }
}

/// Error returned by every DeviceService call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }
}

impl From<DeviceError> for RpcStatus {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::NotFound(msg) => RpcStatus::not_found(msg),
            DeviceError::InvalidArgument(msg) => RpcStatus::invalid_argument(msg),
            DeviceError::Conflict(msg) => RpcStatus::new(RpcCode::AlreadyExists, msg),
            DeviceError::Infra(msg) => {
                tracing::error!("Device store failure: {}", msg);
                RpcStatus::internal(format!("Internal error: {}", msg))
            }
        }
    }
}
