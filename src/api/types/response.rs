//! Success envelope used by the account endpoints

use chrono::Utc;
use serde::Serialize;

/// `{ success, message, data, timestamp }` with the timestamp in epoch millis
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` serializes as null
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
