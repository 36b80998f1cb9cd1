//! Request and response types shared by the HTTP handlers

pub mod datetime;
pub mod error;
pub mod json;
pub mod response;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::{Json, ValidatedJson};
pub use response::ApiResponse;
