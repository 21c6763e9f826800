use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ServiceError;

/// Uniform response envelope: `{result, data, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: ResultStatus,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultStatus {
    Success,
    Error,
}

/// Error payload inside the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub data: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            result: ResultStatus::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            result: ResultStatus::Error,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
                data,
            }),
        }
    }
}

impl ApiResponse<Value> {
    pub fn from_service_error(err: &ServiceError) -> Self {
        Self::error(err.error_code(), err.to_string(), None)
    }
}
