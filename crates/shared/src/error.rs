use serde::{Deserialize, Serialize};

use crate::command::CommandError;
use crate::domain::SnapshotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    InvalidCommand,
    Internal,
}

/// Classified failure carried from wherever a request went wrong to the
/// handler edge, where the code picks the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCommand, message)
    }
}

impl From<CommandError> for ApiError {
    fn from(value: CommandError) -> Self {
        Self::invalid_command(value.to_string())
    }
}

impl From<SnapshotError> for ApiError {
    fn from(value: SnapshotError) -> Self {
        Self::bad_request(value.to_string())
    }
}
