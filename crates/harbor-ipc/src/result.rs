//! Command reply envelope

use serde::{Deserialize, Serialize};

use crate::error::IpcError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Failed replies become `IpcError::CommandFailed`.
    pub fn into_result(self) -> Result<Option<T>, IpcError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(IpcError::CommandFailed(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
