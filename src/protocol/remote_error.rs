//! Serializable error representation for RPC rejections.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An error raised inside a frame and carried across the boundary.
///
/// Values that do not look like an error record (a bare string, a number)
/// are wrapped under the `NonError` name with the raw value kept in `data`.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct RemoteError {
    #[serde(default)]
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RemoteError {
    pub const NON_ERROR: &'static str = "NonError";

    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            data: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Rejection for a call to a function that was never defined.
    pub fn not_defined(function: &str) -> Self {
        Self::named(
            "ReferenceError",
            format!("remote function \"{function}\" is not defined"),
        )
    }

    /// Capture a Rust error, recording its source chain as the stack.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        let error = Self::new(err.to_string());
        if chain.is_empty() {
            error
        } else {
            error.with_stack(chain.join("\n"))
        }
    }

    /// Rebuild an error from whatever a frame sent as rejection data.
    pub fn from_value(value: Value) -> Self {
        let looks_like_error = value
            .as_object()
            .is_some_and(|obj| obj.get("message").is_some_and(Value::is_string));

        if looks_like_error
            && let Ok(mut error) = serde_json::from_value::<Self>(value.clone())
        {
            if error.name.is_empty() {
                error.name = "Error".to_string();
            }
            return error;
        }

        let message = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            name: Self::NON_ERROR.to_string(),
            message,
            stack: None,
            data: Some(value),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_non_error(&self) -> bool {
        self.name == Self::NON_ERROR
    }
}
