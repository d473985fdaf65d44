//! Reply envelopes for the public boundary.
//!
//! A reply is either the data itself or an object carrying an `error` field.
//! Callers must check for `error` before trusting the rest of the payload.

use serde::Serialize;

use crate::error::{AppError, ErrorKind};

/// Structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Success data or an error payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Data(T),
    Error(ErrorPayload),
}

impl<T> Reply<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl<T> From<Result<T, AppError>> for Reply<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Reply::Data(data),
            Err(err) => {
                log::warn!("{err}");
                Reply::Error(ErrorPayload::from(&err))
            }
        }
    }
}

/// Reply of the login and logout operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginReply {
    pub fn ok(success: bool) -> Self {
        Self {
            success,
            error: None,
        }
    }
}

impl<T> From<Result<T, AppError>> for LoginReply
where
    T: Into<bool>,
{
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(success) => Self::ok(success.into()),
            Err(err) => Self {
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}
