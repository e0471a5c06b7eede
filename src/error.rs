use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The connection failed or went away before a reply arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply cannot be decoded into the requested type.
    #[error("type mismatch: expected {expected}, got {value:?}")]
    TypeMismatch {
        expected: &'static str,
        value: RespValue,
    },

    /// The store answered with an error reply.
    #[error("store error: {0}")]
    Store(String),
}

impl CallError {
    pub fn mismatch(expected: &'static str, value: RespValue) -> Self {
        CallError::TypeMismatch { expected, value }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CallError::TypeMismatch { .. })
    }
}

impl From<std::io::Error> for CallError {
    fn from(e: std::io::Error) -> Self {
        CallError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CallError>;
