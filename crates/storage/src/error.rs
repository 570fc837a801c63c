//! Error taxonomy shared by every layer of the engine.

use thiserror::Error;

/// Stable integer result codes exposed across the handle interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    InvalidArgument = 1,
    NotFound = 2,
    Internal = 3,
    AlreadyExists = 4,
}

impl ErrorCode {
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
            Self::Internal => "internal",
            Self::AlreadyExists => "already exists",
        }
    }
}

/// Failure of an engine operation. The payload is the human-readable message
/// surfaced through the last-error accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed statement, missing argument, type mismatch on a getter,
    /// out-of-range index, unknown handle.
    #[error("{0}")]
    InvalidArgument(String),

    /// Unknown table, domain, relationship, or database path.
    #[error("{0}")]
    NotFound(String),

    /// Relationship name reused with a different definition.
    #[error("{0}")]
    AlreadyExists(String),

    /// I/O failure or broken invariant.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::AlreadyExists(m)
            | Self::Internal(m) => m,
        }
    }

    /// Same kind, different message.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self {
            Self::InvalidArgument(_) => Self::InvalidArgument(message),
            Self::NotFound(_) => Self::NotFound(message),
            Self::AlreadyExists(_) => Self::AlreadyExists(message),
            Self::Internal(_) => Self::Internal(message),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("io error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
