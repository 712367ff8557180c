//! Error types for the todo client and store.
//!
//! # Design
//! `ApiError` describes what went wrong on the wire and stays inside the
//! crate boundary: the store logs it and converts it to a `TodoError`, whose
//! `Display` is the fixed message shown to the user. `NotFound` keeps its own
//! variant because a 404 on delete or update is the common failure.

use thiserror::Error;

/// Errors produced while building requests or parsing responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned an unexpected status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the round-trip at all.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// User-facing failures. At most one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum TodoError {
    #[error("{}", self.message())]
    LoadFailed,

    #[error("{}", self.message())]
    EmptyTitle,

    #[error("{}", self.message())]
    CreateFailed,

    #[error("{}", self.message())]
    UpdateFailed,

    #[error("{}", self.message())]
    DeleteFailed,
}

impl TodoError {
    /// The fixed banner text for this error.
    pub fn message(self) -> &'static str {
        match self {
            TodoError::LoadFailed => "Unable to load todos",
            TodoError::EmptyTitle => "Title should not be empty",
            TodoError::CreateFailed => "Unable to add a todo",
            TodoError::UpdateFailed => "Unable to update a todo",
            TodoError::DeleteFailed => "Unable to delete a todo",
        }
    }
}

/// Errors raised while reading `TodoConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("a user id is required; set TODO_USER_ID to a non-zero value")]
    MissingUserId,

    #[error("{var} must not be empty")]
    EmptyValue { var: &'static str },
}
