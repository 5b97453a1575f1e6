//! Error types for the todo API client.
//!
//! # Design
//! `NotFound`, `Conflict` and `Validation` get dedicated variants because
//! callers branch on them. Any other error envelope lands in `Rpc` with its
//! machine code; responses that are not an envelope at all land in
//! `HttpError` with the raw status and body.

use thiserror::Error;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `NOT_FOUND`: the todo (or procedure) does not exist.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// `CONFLICT`: a todo with the supplied id already exists.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// `BAD_REQUEST` or `PARSE_ERROR`: the server rejected the input.
    #[error("invalid input: {message}")]
    Validation { message: String },

    /// Any other error envelope.
    #[error("{code} (HTTP {status}): {message}")]
    Rpc {
        code: String,
        status: u16,
        message: String,
    },

    /// A non-2xx response that did not carry an error envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
