//! Error types for the geo catalog client.
//!
//! # Design
//! "Not found" has no variant here. The upstream catalog answers missing
//! entries with HTTP 200 and a zero record count, so absence is modeled as
//! `None` / an empty list by the client. These errors only describe requests
//! that failed outright.

use thiserror::Error;

/// Failure to complete one HTTP round-trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server did not answer within the configured read timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS handshake, redirect or protocol failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The HTTP client could not be constructed (TLS backend setup).
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// The response body did not match the expected envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// A locality carried an `ambito` code that is neither urban nor rural.
    #[error("unknown locality scope '{0}'")]
    UnknownScope(String),
}

/// Errors returned by the `GeoClient::parse_*` methods.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },

    #[error("base URL must start with http:// or https://, got '{0}'")]
    BaseUrl(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
