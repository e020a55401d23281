//! Client for Mexico's administrative geography catalog (INEGI).
//!
//! # Overview
//! Looks up states, municipalities (regions) and localities from the
//! upstream catalog and maps its JSON envelopes into typed values.
//!
//! # Design
//! - `GeoClient` holds a base URL and a caller-owned `Transport`; the
//!   default `HttpTransport` is one pooled `reqwest` blocking client shared
//!   by all calls.
//! - Each operation splits into `build_*` (request), `parse_*` (typed
//!   `Result`) and a convenience method that logs failures and returns an
//!   empty list or `None`.
//! - The upstream answers missing entries with HTTP 200 and `numReg: 0`, so
//!   single-item lookups only succeed on a record count of exactly one.
//! - Wire records (`wire`) are kept apart from the public entities (`types`).

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::GeoClient;
pub use config::GeoConfig;
pub use error::{ApiError, ConfigError, DecodeError, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use transport::{HttpTransport, Transport};
pub use types::{Locality, Lookup, Metadata, Region, Scope, State};
