//! HTTP request/response values exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `GeoClient::build_*` produces an
//! `HttpRequest`, a `Transport` turns it into an `HttpResponse`, and
//! `GeoClient::parse_*` consumes that. Every catalog endpoint is a GET, so
//! no method field is carried.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// A GET for `url` that asks for JSON.
    pub fn get(url: String) -> Self {
        Self {
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// An HTTP response described as plain data.
///
/// Any status is representable; the client decides what a non-2xx status
/// means.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
