//! Blocking HTTP transport for the geo catalog.
//!
//! # Design
//! `Transport` is the single I/O seam of the crate. `HttpTransport` is the
//! production implementation: one `reqwest` blocking client that pools
//! connections and is shared by every call (clones share the same pool).
//! Closures implement `Transport` too, which is how tests and hosts inject
//! canned responses.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::tls::Version;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok`; only failures to
/// obtain a response at all are `TransportError`s.
pub trait Transport: Send + Sync {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Pooled HTTPS client backed by `reqwest`.
///
/// TLS goes through rustls with a TLS 1.2 floor. Redirects are followed. The
/// read timeout is an idle limit: it trips when a single socket read waits
/// longer than it, so a slow but steady body is read to the end. There is
/// no overall deadline.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    read_timeout: Duration,
}

impl HttpTransport {
    pub const READ_TIMEOUT: Duration = Duration::from_secs(20);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const MAX_REDIRECTS: usize = 10;

    pub fn new() -> Result<Self, TransportError> {
        Self::with_read_timeout(Self::READ_TIMEOUT)
    }

    pub fn with_read_timeout(read_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .use_rustls_tls()
            .min_tls_version(Version::TLS_1_2)
            .redirect(Policy::limited(Self::MAX_REDIRECTS))
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            read_timeout,
        })
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut call = self.client.get(request.url.as_str());
        for (name, value) in &request.headers {
            call = call.header(name.as_str(), value.as_str());
        }

        let response = call.send().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connection(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(err.to_string())
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
