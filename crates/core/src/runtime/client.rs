//! HTTP client seam of the runtime façades.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ODataRequest {
    pub method: HttpMethod,
    /// Absolute URL: base path plus resource path.
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request failed{}: {message}", status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct ClientError {
    pub status: Option<u16>,
    pub message: String,
}

/// Transport used by the façades. Implementations own retries,
/// authentication and response decoding.
pub trait ODataClient: Send + Sync {
    fn execute(
        &self,
        request: ODataRequest,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

/// Client that records every request and answers with a fixed response.
#[derive(Debug, Default)]
pub struct RecordingClient {
    requests: Mutex<Vec<ODataRequest>>,
    response: Value,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: Value) -> Self {
        Self {
            requests: Mutex::default(),
            response,
        }
    }

    pub fn requests(&self) -> Vec<ODataRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<ODataRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl ODataClient for RecordingClient {
    fn execute(
        &self,
        request: ODataRequest,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        std::future::ready(Ok(self.response.clone()))
    }
}
