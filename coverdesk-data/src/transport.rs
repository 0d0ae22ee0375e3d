//! HTTP transport abstraction
//!
//! The fetch runner and submission pipeline talk to the backend through the
//! [`Transport`] trait so they can be driven by scripted transports in tests.
//! [`HttpTransport`] is the reqwest-backed implementation.

use crate::error::DataError;
use async_trait::async_trait;
use coverdesk_common::config::BackendConfig;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Request method used by an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One file part of a multipart body, already loaded into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Request body encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `multipart/form-data`
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

/// A fully described outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer_token: Option<String>,
    /// Upper bound for this attempt, including reading the body
    pub timeout: Duration,
}

/// Status and body text of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt exceeded its timeout
    #[error("request timed out")]
    Timeout,

    /// Host unreachable or connection refused
    #[error("connection failed: {0}")]
    Connect(String),

    /// Non-2xx status without a usable body
    #[error("server returned status {0}")]
    Status(u16),

    /// Any other request failure (invalid URL, body read error, ...)
    #[error("request failed: {0}")]
    Request(String),
}

/// Sends requests to the backend
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from backend settings
    ///
    /// Per-attempt timeouts come from each [`HttpRequest`]; the client only
    /// carries the connect timeout and user agent.
    pub fn new(config: &BackendConfig) -> Result<Self, DataError> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| DataError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        builder = builder.timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                for file in files {
                    let part = reqwest::multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.mime_type)
                        .map_err(|e| TransportError::Request(e.to_string()))?;
                    form = form.part(file.field_name, part);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_error)?;

        debug!(status = status, body_len = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}

fn classify_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_builds_from_default_config() {
        assert!(HttpTransport::new(&BackendConfig::default()).is_ok());
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse { status: 204, body: String::new() };
        let redirect = HttpResponse { status: 302, body: String::new() };
        let error = HttpResponse { status: 500, body: String::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!error.is_success());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(&BackendConfig::default()).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let result = transport
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: "http://127.0.0.1:9/get_clients.php".to_string(),
                query: Vec::new(),
                body: RequestBody::Empty,
                bearer_token: None,
                timeout: Duration::from_secs(2),
            })
            .await;
        assert!(
            matches!(
                result,
                Err(TransportError::Connect(_)) | Err(TransportError::Timeout) | Err(TransportError::Request(_))
            ),
            "unexpected result: {:?}",
            result
        );
    }
}
