// # JSON-RPC over HTTPS Transport
//
// This crate provides the HTTP implementation of `RpcTransport` for the
// DNS-01 provisioning core.
//
// ## Behavior
//
// - ✅ One HTTPS POST per call, JSON-RPC 2.0 envelope with a fresh id
// - ✅ Session cookie sent as `Cookie` when a session is passed in
// - ✅ `Set-Cookie` from a response surfaced as `RpcResponse::session_token`
// - ✅ Wire traffic logged at TRACE level (login password and cookies redacted)
// - ❌ NO retry or backoff (a failed call is terminal for its operation)
// - ❌ NO timeout override (the HTTP client default applies)
// - ❌ NO result-code interpretation (callers own method-specific semantics)
//
// ## Error Mapping
//
// | situation                          | error              |
// |------------------------------------|--------------------|
// | connect / DNS / TLS / read failure | `Error::Transport` |
// | HTTP status other than 200         | `Error::Protocol`  |
// | 200 with an undecodable body       | `Error::Transport` |

use async_trait::async_trait;
use dns01_core::config::ApiConfig;
use dns01_core::{Error, Result, RpcRequest, RpcResponse, RpcTransport, Session};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// HTTPS JSON-RPC transport
///
/// # Security
///
/// Neither the login password nor any session cookie is ever logged.
pub struct HttpRpcTransport {
    /// URL every request is posted to
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Next JSON-RPC correlation id
    next_id: AtomicU64,
}

impl std::fmt::Debug for HttpRpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpcTransport")
            .field("endpoint", &self.endpoint)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl HttpRpcTransport {
    /// Create a transport posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(Error::config("JSON-RPC endpoint cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a transport for a validated API configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.endpoint_url())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn send(
        &self,
        method: &str,
        params: Value,
        session: Option<&Session>,
    ) -> Result<RpcResponse> {
        let request = RpcRequest::new(self.next_id(), method, params);

        trace!(
            "JSON-RPC request #{} {} params={} session={}",
            request.id,
            request.method,
            request.redacted_params(),
            session.is_some()
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = session.and_then(Session::token) {
            builder = builder.header(COOKIE, token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(method, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            trace!("JSON-RPC response #{} {}: HTTP {}", request.id, method, status);
            return Err(Error::protocol(method, status.as_u16()));
        }

        let session_token = session_cookie(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(method, e))?;

        trace!(
            "JSON-RPC response #{} {}: HTTP {} body={}",
            request.id,
            method,
            status,
            body
        );

        let mut decoded: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| Error::transport(method, format!("invalid response body: {}", e)))?;
        decoded.session_token = session_token;

        Ok(decoded)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `name=value` pairs of every `Set-Cookie` header, joined for a `Cookie` header
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
