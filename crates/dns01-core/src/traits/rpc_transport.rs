// # RPC Transport Trait
//
// Defines the interface for sending JSON-RPC 2.0 calls to the provider API.
//
// ## Implementations
//
// - HTTPS POST: `dns01-jsonrpc` crate
// - In-memory doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::RpcTransport;
// use serde_json::json;
//
// let response = transport
//     .send("nameserver.info", json!({ "domain": "example.com" }), Some(&session))
//     .await?;
//
// match response.result_code() {
//     ResultCode::Success | ResultCode::ObjectExists => { /* zone exists */ }
//     other => { /* caller decides */ }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::Session;

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing JSON-RPC envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    /// Protocol version, always "2.0"
    pub jsonrpc: &'static str,
    /// Correlation id
    pub id: u64,
    /// Method name, e.g. "nameserver.info"
    pub method: String,
    /// Parameter mapping
    pub params: Value,
}

impl RpcRequest {
    /// Build an envelope for `method`
    ///
    /// Non-object params (including `null`) are replaced by an empty object.
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        let params = if params.is_object() {
            params
        } else {
            Value::Object(serde_json::Map::new())
        };
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }

    /// Params with the login password masked, for logging
    pub fn redacted_params(&self) -> Value {
        let mut params = self.params.clone();
        if let Some(pass) = params.get_mut("pass") {
            *pass = Value::String("<REDACTED>".to_string());
        }
        params
    }
}

/// Decoded API response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcResponse {
    /// Numeric result code
    pub code: u32,

    /// Human-readable message accompanying the code
    #[serde(default, rename = "msg")]
    pub message: Option<String>,

    /// Result payload
    #[serde(default, rename = "resData")]
    pub payload: Option<Value>,

    /// Session cookie handed out with this response, if any
    #[serde(skip)]
    pub session_token: Option<String>,
}

impl RpcResponse {
    /// Response with the given code and no payload
    pub fn with_code(code: u32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Interpreted result code
    pub fn result_code(&self) -> ResultCode {
        ResultCode::from_code(self.code)
    }

    /// Message or an empty string
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// Result codes this crate knows how to interpret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// 1000: command completed successfully
    Success,
    /// 1500: command completed successfully, session ended
    SessionEnded,
    /// 2200: authentication error
    AuthenticationError,
    /// 2302: object exists
    ObjectExists,
    /// 2303: object does not exist
    ObjectDoesNotExist,
    /// 2400: command failed
    CommandFailed,
    /// Anything else
    Other(u32),
}

impl ResultCode {
    /// Map a raw code
    pub fn from_code(code: u32) -> Self {
        match code {
            1000 => Self::Success,
            1500 => Self::SessionEnded,
            2200 => Self::AuthenticationError,
            2302 => Self::ObjectExists,
            2303 => Self::ObjectDoesNotExist,
            2400 => Self::CommandFailed,
            other => Self::Other(other),
        }
    }

    /// Raw code
    pub fn code(self) -> u32 {
        match self {
            Self::Success => 1000,
            Self::SessionEnded => 1500,
            Self::AuthenticationError => 2200,
            Self::ObjectExists => 2302,
            Self::ObjectDoesNotExist => 2303,
            Self::CommandFailed => 2400,
            Self::Other(code) => code,
        }
    }

    /// 1xxx codes
    pub fn is_success(self) -> bool {
        (1000..2000).contains(&self.code())
    }
}

/// Trait for JSON-RPC transport implementations
///
/// A transport delivers exactly one request per `send` and reports what came
/// back. It does not interpret result codes; their meaning is method-specific
/// and belongs to the caller.
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed call is terminal for its operation)
/// - ❌ Keep session state of its own (the session is passed in)
/// - ❌ Override timeouts beyond the HTTP client default
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one call
    ///
    /// # Parameters
    ///
    /// - `method`: RPC method name
    /// - `params`: parameter object
    /// - `session`: active session whose cookie accompanies the call
    ///
    /// # Returns
    ///
    /// - `Ok(RpcResponse)`: decoded response, whatever its result code
    /// - `Err(Error::Transport)`: the request could not be completed
    /// - `Err(Error::Protocol)`: the HTTP status was not 200
    async fn send(
        &self,
        method: &str,
        params: Value,
        session: Option<&Session>,
    ) -> Result<RpcResponse, crate::Error>;

    /// Endpoint the transport talks to (for logging)
    fn endpoint(&self) -> &str;
}
