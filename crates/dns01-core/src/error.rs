//! Error types for DNS-01 provisioning
//!
//! Every failure is terminal for the operation that produced it. Nothing in
//! this crate retries; the calling orchestrator decides whether to run the
//! whole provisioning step again.

use thiserror::Error;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for DNS-01 provisioning
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or the response could not be received
    #[error("{method}: transport failure: {message}")]
    Transport {
        /// RPC method being called
        method: String,
        /// Underlying failure
        message: String,
    },

    /// The endpoint answered with an HTTP status other than 200
    #[error("{method}: HTTP status {status}")]
    Protocol {
        /// RPC method being called
        method: String,
        /// HTTP status code returned
        status: u16,
    },

    /// The API returned a result code that is not recognized for the method
    #[error("{method} ({target}): unexpected result code {code}: {message}")]
    UnexpectedResultCode {
        /// RPC method being called
        method: String,
        /// Domain or record the call was about
        target: String,
        /// Result code returned
        code: u32,
        /// Message returned alongside the code
        message: String,
    },

    /// No candidate zone matched during resolution
    #[error("no zone found for record {record}")]
    ZoneNotFound {
        /// Record name being resolved
        record: String,
    },

    /// A one-time-password flow was requested or required
    #[error("two-factor authentication is not supported (account {user})")]
    UnsupportedTwoFactor {
        /// Account that asked for it
        user: String,
    },

    /// The provider rejected the credentials
    #[error("authentication failed for {user} (result code {code})")]
    AuthenticationFailed {
        /// Account that attempted to log in
        user: String,
        /// Result code returned by `account.login`
        code: u32,
    },

    /// A create/update/delete call did not return success
    #[error("{method} failed for {record}: result code {code}: {message}")]
    OperationFailed {
        /// RPC method being called
        method: String,
        /// Record name being modified
        record: String,
        /// Result code returned
        code: u32,
        /// Message returned alongside the code
        message: String,
    },

    /// The run was already closed
    #[error("session already closed for this provisioning run")]
    SessionClosed,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport failure
    pub fn transport(method: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            method: method.into(),
            message: message.to_string(),
        }
    }

    /// Create a protocol failure (non-200 HTTP status)
    pub fn protocol(method: impl Into<String>, status: u16) -> Self {
        Self::Protocol {
            method: method.into(),
            status,
        }
    }

    /// Create an unexpected result code error
    pub fn unexpected(
        method: impl Into<String>,
        target: impl Into<String>,
        code: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::UnexpectedResultCode {
            method: method.into(),
            target: target.into(),
            code,
            message: message.into(),
        }
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(record: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            record: record.into(),
        }
    }

    /// Create an unsupported two-factor error
    pub fn two_factor(user: impl Into<String>) -> Self {
        Self::UnsupportedTwoFactor { user: user.into() }
    }

    /// Create an authentication error
    pub fn auth(user: impl Into<String>, code: u32) -> Self {
        Self::AuthenticationFailed {
            user: user.into(),
            code,
        }
    }

    /// Create an operation failure
    pub fn operation(
        method: impl Into<String>,
        record: impl Into<String>,
        code: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::OperationFailed {
            method: method.into(),
            record: record.into(),
            code,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
