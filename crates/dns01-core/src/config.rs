//! Configuration types for DNS-01 provisioning
//!
//! The core only defines the shapes and their validation. Where values come
//! from (environment, hook arguments, a calling orchestrator) is up to the
//! integration layer.

use serde::{Deserialize, Serialize};

/// Production JSON-RPC endpoint
pub const PRODUCTION_ENDPOINT: &str = "https://api.domrobot.com/jsonrpc/";

/// Sandbox (OT&E) JSON-RPC endpoint
pub const SANDBOX_ENDPOINT: &str = "https://api.ote.domrobot.com/jsonrpc/";

/// TTL applied to every TXT record this crate creates or updates (seconds)
pub const TXT_RECORD_TTL: u32 = 300;

/// API endpoint selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Explicit endpoint URL, overrides `sandbox` when set
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use the sandbox endpoint instead of production
    #[serde(default)]
    pub sandbox: bool,
}

impl ApiConfig {
    /// Production endpoint
    pub fn production() -> Self {
        Self::default()
    }

    /// Sandbox endpoint
    pub fn sandbox() -> Self {
        Self {
            endpoint: None,
            sandbox: true,
        }
    }

    /// Explicit endpoint URL
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            sandbox: false,
        }
    }

    /// The URL requests are posted to
    pub fn endpoint_url(&self) -> &str {
        match &self.endpoint {
            Some(url) => url,
            None if self.sandbox => SANDBOX_ENDPOINT,
            None => PRODUCTION_ENDPOINT,
        }
    }

    /// Validate the API configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let url = self.endpoint_url();
        if url.is_empty() {
            return Err(crate::Error::config("API endpoint cannot be empty"));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API endpoint must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        if url.starts_with("http://") {
            tracing::warn!("API endpoint {} is not using HTTPS", url);
        }
        Ok(())
    }
}

/// Account credentials for the provider API
///
/// Unknown fields are ignored on deserialization so that callers may pass
/// through whatever extra parameters their orchestrator hands them.
///
/// # Security
///
/// The Debug implementation does NOT expose the password or shared secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account user name
    pub user: String,

    /// Account password
    pub password: String,

    /// Shared secret for one-time-password generation (not supported)
    #[serde(default)]
    pub shared_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Create credentials without a shared secret
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            shared_secret: None,
        }
    }

    /// Attach a shared secret
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.user.is_empty() {
            return Err(crate::Error::config("API user cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("API password cannot be empty"));
        }
        Ok(())
    }
}
