// # Authenticated Session
//
// Logs in once per provisioning run and hands the same session to every
// subsequent zone and record call.
//
// ## Lifecycle
//
// ```text
// Unauthenticated --connect--> Authenticated --close--> Closed
//                                  |   ^
//                                  +---+  connect (cached, no network call)
// ```
//
// `Closed` is terminal: a run that has been finalized cannot log in again.
//
// ## Security
//
// - The session cookie NEVER appears in logs or Debug output
// - Shared-secret (OTP) credentials are rejected before any network call

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::traits::{ResultCode, RpcTransport};

/// Authenticated session
///
/// Carries the cookie handed out by `account.login` and the account that
/// obtained it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user: String,
    token: Option<String>,
}

// Custom Debug implementation that hides the session cookie
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl Session {
    /// Create a session for `user` carrying `token`
    pub fn new(user: impl Into<String>, token: Option<String>) -> Self {
        Self {
            user: user.into(),
            token,
        }
    }

    /// Account that created the session
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Cookie to send with each call
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Where a run is in its session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No login attempted yet
    Unauthenticated,
    /// Logged in
    Authenticated(Session),
    /// Logged out; terminal for the run
    Closed,
}

/// Session establishment and teardown for one provisioning run
#[derive(Debug)]
pub struct AuthSession {
    state: SessionState,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Create an unauthenticated session holder
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The cached session, if logged in
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Log in, or return the cached session
    ///
    /// # Returns
    ///
    /// - `Ok(Session)`: cached session, or a fresh one after `account.login`
    /// - `Err(Error::UnsupportedTwoFactor)`: a shared secret was supplied, or
    ///   the account requires a one-time password
    /// - `Err(Error::AuthenticationFailed)`: login rejected (2200 / 2400)
    /// - `Err(Error::UnexpectedResultCode)`: any other login result
    /// - `Err(Error::SessionClosed)`: the run was already closed
    pub async fn connect(
        &mut self,
        transport: &dyn RpcTransport,
        credentials: &Credentials,
    ) -> Result<Session> {
        match &self.state {
            SessionState::Authenticated(session) => {
                debug!("Reusing session for {}", session.user());
                return Ok(session.clone());
            }
            SessionState::Closed => return Err(Error::SessionClosed),
            SessionState::Unauthenticated => {}
        }

        if credentials
            .shared_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty())
        {
            return Err(Error::two_factor(&credentials.user));
        }
        credentials.validate()?;

        debug!("Logging in as {} at {}", credentials.user, transport.endpoint());

        let response = transport
            .send(
                "account.login",
                json!({ "user": &credentials.user, "pass": &credentials.password }),
                None,
            )
            .await?;

        match response.result_code() {
            ResultCode::Success => {
                if requires_one_time_password(response.payload.as_ref()) {
                    warn!(
                        "Account {} requires a one-time password, which is not supported",
                        credentials.user
                    );
                    return Err(Error::two_factor(&credentials.user));
                }
                if response.session_token.is_none() {
                    warn!("Login for {} returned no session cookie", credentials.user);
                }

                let session = Session::new(&credentials.user, response.session_token);
                self.state = SessionState::Authenticated(session.clone());
                info!("Logged in as {}", credentials.user);
                Ok(session)
            }
            ResultCode::AuthenticationError | ResultCode::CommandFailed => {
                warn!(
                    "Login failed for {}: {} ({})",
                    credentials.user,
                    response.code,
                    response.message()
                );
                Err(Error::auth(&credentials.user, response.code))
            }
            _ => Err(Error::unexpected(
                "account.login",
                &credentials.user,
                response.code,
                response.message(),
            )),
        }
    }

    /// Log out (best-effort)
    ///
    /// The cached session is cleared and the run moves to `Closed` before the
    /// logout call is made, so the state is reset whatever the outcome. The
    /// returned error is informational: callers log it and carry on.
    pub async fn close(&mut self, transport: &dyn RpcTransport) -> Result<()> {
        let session = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Authenticated(session) => session,
            _ => {
                debug!("No active session to close");
                return Ok(());
            }
        };

        let response = transport
            .send("account.logout", json!({}), Some(&session))
            .await?;

        match response.result_code() {
            ResultCode::Success | ResultCode::SessionEnded => {
                info!("Logged out {}", session.user());
                Ok(())
            }
            _ => Err(Error::unexpected(
                "account.logout",
                session.user(),
                response.code,
                response.message(),
            )),
        }
    }
}

/// Whether a login payload reports an account-level OTP requirement
fn requires_one_time_password(payload: Option<&Value>) -> bool {
    match payload.and_then(|data| data.get("tfa")) {
        Some(Value::String(mode)) => !mode.is_empty() && mode != "0",
        Some(Value::Number(mode)) => mode.as_u64() != Some(0),
        Some(Value::Bool(enabled)) => *enabled,
        _ => false,
    }
}
