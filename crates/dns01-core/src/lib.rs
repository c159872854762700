// # dns01-core
//
// Core library for publishing DNS-01 challenge TXT records through a DNS
// provider that exposes a JSON-RPC management API.
//
// ## Architecture Overview
//
// - **RpcTransport**: Trait for delivering JSON-RPC calls (HTTP lives in `dns01-jsonrpc`)
// - **AuthSession**: Logs in once per run, caches the session, logs out best-effort
// - **ZoneResolver**: Finds the delegated zone holding a record name, with a per-run cache
// - **TxtRecordManager**: Create-or-update and find-and-delete of TXT records
// - **ChallengeProvisioner**: Per-run context exposing provision / deprovision / finalize
//
// ## Design Principles
//
// 1. **Explicit Run State**: Session and zone cache live in a context object, never in globals
// 2. **Typed Failures**: Every failure is an `Error` variant callers can match on
// 3. **No Retries**: A failed call is terminal for its operation
// 4. **Idempotency**: Upsert never duplicates, removing an absent record succeeds

pub mod config;
pub mod error;
pub mod provisioner;
pub mod records;
pub mod session;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use config::{ApiConfig, Credentials};
pub use error::{Error, Result};
pub use provisioner::ChallengeProvisioner;
pub use records::{TxtRecord, TxtRecordManager, UpsertOutcome};
pub use session::{AuthSession, Session, SessionState};
pub use traits::{ResultCode, RpcRequest, RpcResponse, RpcTransport};
pub use zone::ZoneResolver;
