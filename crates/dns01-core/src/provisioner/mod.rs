// # Challenge Provisioner
//
// The per-run context handed to the certificate-issuance client. Owns the
// transport, the session lifecycle and the zone cache for exactly one
// provisioning run; nothing is shared between runs.
//
// ## Flow
//
// ```text
// provision_txt ──┐
//                 ├─> AuthSession::connect (cached after the first call)
// deprovision_txt ┘        │
//                          └─> TxtRecordManager ─> ZoneResolver (cached)
// finalize ───────────> AuthSession::close (best-effort)
// ```
//
// Calls are strictly sequential: every RPC is awaited before the next one is
// sent, and `&mut self` keeps two operations of one run from interleaving.

use tracing::{info, warn};

use crate::config::Credentials;
use crate::error::Result;
use crate::records::{TxtRecordManager, UpsertOutcome};
use crate::session::{AuthSession, SessionState};
use crate::traits::RpcTransport;
use crate::zone::ZoneResolver;

/// One provisioning run against the provider API
pub struct ChallengeProvisioner {
    transport: Box<dyn RpcTransport>,
    auth: AuthSession,
    zones: ZoneResolver,
}

impl std::fmt::Debug for ChallengeProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeProvisioner")
            .field("endpoint", &self.transport.endpoint())
            .field("auth", &self.auth)
            .field("zones", &self.zones)
            .finish()
    }
}

impl ChallengeProvisioner {
    /// Start a run over `transport`
    pub fn new(transport: Box<dyn RpcTransport>) -> Self {
        Self {
            transport,
            auth: AuthSession::new(),
            zones: ZoneResolver::new(),
        }
    }

    /// Session lifecycle state of this run
    pub fn session_state(&self) -> &SessionState {
        self.auth.state()
    }

    /// Zone cache of this run
    pub fn zones(&self) -> &ZoneResolver {
        &self.zones
    }

    /// Publish `value` as the TXT record `record_name`
    pub async fn provision_txt(
        &mut self,
        record_name: &str,
        value: &str,
        credentials: &Credentials,
    ) -> Result<UpsertOutcome> {
        info!("Provisioning TXT record {}", record_name);

        let session = self.auth.connect(self.transport.as_ref(), credentials).await?;
        let mut records = TxtRecordManager::new(self.transport.as_ref(), &session, &mut self.zones);
        records.upsert(record_name, value).await
    }

    /// Remove the TXT record `record_name` carrying `value`
    ///
    /// Returns the number of records deleted.
    pub async fn deprovision_txt(
        &mut self,
        record_name: &str,
        value: &str,
        credentials: &Credentials,
    ) -> Result<usize> {
        info!("Deprovisioning TXT record {}", record_name);

        let session = self.auth.connect(self.transport.as_ref(), credentials).await?;
        let mut records = TxtRecordManager::new(self.transport.as_ref(), &session, &mut self.zones);
        records.remove(record_name, value).await
    }

    /// End the run
    ///
    /// Logout failures are logged and dropped; they never fail a run whose
    /// records were already reconciled.
    pub async fn finalize(&mut self, credentials: &Credentials) {
        if let Err(e) = self.auth.close(self.transport.as_ref()).await {
            warn!("Logout for {} failed (ignored): {}", credentials.user, e);
        }
    }
}
