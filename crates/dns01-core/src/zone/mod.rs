// # Zone Resolution
//
// Finds the delegated zone that holds a record. The provider may host nested
// sub-zones (`sub1.example.com` delegated separately from `example.com`), so
// the zone cannot be derived from the name alone.
//
// ## Candidate Walk
//
// For `_acme-challenge.site1.sub1.example.com` the candidates are, in order:
//
// ```text
// site1.sub1.example.com
// sub1.example.com
// example.com
// ```
//
// The leading label is never a zone, and neither is the bare TLD. The first
// candidate the API reports as existing wins.
//
// ## Cache
//
// Resolutions are cached for the lifetime of the resolver (one provisioning
// run). Entries are never invalidated.

use std::collections::HashMap;

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::traits::{ResultCode, RpcTransport};

/// Record name without a trailing root dot
pub fn normalize_record_name(record_name: &str) -> &str {
    record_name.trim().trim_end_matches('.')
}

/// Zones that could hold `record_name`, most specific first
pub fn candidate_zones(record_name: &str) -> Vec<String> {
    let labels: Vec<&str> = normalize_record_name(record_name).split('.').collect();
    if labels.len() < 3 {
        return Vec::new();
    }

    (1..labels.len() - 1)
        .map(|start| labels[start..].join("."))
        .collect()
}

/// Delegated zone lookup with a per-run cache
#[derive(Debug, Default)]
pub struct ZoneResolver {
    cache: HashMap<String, String>,
}

impl ZoneResolver {
    /// Create a resolver with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously resolved zone for `record_name`
    pub fn cached(&self, record_name: &str) -> Option<&str> {
        self.cache
            .get(&cache_key(record_name))
            .map(String::as_str)
    }

    /// Number of cached resolutions
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve the zone holding `record_name`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the most specific existing zone
    /// - `Err(Error::ZoneNotFound)`: no candidate exists
    /// - `Err(Error::UnexpectedResultCode)`: the walk hit an unknown code
    pub async fn resolve(
        &mut self,
        transport: &dyn RpcTransport,
        session: &Session,
        record_name: &str,
    ) -> Result<String> {
        let name = normalize_record_name(record_name);
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(Error::invalid_input(format!(
                "Invalid record name: '{}'",
                record_name
            )));
        }

        let key = cache_key(name);
        if let Some(zone) = self.cache.get(&key) {
            debug!("Zone for {} served from cache: {}", name, zone);
            return Ok(zone.clone());
        }

        for candidate in candidate_zones(name) {
            debug!("Checking whether {} is a zone", candidate);

            let response = transport
                .send(
                    "nameserver.info",
                    json!({ "domain": &candidate }),
                    Some(session),
                )
                .await?;

            match response.result_code() {
                ResultCode::Success | ResultCode::ObjectExists => {
                    debug!("Resolved zone for {}: {}", name, candidate);
                    self.cache.insert(key, candidate.clone());
                    return Ok(candidate);
                }
                ResultCode::ObjectDoesNotExist => continue,
                _ => {
                    return Err(Error::unexpected(
                        "nameserver.info",
                        &candidate,
                        response.code,
                        response.message(),
                    ));
                }
            }
        }

        Err(Error::zone_not_found(name))
    }
}

fn cache_key(record_name: &str) -> String {
    normalize_record_name(record_name).to_ascii_lowercase()
}
