// # TXT Record Reconciliation
//
// Create-or-update and find-and-delete of challenge TXT records inside the
// zone that `ZoneResolver` finds for them.
//
// ## Idempotency
//
// - `upsert` updates every TXT record already present under the short name,
//   and only creates one when none exists. Calling it twice never creates two.
// - `remove` deletes every record whose content matches exactly. Removing a
//   record that is not there succeeds without any delete call.
//
// ## API Calls
//
// ```text
// nameserver.info          domain, type=TXT, name=<short>[, content=<value>]
// nameserver.createRecord  domain, type=TXT, name=<short>, content, ttl=300
// nameserver.updateRecord  id, type=TXT, content, ttl=300
// nameserver.deleteRecord  id
// ```

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::TXT_RECORD_TTL;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::traits::{ResultCode, RpcTransport};
use crate::zone::{ZoneResolver, normalize_record_name};

/// Record type managed by this module
pub const TXT: &str = "TXT";

/// A TXT record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecord {
    /// Provider-assigned identifier
    pub id: u64,
    /// Zone holding the record
    pub zone: String,
    /// Record name relative to the zone
    pub name: String,
    /// Record content
    pub content: String,
    /// Time-to-live, when reported
    pub ttl: Option<u32>,
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed, one was created
    Created {
        /// Identifier of the new record, when reported
        id: Option<u64>,
    },
    /// Existing records were updated in place
    Updated {
        /// Identifiers of every updated record
        ids: Vec<u64>,
    },
}

/// Record name relative to `zone`
///
/// The zone suffix is matched case-insensitively and must sit on a label
/// boundary.
pub fn short_name(record_name: &str, zone: &str) -> Result<String> {
    let name = normalize_record_name(record_name);
    let zone = normalize_record_name(zone);

    let prefix = name
        .len()
        .checked_sub(zone.len())
        .and_then(|split| {
            let suffix = name.get(split..)?;
            suffix.eq_ignore_ascii_case(zone).then(|| &name[..split])
        })
        .filter(|prefix| prefix.is_empty() || prefix.ends_with('.'))
        .ok_or_else(|| {
            Error::invalid_input(format!("Record {} is not inside zone {}", name, zone))
        })?;

    Ok(prefix.trim_end_matches('.').to_string())
}

/// TXT record operations for one provisioning run
///
/// Borrows the run's transport, active session and zone resolver; the
/// session borrow is what makes record calls impossible before login.
pub struct TxtRecordManager<'a> {
    transport: &'a dyn RpcTransport,
    session: &'a Session,
    zones: &'a mut ZoneResolver,
}

impl<'a> TxtRecordManager<'a> {
    /// Create a manager bound to an active session
    pub fn new(
        transport: &'a dyn RpcTransport,
        session: &'a Session,
        zones: &'a mut ZoneResolver,
    ) -> Self {
        Self {
            transport,
            session,
            zones,
        }
    }

    /// TXT records under `record_name`, optionally only those with `content`
    pub async fn find(&mut self, record_name: &str, content: Option<&str>) -> Result<Vec<TxtRecord>> {
        let (zone, short) = self.locate(record_name).await?;
        self.query(record_name, &zone, &short, content).await
    }

    /// Create the TXT record, or update every existing one to `value`
    pub async fn upsert(&mut self, record_name: &str, value: &str) -> Result<UpsertOutcome> {
        let (zone, short) = self.locate(record_name).await?;
        let existing = self.query(record_name, &zone, &short, None).await?;

        if existing.is_empty() {
            let response = self
                .transport
                .send(
                    "nameserver.createRecord",
                    json!({
                        "domain": &zone,
                        "type": TXT,
                        "name": &short,
                        "content": value,
                        "ttl": TXT_RECORD_TTL,
                    }),
                    Some(self.session),
                )
                .await?;

            if response.result_code() != ResultCode::Success {
                return Err(Error::operation(
                    "nameserver.createRecord",
                    record_name,
                    response.code,
                    response.message(),
                ));
            }

            let id = response
                .payload
                .as_ref()
                .and_then(|data| data.get("id"))
                .and_then(id_from_value);

            info!("Created TXT record {} in zone {}", record_name, zone);
            return Ok(UpsertOutcome::Created { id });
        }

        let mut ids = Vec::with_capacity(existing.len());
        for record in existing {
            let response = self
                .transport
                .send(
                    "nameserver.updateRecord",
                    json!({
                        "id": record.id,
                        "type": TXT,
                        "content": value,
                        "ttl": TXT_RECORD_TTL,
                    }),
                    Some(self.session),
                )
                .await?;

            if response.result_code() != ResultCode::Success {
                return Err(Error::operation(
                    "nameserver.updateRecord",
                    record_name,
                    response.code,
                    response.message(),
                ));
            }
            ids.push(record.id);
        }

        info!(
            "Updated {} TXT record(s) {} in zone {}",
            ids.len(),
            record_name,
            zone
        );
        Ok(UpsertOutcome::Updated { ids })
    }

    /// Delete every TXT record under `record_name` whose content is `value`
    ///
    /// Returns the number of records deleted; zero is a success.
    pub async fn remove(&mut self, record_name: &str, value: &str) -> Result<usize> {
        let (zone, short) = self.locate(record_name).await?;
        let matching = self.query(record_name, &zone, &short, Some(value)).await?;

        if matching.is_empty() {
            debug!("No matching TXT record {} to remove", record_name);
            return Ok(0);
        }

        for record in &matching {
            let response = self
                .transport
                .send(
                    "nameserver.deleteRecord",
                    json!({ "id": record.id }),
                    Some(self.session),
                )
                .await?;

            if response.result_code() != ResultCode::Success {
                return Err(Error::operation(
                    "nameserver.deleteRecord",
                    record_name,
                    response.code,
                    response.message(),
                ));
            }
        }

        info!(
            "Deleted {} TXT record(s) {} in zone {}",
            matching.len(),
            record_name,
            zone
        );
        Ok(matching.len())
    }

    async fn locate(&mut self, record_name: &str) -> Result<(String, String)> {
        let zone = self
            .zones
            .resolve(self.transport, self.session, record_name)
            .await?;
        let short = short_name(record_name, &zone)?;
        Ok((zone, short))
    }

    async fn query(
        &self,
        record_name: &str,
        zone: &str,
        short: &str,
        content: Option<&str>,
    ) -> Result<Vec<TxtRecord>> {
        let mut params = json!({ "domain": zone, "type": TXT, "name": short });
        if let Some(content) = content {
            params["content"] = Value::String(content.to_string());
        }

        let response = self
            .transport
            .send("nameserver.info", params, Some(self.session))
            .await?;

        match response.result_code() {
            ResultCode::Success | ResultCode::ObjectExists => {}
            ResultCode::ObjectDoesNotExist => return Ok(Vec::new()),
            _ => {
                return Err(Error::unexpected(
                    "nameserver.info",
                    record_name,
                    response.code,
                    response.message(),
                ));
            }
        }

        let info: InfoPayload = match response.payload {
            Some(payload) => serde_json::from_value(payload).map_err(|e| {
                Error::transport(
                    "nameserver.info",
                    format!("invalid record list for {}: {}", record_name, e),
                )
            })?,
            None => InfoPayload::default(),
        };

        let records: Vec<TxtRecord> = info
            .record
            .into_iter()
            .filter(|entry| {
                entry
                    .record_type
                    .as_deref()
                    .is_none_or(|kind| kind.eq_ignore_ascii_case(TXT))
            })
            .map(|entry| TxtRecord {
                id: entry.id,
                zone: zone.to_string(),
                name: short.to_string(),
                content: entry.content,
                ttl: entry.ttl,
            })
            .collect();

        debug!(
            "Found {} TXT record(s) for {} in zone {}",
            records.len(),
            record_name,
            zone
        );
        Ok(records)
    }
}

/// `resData` of a record query
#[derive(Debug, Default, Deserialize)]
struct InfoPayload {
    #[serde(default)]
    record: Vec<InfoRecord>,
}

#[derive(Debug, Deserialize)]
struct InfoRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: u64,
    #[serde(default, rename = "type")]
    record_type: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: Option<u32>,
}

/// Record ids arrive as numbers, occasionally as numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    match WireId::deserialize(deserializer)? {
        WireId::Number(id) => Ok(id),
        WireId::Text(id) => id.parse().map_err(serde::de::Error::custom),
    }
}

fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(id) => id.as_u64(),
        Value::String(id) => id.parse().ok(),
        _ => None,
    }
}
