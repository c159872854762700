//! Test doubles and common utilities for contract tests
//!
//! `MockProvider` is an in-memory stand-in for the provider API. It keeps
//! zones and TXT records, answers the six methods the core uses with the
//! provider's result codes, and records every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use dns01_core::error::{Error, Result};
use dns01_core::{Credentials, RpcResponse, RpcTransport, Session};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Session cookie handed out by the mock on login
pub const MOCK_SESSION_COOKIE: &str = "domrobot=mock-session";

/// One call received by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    id: u64,
    zone: String,
    name: String,
    content: String,
    ttl: u32,
}

#[derive(Debug)]
struct ProviderState {
    zones: HashSet<String>,
    zone_exists_code: u32,
    records: Vec<StoredRecord>,
    next_record_id: u64,
    calls: Vec<RecordedCall>,
    overrides: HashMap<String, u32>,
    transport_failures: HashSet<String>,
    login_payload: Option<Value>,
    record_query: Option<RpcResponse>,
}

/// In-memory provider API
///
/// Clones share state, so a test can keep one handle for assertions while
/// the provisioner owns another.
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                zones: HashSet::new(),
                zone_exists_code: 1000,
                records: Vec::new(),
                next_record_id: 1,
                calls: Vec::new(),
                overrides: HashMap::new(),
                transport_failures: HashSet::new(),
                login_payload: None,
                record_query: None,
            })),
        }
    }

    /// Host `zone`
    pub fn with_zone(self, zone: &str) -> Self {
        self.state.lock().unwrap().zones.insert(zone.to_string());
        self
    }

    /// Code returned for an existing zone (1000 or 2302)
    pub fn with_zone_exists_code(self, code: u32) -> Self {
        self.state.lock().unwrap().zone_exists_code = code;
        self
    }

    /// Answer every call to `method` with `code` and no payload
    pub fn respond_with(self, method: &str, code: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .overrides
            .insert(method.to_string(), code);
        self
    }

    /// Fail every call to `method` at the transport level
    pub fn fail_transport(self, method: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .transport_failures
            .insert(method.to_string());
        self
    }

    /// `resData` returned by a successful login
    pub fn with_login_payload(self, payload: Value) -> Self {
        self.state.lock().unwrap().login_payload = Some(payload);
        self
    }

    /// Answer record queries (`nameserver.info` with a `name`) with `code`
    ///
    /// Zone-existence lookups are unaffected.
    pub fn with_record_query_code(self, code: u32) -> Self {
        self.state.lock().unwrap().record_query = Some(RpcResponse::with_code(code));
        self
    }

    /// Answer record queries with a successful response carrying `payload`
    pub fn with_record_query_payload(self, payload: Value) -> Self {
        self.state.lock().unwrap().record_query =
            Some(RpcResponse::with_code(1000).with_payload(payload));
        self
    }

    /// Store a TXT record directly, returning its id
    pub fn seed_txt(&self, zone: &str, name: &str, content: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_record_id;
        state.next_record_id += 1;
        state.records.push(StoredRecord {
            id,
            zone: zone.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: 3600,
        });
        id
    }

    /// Contents of the TXT records stored under `zone` / `name`
    pub fn txt_contents(&self, zone: &str, name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.zone == zone && r.name == name)
            .map(|r| r.content.clone())
            .collect()
    }

    /// TTLs of the TXT records stored under `zone` / `name`
    pub fn txt_ttls(&self, zone: &str, name: &str) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.zone == zone && r.name == name)
            .map(|r| r.ttl)
            .collect()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls received for `method`
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    /// Total number of calls received
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Domains queried by zone-existence lookups, in order
    pub fn zone_lookups(&self) -> Vec<String> {
        self.calls_to("nameserver.info")
            .into_iter()
            .filter(|call| call.params.get("name").is_none())
            .filter_map(|call| call.params["domain"].as_str().map(str::to_string))
            .collect()
    }

    /// A boxed handle sharing this mock's state
    pub fn boxed(&self) -> Box<dyn RpcTransport> {
        Box::new(self.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcTransport for MockProvider {
    async fn send(
        &self,
        method: &str,
        params: Value,
        session: Option<&Session>,
    ) -> Result<RpcResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            method: method.to_string(),
            params: params.clone(),
            session_token: session.and_then(|s| s.token().map(str::to_string)),
        });

        if state.transport_failures.contains(method) {
            return Err(Error::transport(method, "connection reset by peer"));
        }
        if let Some(code) = state.overrides.get(method) {
            return Ok(RpcResponse::with_code(*code));
        }
        if method != "account.login" && session.is_none() {
            return Ok(RpcResponse::with_code(2200));
        }

        let response = match method {
            "account.login" => {
                let mut response = RpcResponse::with_code(1000);
                response.session_token = Some(MOCK_SESSION_COOKIE.to_string());
                response.payload = state.login_payload.clone();
                response
            }
            "account.logout" => RpcResponse::with_code(1500),
            "nameserver.info" => info(&state, &params),
            "nameserver.createRecord" => {
                let zone = params["domain"].as_str().unwrap_or_default().to_string();
                if !state.zones.contains(&zone) {
                    return Ok(RpcResponse::with_code(2303));
                }
                let id = state.next_record_id;
                state.next_record_id += 1;
                state.records.push(StoredRecord {
                    id,
                    zone,
                    name: params["name"].as_str().unwrap_or_default().to_string(),
                    content: params["content"].as_str().unwrap_or_default().to_string(),
                    ttl: params["ttl"].as_u64().unwrap_or(3600) as u32,
                });
                RpcResponse::with_code(1000).with_payload(json!({ "id": id }))
            }
            "nameserver.updateRecord" => {
                let id = params["id"].as_u64();
                match state.records.iter_mut().find(|r| Some(r.id) == id) {
                    Some(record) => {
                        record.content = params["content"].as_str().unwrap_or_default().to_string();
                        record.ttl = params["ttl"].as_u64().unwrap_or(3600) as u32;
                        RpcResponse::with_code(1000)
                    }
                    None => RpcResponse::with_code(2303),
                }
            }
            "nameserver.deleteRecord" => {
                let id = params["id"].as_u64();
                let before = state.records.len();
                state.records.retain(|r| Some(r.id) != id);
                if state.records.len() < before {
                    RpcResponse::with_code(1000)
                } else {
                    RpcResponse::with_code(2303)
                }
            }
            _ => RpcResponse::with_code(2400),
        };

        Ok(response)
    }

    fn endpoint(&self) -> &str {
        "mock://provider"
    }
}

fn info(state: &ProviderState, params: &Value) -> RpcResponse {
    let domain = params["domain"].as_str().unwrap_or_default();
    if !state.zones.contains(domain) {
        return RpcResponse::with_code(2303);
    }

    let in_zone = state.records.iter().filter(|r| r.zone == domain);

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return RpcResponse::with_code(state.zone_exists_code)
            .with_payload(json!({ "domain": domain, "count": in_zone.count() }));
    };

    if let Some(response) = &state.record_query {
        return response.clone();
    }

    let content = params.get("content").and_then(Value::as_str);
    let matching: Vec<Value> = in_zone
        .filter(|r| r.name.eq_ignore_ascii_case(name))
        .filter(|r| content.is_none_or(|c| r.content == c))
        .map(|r| {
            json!({
                "id": r.id,
                "name": format!("{}.{}", r.name, r.zone),
                "type": "TXT",
                "content": r.content,
                "ttl": r.ttl,
                "prio": 0,
            })
        })
        .collect();

    let mut payload = json!({ "domain": domain, "count": matching.len() });
    if !matching.is_empty() {
        payload["record"] = Value::Array(matching);
    }
    RpcResponse::with_code(1000).with_payload(payload)
}

/// Credentials accepted by the mock
pub fn credentials() -> Credentials {
    Credentials::new("alice", "hunter2")
}

/// A session as the mock would hand it out
pub fn mock_session() -> Session {
    Session::new("alice", Some(MOCK_SESSION_COOKIE.to_string()))
}
