#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rest_storage::{LockPolicy, RestStorage, StorageConfig, Transport, TransportResponse};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "test-token";

struct Entry {
    value: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory stand-in for the remote store, speaking the same status codes.
///
/// Locks are single-holder per key, keys are listed in lexical order.
#[derive(Clone, Default)]
pub struct FakeRemote {
    entries: Arc<Mutex<BTreeMap<String, Entry>>>,
    locks: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.lock().unwrap().contains(key)
    }

    fn handle(&self, operation: &str, body: &Value) -> (u16, Value) {
        let key = body["key"].as_str().unwrap_or_default().to_string();

        match operation {
            "lock" => {
                if self.locks.lock().unwrap().insert(key) {
                    (201, Value::Null)
                } else {
                    (412, Value::Null)
                }
            }
            "unlock" => {
                if self.locks.lock().unwrap().remove(&key) {
                    (204, Value::Null)
                } else {
                    (404, Value::Null)
                }
            }
            "store" => {
                let Some(value) = body["value"].as_str() else {
                    return (400, Value::Null);
                };
                let Ok(value) = STANDARD.decode(value) else {
                    return (400, Value::Null);
                };
                self.entries.lock().unwrap().insert(
                    key,
                    Entry {
                        value,
                        modified: Utc::now(),
                    },
                );
                (201, Value::Null)
            }
            "load" => match self.entries.lock().unwrap().get(&key) {
                Some(entry) => (200, json!({ "value": STANDARD.encode(&entry.value) })),
                None => (404, Value::Null),
            },
            "delete" => match self.entries.lock().unwrap().remove(&key) {
                Some(_) => (204, Value::Null),
                None => (404, Value::Null),
            },
            "exists" => {
                let exists = self.entries.lock().unwrap().contains_key(&key);
                (200, json!({ "exists": exists }))
            }
            "list" => {
                let prefix = body["prefix"].as_str().unwrap_or_default();
                let recursive = body["recursive"].as_bool().unwrap_or(false);
                let keys: Vec<String> = self
                    .entries
                    .lock()
                    .unwrap()
                    .keys()
                    .filter(|k| k.starts_with(prefix))
                    .filter(|k| recursive || !k[prefix.len()..].contains('/'))
                    .cloned()
                    .collect();
                if keys.is_empty() {
                    (404, Value::Null)
                } else {
                    (200, json!({ "keys": keys }))
                }
            }
            "stat" => match self.entries.lock().unwrap().get(&key) {
                Some(entry) => (
                    200,
                    json!({
                        "key": key,
                        "modified": entry.modified.to_rfc3339(),
                        "size": entry.value.len(),
                        "isTerminal": true
                    }),
                ),
                None => (404, Value::Null),
            },
            _ => (404, Value::Null),
        }
    }
}

#[async_trait]
impl Transport for FakeRemote {
    async fn post_json(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> rest_storage::Result<TransportResponse> {
        // let other tasks interleave like a real round trip would
        tokio::task::yield_now().await;

        let operation = url.rsplit('/').next().unwrap_or_default().to_string();
        *self.calls.lock().unwrap().entry(operation.clone()).or_default() += 1;

        let body: Value = match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(_) => return Ok(response(400, Value::Null)),
        };
        if body["token"] != TOKEN {
            return Ok(response(401, Value::Null));
        }

        let (status, reply) = self.handle(&operation, &body);
        Ok(response(status, reply))
    }
}

fn response(status: u16, body: Value) -> TransportResponse {
    let body = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(&body).unwrap()
    };
    TransportResponse { status, body }
}

pub fn test_config(endpoint: &str) -> StorageConfig {
    StorageConfig::new(endpoint, TOKEN).with_lock_policy(LockPolicy::fixed(Duration::from_millis(5)))
}

pub fn fake_storage(remote: &FakeRemote) -> RestStorage {
    RestStorage::with_transport(
        test_config("https://storage.invalid/certmagic/"),
        Arc::new(remote.clone()),
    )
    .unwrap()
}

/// Operation names are appended verbatim, so the mock server's base URL gets a `/`.
pub fn http_storage(base_url: &str) -> RestStorage {
    RestStorage::new(test_config(&format!("{}/", base_url))).unwrap()
}
