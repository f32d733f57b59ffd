//! In-process stand-in for a Consul KV store: keys, a global modification
//! index, blocking queries and transactions.
//!
//! Like Consul, any `recurse` query parameter turns a read or delete into a
//! prefix operation, whatever its value.
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fleet_sync::SyncConfig;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::sync::watch;
use warp::http::Response;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::path::Tail;
use warp::Filter;

pub const TOKEN: &str = "integration-token";

#[derive(Default)]
struct KvState {
    /// key -> (value, modify index)
    entries: BTreeMap<String, (Vec<u8>, u64)>,
    index: u64,
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<KvState>>,
    index_tx: Arc<watch::Sender<u64>>,
}

impl Shared {
    fn bump(
        &self,
        state: &mut KvState,
    ) -> u64 {
        state.index += 1;
        let _ = self.index_tx.send(state.index);
        state.index
    }

    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
    ) {
        let mut state = self.state.lock();
        let index = self.bump(&mut state);
        state.entries.insert(key.to_string(), (value, index));
    }

    fn delete(
        &self,
        key: &str,
        recurse: bool,
    ) {
        let mut state = self.state.lock();
        if recurse {
            state.entries.retain(|k, _| !k.starts_with(key));
        } else {
            state.entries.remove(key);
        }
        self.bump(&mut state);
    }

    fn listing(
        &self,
        key: &str,
        recurse: bool,
    ) -> (u64, Vec<Value>) {
        let state = self.state.lock();
        let entries = state
            .entries
            .iter()
            .filter(|(k, _)| if recurse { k.starts_with(key) } else { k.as_str() == key })
            .map(|(k, (value, index))| {
                json!({
                    "Key": k,
                    "Value": STANDARD.encode(value),
                    "CreateIndex": index,
                    "ModifyIndex": index,
                    "Flags": 0,
                })
            })
            .collect();
        (state.index, entries)
    }
}

pub struct FakeConsul {
    pub addr: SocketAddr,
    shared: Shared,
    _shutdown: oneshot::Sender<()>,
}

fn parse_wait(wait: Option<&String>) -> Duration {
    let Some(wait) = wait else {
        return Duration::ZERO;
    };
    if let Some(ms) = wait.strip_suffix("ms") {
        return Duration::from_millis(ms.parse().unwrap_or(0));
    }
    Duration::from_secs(wait.trim_end_matches('s').parse().unwrap_or(0))
}

fn reply(
    status: StatusCode,
    index: Option<u64>,
    body: String,
) -> Response<String> {
    let mut builder = Response::builder().status(status);
    if let Some(index) = index {
        builder = builder.header("X-Consul-Index", index.to_string());
    }
    builder.body(body).expect("valid response")
}

impl FakeConsul {
    pub async fn start() -> Self {
        let (index_tx, _) = watch::channel(0u64);
        let shared = Shared {
            state: Arc::new(Mutex::new(KvState::default())),
            index_tx: Arc::new(index_tx),
        };

        let with_shared = {
            let shared = shared.clone();
            warp::any().map(move || shared.clone())
        };
        let authorized = warp::header::exact("X-Consul-Token", TOKEN);

        let kv_get = warp::get()
            .and(warp::path!("v1" / "kv" / ..))
            .and(warp::path::tail())
            .and(warp::query::<HashMap<String, String>>())
            .and(with_shared.clone())
            .and_then(
                |tail: Tail, query: HashMap<String, String>, shared: Shared| async move {
                    let key = tail.as_str().to_string();
                    let recurse = query.contains_key("recurse");
                    let since: u64 = query.get("index").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let wait = parse_wait(query.get("wait"));

                    let mut index_rx = shared.index_tx.subscribe();
                    if since > 0 && *index_rx.borrow_and_update() <= since {
                        let _ = tokio::time::timeout(wait, index_rx.changed()).await;
                    }

                    let (index, entries) = shared.listing(&key, recurse);
                    let response = if entries.is_empty() {
                        reply(StatusCode::NOT_FOUND, Some(index), String::new())
                    } else {
                        reply(StatusCode::OK, Some(index), Value::Array(entries).to_string())
                    };
                    Ok::<_, Infallible>(response)
                },
            );

        let kv_put = warp::put()
            .and(warp::path!("v1" / "kv" / ..))
            .and(warp::path::tail())
            .and(warp::body::bytes())
            .and(with_shared.clone())
            .map(|tail: Tail, body: Bytes, shared: Shared| {
                shared.set(tail.as_str(), body.to_vec());
                reply(StatusCode::OK, None, "true".to_string())
            });

        let kv_delete = warp::delete()
            .and(warp::path!("v1" / "kv" / ..))
            .and(warp::path::tail())
            .and(warp::query::<HashMap<String, String>>())
            .and(with_shared.clone())
            .map(|tail: Tail, query: HashMap<String, String>, shared: Shared| {
                let recurse = query.contains_key("recurse");
                shared.delete(tail.as_str(), recurse);
                reply(StatusCode::OK, None, "true".to_string())
            });

        let txn = warp::put()
            .and(warp::path!("v1" / "txn"))
            .and(warp::body::json::<Vec<Value>>())
            .and(with_shared.clone())
            .map(|ops: Vec<Value>, shared: Shared| {
                if ops.len() > 64 {
                    return reply(StatusCode::PAYLOAD_TOO_LARGE, None, "too many ops".into());
                }
                let mut results = Vec::new();
                for op in &ops {
                    let kv = &op["KV"];
                    let key = kv["Key"].as_str().unwrap_or_default();
                    match kv["Verb"].as_str() {
                        Some("set") => {
                            let value = STANDARD
                                .decode(kv["Value"].as_str().unwrap_or_default())
                                .unwrap_or_default();
                            shared.set(key, value);
                            results.push(json!({"KV": {"Key": key}}));
                        }
                        Some("delete") => shared.delete(key, false),
                        Some("delete-tree") => shared.delete(key, true),
                        _ => {}
                    }
                }
                reply(
                    StatusCode::OK,
                    None,
                    json!({"Results": results, "Errors": null}).to_string(),
                )
            });

        let routes = authorized.and(kv_get.or(kv_put).or(kv_delete).or(txn));

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            let _ = rx.await;
        });
        tokio::spawn(server);

        Self {
            addr,
            shared,
            _shutdown: tx,
        }
    }

    /// Writes a key directly, bypassing the client under test
    pub fn seed(
        &self,
        key: &str,
        value: &str,
    ) {
        self.shared
            .set(key.trim_start_matches('/'), value.as_bytes().to_vec());
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.shared
            .state
            .lock()
            .entries
            .contains_key(key.trim_start_matches('/'))
    }

    pub fn index(&self) -> u64 {
        self.shared.state.lock().index
    }

    /// Service configuration pointing at this store, with a short wait
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.store.url = format!("http://{}", self.addr);
        config.store.token = TOKEN.to_string();
        config.watch.wait_timeout_in_secs = 2;
        config
    }
}
