use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use warp::http::HeaderMap;
use warp::http::Method;
use warp::hyper::body::Bytes;
use warp::path::FullPath;
use warp::Filter;

use crate::StoreConfig;

/// Request as seen by [`MockStoreServer`]
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn query_param(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

/// Response the mock server sends back, optionally after a delay
#[derive(Debug, Clone)]
pub(crate) struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            delay: None,
        }
    }

    /// Listing response with the store index header
    pub fn listing(
        index: u64,
        body: impl Into<String>,
    ) -> Self {
        Self::ok(body).with_header(crate::INDEX_HEADER, &index.to_string())
    }

    pub fn with_header(
        mut self,
        name: &str,
        value: &str,
    ) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn after(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Minimal HTTP stand-in for the coordination store.
///
/// Every request is recorded and answered by the supplied responder.
pub(crate) struct MockStoreServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    _shutdown: oneshot::Sender<()>,
}

impl MockStoreServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> CannedResponse + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder = Arc::new(responder);

        let recorded = requests.clone();
        let route = warp::any()
            .and(warp::method())
            .and(warp::path::full())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then(
                move |method: Method,
                      path: FullPath,
                      query: HashMap<String, String>,
                      headers: HeaderMap,
                      body: Bytes| {
                    let recorded = recorded.clone();
                    let responder = responder.clone();
                    async move {
                        let request = RecordedRequest {
                            method,
                            path: path.as_str().to_string(),
                            query,
                            headers,
                            body,
                        };
                        let canned = responder(&request);
                        recorded.lock().push(request);

                        if let Some(delay) = canned.delay {
                            tokio::time::sleep(delay).await;
                        }

                        let mut builder = warp::http::Response::builder().status(canned.status);
                        for (name, value) in &canned.headers {
                            builder = builder.header(name.as_str(), value.as_str());
                        }
                        Ok::<_, Infallible>(builder.body(canned.body).expect("valid response"))
                    }
                },
            );

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) =
            warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            requests,
            _shutdown: tx,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store_config(
        &self,
        token: &str,
    ) -> StoreConfig {
        StoreConfig {
            url: format!("{}/", self.url()),
            token: token.to_string(),
            ..StoreConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}
