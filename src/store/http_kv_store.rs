use std::time::Duration;

use async_trait::async_trait;
use config::ConfigError;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::format_wait;
use super::KvEntry;
use super::KvStore;
use super::StoreIndex;
use super::TxnOperation;
use super::TxnResponse;
use super::WatchResponse;
use crate::metrics::STORE_REQUESTS_METRIC;
use crate::Error;
use crate::Result;
use crate::StoreConfig;
use crate::TransportError;
use crate::INDEX_HEADER;
use crate::KV_PATH;
use crate::MAX_TXN_SIZE;
use crate::TOKEN_HEADER;
use crate::TXN_PATH;
use crate::WRITE_ACK;

/// Extra time granted to a blocking watch on top of its wait time, so the
/// client never gives up before the store answers
const WATCH_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// [`KvStore`] over a Consul-compatible HTTP API
#[derive(Clone)]
pub struct HttpKvStore {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpKvStore {
    /// Builds the HTTP client. The token is installed as a default header so
    /// every request carries it.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.token.is_empty() {
            let mut token = HeaderValue::from_str(&config.token)
                .map_err(|e| ConfigError::Message(format!("store token is not a valid header: {e}")))?;
            token.set_sensitive(true);
            headers.insert(TOKEN_HEADER, token);
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .default_headers(headers)
            .build()?;

        let base_url = config.base_url().to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(TransportError::InvalidUrl(base_url).into());
        }

        Ok(Self {
            client,
            base_url,
            request_timeout: config.request_timeout(),
        })
    }

    fn kv_url(
        &self,
        key: &str,
    ) -> String {
        if key.starts_with('/') {
            format!("{}{}{}", self.base_url, KV_PATH, key)
        } else {
            format!("{}{}/{}", self.base_url, KV_PATH, key)
        }
    }

    /// Put/delete share the same contract: 200 plus a `true` body
    async fn expect_ack(
        op: &'static str,
        key: &str,
        response: Response,
    ) -> Result<()> {
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            error!(
                "[HttpKvStore::{op}] key={key} failed, code: {status}, body: {body}"
            );
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        if !body.trim().eq_ignore_ascii_case(WRITE_ACK) {
            error!("[HttpKvStore::{op}] key={key} not acknowledged, body: {body}");
            return Err(TransportError::NotAcknowledged { body }.into());
        }

        Ok(())
    }
}

/// The store treats a present `recurse` parameter as recursive whatever its
/// value, so it is only sent when set.
fn recurse_param(recurse: bool) -> &'static [(&'static str, &'static str)] {
    if recurse {
        &[("recurse", "true")]
    } else {
        &[]
    }
}

fn parse_index(response: &Response) -> Result<StoreIndex> {
    let header = response
        .headers()
        .get(INDEX_HEADER)
        .ok_or(TransportError::MissingIndexHeader(INDEX_HEADER))?;

    let value = header
        .to_str()
        .map_err(|_| TransportError::InvalidIndexHeader(format!("{header:?}")))?;

    value
        .trim()
        .parse::<u64>()
        .map(StoreIndex)
        .map_err(|_| TransportError::InvalidIndexHeader(value.to_string()).into())
}

#[async_trait]
impl KvStore for HttpKvStore {
    async fn get(
        &self,
        key: &str,
        recurse: bool,
    ) -> Result<Vec<KvEntry>> {
        Ok(self
            .list("get", key, recurse, StoreIndex::ZERO, Duration::ZERO)
            .await?
            .entries)
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> Result<()> {
        STORE_REQUESTS_METRIC.with_label_values(&["put"]).inc();

        let response = self
            .client
            .put(self.kv_url(key))
            .timeout(self.request_timeout)
            .body(value)
            .send()
            .await?;

        Self::expect_ack("put", key, response).await
    }

    async fn delete(
        &self,
        key: &str,
        recurse: bool,
    ) -> Result<()> {
        STORE_REQUESTS_METRIC.with_label_values(&["delete"]).inc();

        let response = self
            .client
            .delete(self.kv_url(key))
            .query(recurse_param(recurse))
            .timeout(self.request_timeout)
            .send()
            .await?;

        Self::expect_ack("delete", key, response).await
    }

    async fn watch(
        &self,
        key: &str,
        recurse: bool,
        since: StoreIndex,
        wait: Duration,
    ) -> Result<WatchResponse> {
        self.list("watch", key, recurse, since, wait).await
    }

    async fn transaction(
        &self,
        ops: Vec<TxnOperation>,
    ) -> Result<TxnResponse> {
        STORE_REQUESTS_METRIC.with_label_values(&["txn"]).inc();

        if ops.len() > MAX_TXN_SIZE {
            return Err(Error::Fatal(format!(
                "transaction of {} operations exceeds store limit of {}",
                ops.len(),
                MAX_TXN_SIZE
            )));
        }

        let wire: Vec<_> = ops.iter().map(TxnOperation::to_wire).collect();
        let response = self
            .client
            .put(format!("{}{}", self.base_url, TXN_PATH))
            .timeout(self.request_timeout)
            .json(&wire)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::CONFLICT {
            warn!("[HttpKvStore::transaction] failed with code 409 conflict: {body}");
            return Err(Error::Conflict { message: body });
        }

        if status != StatusCode::OK {
            error!("[HttpKvStore::transaction] failed, code: {status}, body: {body}");
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: TxnResponse = serde_json::from_str(&body).map_err(|e| {
            error!("[HttpKvStore::transaction] unreadable response body: {body}");
            Error::Serialization(e)
        })?;

        if let Some(errors) = parsed.errors.as_ref().filter(|errors| !errors.is_empty()) {
            let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
            error!("[HttpKvStore::transaction] response errors: {errors:?}");
            return Err(TransportError::StoreErrors { errors }.into());
        }

        Ok(parsed)
    }
}

impl HttpKvStore {
    /// Listing request shared by `get` and `watch`, counted under `op`
    async fn list(
        &self,
        op: &'static str,
        key: &str,
        recurse: bool,
        since: StoreIndex,
        wait: Duration,
    ) -> Result<WatchResponse> {
        STORE_REQUESTS_METRIC.with_label_values(&[op]).inc();

        let response = self
            .client
            .get(self.kv_url(key))
            .query(recurse_param(recurse))
            .query(&[("index", since.to_string()), ("wait", format_wait(wait))])
            .timeout(wait.max(self.request_timeout) + WATCH_TIMEOUT_MARGIN)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("[HttpKvStore::list] key={key} not present in store");
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("[HttpKvStore::list] key={key} failed, code: {status}, body: {body}");
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let index = parse_index(&response)?;
        let body = response.bytes().await?;
        let entries = if body.is_empty() {
            Vec::new()
        } else {
            serde_json::from_slice::<Option<Vec<KvEntry>>>(&body)?.unwrap_or_default()
        };

        debug!(
            "[HttpKvStore::list] key={key} since={since} -> index={index}, {} entries",
            entries.len()
        );
        Ok(WatchResponse { index, entries })
    }
}
