use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::decode_all_or_partial;
use crate::decode_best_effort;
use crate::extract_record_id;
use crate::filter_direct_children;
use crate::time::timestamp_millis;
use crate::BatchedTxnResult;
use crate::BatchedWriter;
use crate::ChainRuntimeProperties;
use crate::DeploymentRuntimeProperties;
use crate::EngineState;
use crate::Error;
use crate::HttpKvStore;
use crate::IndexTracker;
use crate::KeysConfig;
use crate::KvEntry;
use crate::KvStore;
use crate::LibraryUpdate;
use crate::Result;
use crate::StoreIndex;
use crate::SyncConfig;
use crate::TxnOperation;
use crate::WatchedResource;
use crate::CHAINS_RUNTIME_RESOURCE;
use crate::DEPLOYMENTS_UPDATE_RESOURCE;
use crate::ENGINES_STATE_RESOURCE;

/// Result of one watch on a domain resource
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate<T> {
    /// Store index moved since the previous watch
    pub changed: bool,
    pub index: StoreIndex,
    pub value: T,
}

/// Domain view over the store: fleet state, deployment timestamps,
/// libraries and chain runtime properties.
///
/// Each watched resource has its own [`IndexTracker`], so the three
/// `wait_for_*` methods can be driven from independent loops.
pub struct SyncService {
    store: Arc<dyn KvStore>,
    writer: BatchedWriter,
    keys: KeysConfig,
    engines_state: IndexTracker,
    deployments_update: IndexTracker,
    chains_runtime: IndexTracker,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn KvStore>,
        config: &SyncConfig,
    ) -> Self {
        let keys = config.keys.clone();
        let wait = config.watch.wait_timeout();

        let engines_state = IndexTracker::new(
            store.clone(),
            WatchedResource::new(ENGINES_STATE_RESOURCE, keys.engines_state_key(), true),
            wait,
        );
        let deployments_update = IndexTracker::new(
            store.clone(),
            WatchedResource::new(DEPLOYMENTS_UPDATE_RESOURCE, keys.deployments_update_key(), false),
            wait,
        );
        let chains_runtime = IndexTracker::new(
            store.clone(),
            WatchedResource::new(CHAINS_RUNTIME_RESOURCE, keys.chains_runtime_key(), true),
            wait,
        );
        let writer = BatchedWriter::new(store.clone(), config.watch.max_txn_size, config.retry.txn_conflict);

        Self {
            store,
            writer,
            keys,
            engines_state,
            deployments_update,
            chains_runtime,
        }
    }

    /// Service over the HTTP store described by `config.store`
    pub fn connect(config: &SyncConfig) -> Result<Self> {
        let store = HttpKvStore::new(&config.store)?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn keys(&self) -> &KeysConfig {
        &self.keys
    }

    // ------------------------------------------------------------------
    // Deployments timestamp

    /// Publishes the current time as the deployments modification
    /// timestamp. Call only after the deployment change is durable.
    pub async fn update_deployments_timestamp(&self) -> Result<u64> {
        let now = timestamp_millis();
        debug!("[SyncService] update deployments modification timestamp to {now}");
        self.store
            .put(&self.keys.deployments_update_key(), now.to_string().into_bytes())
            .await?;
        Ok(now)
    }

    /// Watches the deployments timestamp key.
    ///
    /// No key content yields 0.
    ///
    /// # Errors
    /// [`Error::InvalidValue`] when the key lists more than one entry or
    /// holds something other than an integer.
    pub async fn wait_for_deployments_update(&self) -> Result<WatchUpdate<u64>> {
        let outcome = self.deployments_update.poll_once().await?;
        let key = self.keys.deployments_update_key();
        let value = parse_deployments_timestamp(&key, &outcome.entries)?;

        Ok(WatchUpdate {
            changed: outcome.changed,
            index: outcome.index,
            value,
        })
    }

    // ------------------------------------------------------------------
    // Engines state

    /// Single non-blocking read of the fleet state. Every error is logged
    /// and yields an empty list.
    pub async fn get_engines_state_safe(&self) -> Vec<EngineState> {
        let prefix = self.keys.engines_state_key();
        match self.store.get(&prefix, true).await {
            Ok(entries) => decode_engines_state(&prefix, &entries),
            Err(e) => {
                error!("[SyncService] Failed to get engines state: {e}");
                Vec::new()
            }
        }
    }

    /// Watches the fleet state prefix. Only direct children of the prefix
    /// are decoded; undecodable reports are dropped.
    pub async fn wait_for_engines_state_update(&self) -> Result<WatchUpdate<Vec<EngineState>>> {
        let outcome = self.engines_state.poll_once().await?;
        let value = decode_engines_state(&self.keys.engines_state_key(), &outcome.entries);

        Ok(WatchUpdate {
            changed: outcome.changed,
            index: outcome.index,
            value,
        })
    }

    // ------------------------------------------------------------------
    // Libraries

    pub async fn update_libraries(
        &self,
        libs: &[LibraryUpdate],
    ) -> Result<()> {
        debug!("[SyncService] update libraries, {} entries", libs.len());
        let value = serde_json::to_vec(libs)?;
        self.store.put(&self.keys.libraries_update_key(), value).await
    }

    // ------------------------------------------------------------------
    // Chain runtime properties

    pub async fn update_chain_runtime_config(
        &self,
        chain_id: &str,
        props: &DeploymentRuntimeProperties,
    ) -> Result<()> {
        let value = serde_json::to_vec(props)?;
        self.store.put(&self.keys.chain_runtime_key(chain_id), value).await
    }

    pub async fn delete_chain_runtime_config(
        &self,
        chain_id: &str,
    ) -> Result<()> {
        self.store.delete(&self.keys.chain_runtime_key(chain_id), false).await
    }

    /// Writes the properties of many chains through batched transactions.
    ///
    /// Writes above the transaction limit are NOT atomic: on failure,
    /// [`Error::PartialWrite`] tells which chunks were committed.
    pub async fn update_chains_runtime_config(
        &self,
        props: &ChainRuntimeProperties,
    ) -> Result<BatchedTxnResult> {
        let mut chain_ids: Vec<&String> = props.keys().collect();
        chain_ids.sort();

        let mut ops = Vec::with_capacity(chain_ids.len());
        for chain_id in chain_ids {
            let value = serde_json::to_vec(&props[chain_id])?;
            ops.push(TxnOperation::set(self.txn_key(chain_id), value));
        }

        info!(
            "[SyncService] update runtime properties of {} chains in chunks of {}",
            ops.len(),
            self.writer.max_txn_size()
        );
        Ok(self.writer.write(ops).await?)
    }

    /// Transaction keys are relative to the store root
    fn txn_key(
        &self,
        chain_id: &str,
    ) -> String {
        let key = self.keys.chain_runtime_key(chain_id);
        match key.strip_prefix('/') {
            Some(relative) => relative.to_string(),
            None => key,
        }
    }

    pub async fn chains_runtime_configuration_kv_exists(&self) -> Result<bool> {
        match self.store.get(&self.keys.chains_runtime_key(), true).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes the pre per-chain layout subtree
    pub async fn delete_legacy_chains_runtime_config_kv(&self) -> Result<()> {
        let key = self.keys.legacy_chains_runtime_key();
        info!("[SyncService] deleting legacy chains runtime configuration {key}");
        self.store.delete(&key, true).await
    }

    /// Single non-blocking read of every chain's runtime properties.
    ///
    /// # Errors
    /// - [`Error::NotFound`] when no chain has properties yet
    /// - [`Error::PartialDecode`] when any entry is undecodable; it carries
    ///   the decoded remainder
    pub async fn get_chain_runtime_config(&self) -> Result<ChainRuntimeProperties> {
        let entries = self.store.get(&self.keys.chains_runtime_key(), true).await?;
        self.decode_chains_runtime(&entries)
    }

    /// Watches the chain runtime properties listing.
    ///
    /// On [`Error::PartialDecode`] the index has already moved: keep the
    /// partial result, or call
    /// [`SyncService::rollback_chains_runtime_config_last_index`] to have
    /// the listing delivered again.
    pub async fn wait_for_chain_runtime_config(&self) -> Result<WatchUpdate<ChainRuntimeProperties>> {
        let outcome = self.chains_runtime.poll_once().await?;
        let value = self.decode_chains_runtime(&outcome.entries)?;

        Ok(WatchUpdate {
            changed: outcome.changed,
            index: outcome.index,
            value,
        })
    }

    pub fn rollback_chains_runtime_config_last_index(&self) -> Result<StoreIndex> {
        let index = self.chains_runtime.rollback()?;
        warn!("[SyncService] chains runtime properties index rolled back to {index}");
        Ok(index)
    }

    fn decode_chains_runtime(
        &self,
        entries: &[KvEntry],
    ) -> Result<ChainRuntimeProperties> {
        let marker = self.keys.runtime_configurations_marker();
        decode_all_or_partial(entries, |key| extract_record_id(key, marker)).map_err(|partial| {
            warn!(
                "[SyncService] failed to deserialize runtime properties of {} chain(s)",
                partial.failures.len()
            );
            Error::from(partial)
        })
    }
}

fn decode_engines_state(
    prefix: &str,
    entries: &[KvEntry],
) -> Vec<EngineState> {
    let reports: Vec<KvEntry> = entries
        .iter()
        .filter(|entry| filter_direct_children(prefix, &entry.key))
        .cloned()
        .collect();
    decode_best_effort(&reports)
}

fn parse_deployments_timestamp(
    key: &str,
    entries: &[KvEntry],
) -> Result<u64> {
    match entries {
        [] => Ok(0),
        [entry] => {
            let text = entry.decoded_value().map_err(|e| Error::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            match text {
                None => Ok(0),
                Some(text) => text.trim().parse::<u64>().map_err(|e| Error::InvalidValue {
                    key: key.to_string(),
                    reason: format!("{text:?} is not a timestamp: {e}"),
                }),
            }
        }
        _ => Err(Error::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a single entry, got {}", entries.len()),
        }),
    }
}
