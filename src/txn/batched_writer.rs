use std::ops::Range;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::async_task::task_with_timeout_and_exponential_backoff;
use crate::metrics::TXN_CHUNKS_METRIC;
use crate::BackoffPolicy;
use crate::Error;
use crate::KvStore;
use crate::TxnOperation;
use crate::TxnResponse;
use crate::MAX_TXN_SIZE;

/// Outcome of one committed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Position of the chunk, 0-based
    pub chunk: usize,
    /// Operations submitted in this chunk
    pub operations: usize,
    pub response: TxnResponse,
}

/// Every chunk committed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchedTxnResult {
    pub chunks: Vec<ChunkOutcome>,
}

impl BatchedTxnResult {
    /// All chunk responses concatenated in submission order
    pub fn merged(&self) -> TxnResponse {
        let mut merged = TxnResponse::default();
        for outcome in &self.chunks {
            merged.merge(outcome.response.clone());
        }
        merged
    }

    pub fn total_operations(&self) -> usize {
        self.chunks.iter().map(|c| c.operations).sum()
    }
}

/// A chunk failed; earlier chunks are committed and stay committed
#[derive(Debug, thiserror::Error)]
#[error(
    "Chunk {failed_chunk} of {total_chunks} failed after {} committed chunk(s): {source}",
    .committed.len()
)]
pub struct BatchedTxnError {
    /// Chunks applied by the store before the failure
    pub committed: Vec<ChunkOutcome>,
    /// Position of the chunk that failed, 0-based
    pub failed_chunk: usize,
    pub total_chunks: usize,
    #[source]
    pub source: Box<Error>,
}

impl BatchedTxnError {
    /// Chunks that were not applied: the failed one and everything after it
    pub fn not_completed(&self) -> Range<usize> {
        self.failed_chunk..self.total_chunks
    }

    /// Operations already applied by the store
    pub fn committed_operations(&self) -> usize {
        self.committed.iter().map(|c| c.operations).sum()
    }

    /// Whether the failed chunk hit a conflict and may be resubmitted
    pub fn is_conflict(&self) -> bool {
        self.source.is_retryable()
    }
}

/// Splits write sets into store-sized transactions and submits them in order
#[derive(Clone)]
pub struct BatchedWriter {
    store: Arc<dyn KvStore>,
    max_txn_size: usize,
    conflict_retry: BackoffPolicy,
}

impl BatchedWriter {
    /// `max_txn_size` is clamped to `1..=MAX_TXN_SIZE`.
    /// `conflict_retry.max_retries == 0` disables resubmission on conflict.
    pub fn new(
        store: Arc<dyn KvStore>,
        max_txn_size: usize,
        conflict_retry: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            max_txn_size: max_txn_size.clamp(1, MAX_TXN_SIZE),
            conflict_retry,
        }
    }

    pub fn max_txn_size(&self) -> usize {
        self.max_txn_size
    }

    /// Submits `ops` as ceil(len / max_txn_size) sequential transactions.
    ///
    /// Order is preserved within and across chunks. The first failing chunk
    /// stops the write; see [`BatchedTxnError`] for what was applied.
    pub async fn write(
        &self,
        ops: Vec<TxnOperation>,
    ) -> std::result::Result<BatchedTxnResult, BatchedTxnError> {
        let total_chunks = ops.len().div_ceil(self.max_txn_size);
        let mut result = BatchedTxnResult {
            chunks: Vec::with_capacity(total_chunks),
        };

        for (chunk, chunk_ops) in ops.chunks(self.max_txn_size).enumerate() {
            debug!(
                "[BatchedWriter] submitting chunk {}/{} ({} ops)",
                chunk + 1,
                total_chunks,
                chunk_ops.len()
            );

            match self.submit(chunk_ops.to_vec()).await {
                Ok(response) => {
                    TXN_CHUNKS_METRIC.with_label_values(&["committed"]).inc();
                    result.chunks.push(ChunkOutcome {
                        chunk,
                        operations: chunk_ops.len(),
                        response,
                    });
                }
                Err(e) => {
                    TXN_CHUNKS_METRIC.with_label_values(&["failed"]).inc();
                    error!(
                        "[BatchedWriter] chunk {}/{} failed, {} chunk(s) already committed: {}",
                        chunk + 1,
                        total_chunks,
                        result.chunks.len(),
                        e
                    );
                    return Err(BatchedTxnError {
                        committed: result.chunks,
                        failed_chunk: chunk,
                        total_chunks,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(result)
    }

    async fn submit(
        &self,
        ops: Vec<TxnOperation>,
    ) -> crate::Result<TxnResponse> {
        if self.conflict_retry.max_retries == 0 {
            return self.store.transaction(ops).await;
        }

        task_with_timeout_and_exponential_backoff(
            || self.store.transaction(ops.clone()),
            self.conflict_retry,
            |e: &Error| {
                let retry = e.is_retryable();
                if retry {
                    warn!("[BatchedWriter] conflict, resubmitting chunk: {e}");
                }
                retry
            },
        )
        .await
    }
}
