use crate::RollbackError;
use crate::StoreIndex;

/// Index state of one watched key prefix.
///
/// Keeps exactly two slots of history: the last index returned by the store
/// and the one before it. A rollback consumes the previous slot, so a second
/// rollback without an intervening poll fails instead of reusing stale state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedResource {
    name: String,
    path_prefix: String,
    recurse: bool,
    last_index: StoreIndex,
    previous_index: Option<StoreIndex>,
}

impl WatchedResource {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        recurse: bool,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            recurse,
            last_index: StoreIndex::ZERO,
            previous_index: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn recurse(&self) -> bool {
        self.recurse
    }

    pub fn last_index(&self) -> StoreIndex {
        self.last_index
    }

    /// `None` before the first poll and right after a rollback
    pub fn previous_index(&self) -> Option<StoreIndex> {
        self.previous_index
    }

    /// No successful poll yet (or rolled back to before the first one):
    /// the next watch must not block
    pub fn has_no_history(&self) -> bool {
        self.last_index.is_zero()
    }

    /// Records the index answered by the store and reports whether it moved.
    ///
    /// The index is taken unconditionally, even when unchanged or lower than
    /// before: the store's answer is authoritative.
    pub fn advance(
        &mut self,
        returned: StoreIndex,
    ) -> bool {
        let changed = returned != self.last_index;
        self.previous_index = Some(self.last_index);
        self.last_index = returned;
        changed
    }

    /// Restores the index from before the last poll so the next poll
    /// re-delivers the same data.
    pub fn rollback(&mut self) -> Result<StoreIndex, RollbackError> {
        let previous = self.previous_index.take().ok_or_else(|| RollbackError::NoHistory {
            resource: self.name.clone(),
        })?;
        self.last_index = previous;
        Ok(previous)
    }
}
