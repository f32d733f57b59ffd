// -
// Store protocol

/// Store constraint: maximum operations accepted by a single txn request
pub const MAX_TXN_SIZE: usize = 64;

/// Authentication header sent with every request
pub(crate) const TOKEN_HEADER: &str = "X-Consul-Token";

/// Response header carrying the store index of a listing
pub(crate) const INDEX_HEADER: &str = "X-Consul-Index";

pub(crate) const KV_PATH: &str = "/v1/kv";
pub(crate) const TXN_PATH: &str = "/v1/txn";

/// Body returned by the store for an acknowledged put/delete
pub(crate) const WRITE_ACK: &str = "true";

// -
// Key layout

/// Chains runtime properties were stored here before the per-chain layout
pub const CHAINS_RUNTIME_CONFIGURATIONS_LEGACY: &str = "/chains-runtime-configurations";

// -
// Resource names used for logging and metric labels

pub const ENGINES_STATE_RESOURCE: &str = "engines-state";
pub const DEPLOYMENTS_UPDATE_RESOURCE: &str = "deployments-update";
pub const CHAINS_RUNTIME_RESOURCE: &str = "chains-runtime-properties";
