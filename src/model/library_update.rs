use serde::Deserialize;
use serde::Serialize;

/// Compiled service library that engines must (re)load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUpdate {
    pub system_id: String,
    pub specification_id: String,
}
