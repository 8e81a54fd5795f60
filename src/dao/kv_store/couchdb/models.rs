use serde::{Deserialize, Serialize};

/// CouchDB document wrapping one key-value entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub value: String,
}
