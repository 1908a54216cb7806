//! Chat protocol: JSON bodies exchanged with the web client

use genesis_core::UserProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → Gateway chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Routing tag; unknown tags are answered, not rejected
    pub agent_type: String,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    /// Prior turns. Accepted for compatibility, not used.
    #[serde(default)]
    pub history: Option<Vec<Value>>,
}
