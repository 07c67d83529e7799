use serde::{Deserialize, Serialize};

use crate::traffic::{Incident, TrafficFlow};

/// Body of an assistant request. The incident and flow lists give the
/// assistant the same view of the city the user is looking at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub city: String,
    pub incidents: Vec<Incident>,
    pub flows: Vec<TrafficFlow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default, rename = "fromAI")]
    pub from_ai: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
