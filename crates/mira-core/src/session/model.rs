//! Session domain models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default title the backend gives a session before its first message.
pub const UNTITLED_SESSION: &str = "New Chat";

/// A row of the session list.
///
/// Identity is `session_id`; uniqueness is enforced by the backend, which
/// also returns the list ordered by last update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn untitled() -> String {
    UNTITLED_SESSION.to_string()
}

impl SessionSummary {
    pub fn new(session_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: title.into(),
            updated_at: None,
        }
    }
}

/// Full session payload returned by the backend.
///
/// History stays undecoded here; `Conversation::hydrate` owns the decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub history: Vec<Value>,
}
