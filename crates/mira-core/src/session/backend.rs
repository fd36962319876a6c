//! Backend traits.
//!
//! The assistant backend is an external collaborator. These traits are the
//! boundary the client core talks to; `mira-infrastructure` implements them
//! over HTTP and tests implement them in memory.

use super::model::{SessionDetail, SessionSummary};
use crate::audio::RecordedAudio;
use crate::error::{MiraError, Result};
use crate::response::{TutorialStep, TypedResponse};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Session CRUD on the backend's session store.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Lists the sessions of a user, most recently updated first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// Creates a session and returns its id.
    async fn create_session(&self, user_id: &str, license_id: &str) -> Result<String>;

    /// Fetches a session with its full history.
    ///
    /// Returns `MiraError::NotFound` when the id no longer exists.
    async fn get_session(&self, session_id: &str) -> Result<SessionDetail>;

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Outgoing chat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    /// Steps of the latest tutorial, possibly empty.
    pub last_tutorial: Vec<TutorialStep>,
}

/// Decoded chat reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: TypedResponse,
    /// Canonical history, when the backend returns it alongside the reply.
    pub conversation_history: Option<Vec<Value>>,
}

impl ChatReply {
    /// Splits `conversation_history` off the payload and decodes the rest.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(MiraError::data_shape("chat reply is not a JSON object"));
        };

        let conversation_history = match map.remove("conversation_history") {
            None | Some(Value::Null) => None,
            Some(Value::Array(entries)) => Some(entries),
            Some(other) => {
                return Err(MiraError::data_shape(format!(
                    "conversation_history is not an array: {}",
                    other
                )));
            }
        };

        Ok(Self {
            response: TypedResponse::from_value(Value::Object(map))?,
            conversation_history,
        })
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Speech-to-text upload.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Uploads recorded audio; `Ok(None)` means the service heard nothing.
    async fn transcribe(&self, audio: RecordedAudio) -> Result<Option<String>>;
}

/// Checks whether a step image can be displayed.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// `true` when `url` answers with a loadable image.
    async fn probe(&self, url: &str) -> bool;
}
