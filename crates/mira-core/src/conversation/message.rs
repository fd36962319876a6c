//! Conversation message types.

use crate::response::TypedResponse;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

/// A single message in a conversation history.
///
/// Fields are private so the role cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: MessageRole,
    content: String,
    /// Full typed reply, kept for rich re-rendering of assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<TypedResponse>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>, data: Option<TypedResponse>) -> Self {
        Self {
            role,
            content: content.into(),
            data,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, None)
    }

    pub fn assistant(content: impl Into<String>, data: Option<TypedResponse>) -> Self {
        Self::new(MessageRole::Assistant, content, data)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn data(&self) -> Option<&TypedResponse> {
        self.data.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}
