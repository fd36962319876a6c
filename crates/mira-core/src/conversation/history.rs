//! In-memory conversation log for the active session.

use super::decode::decode_history;
use super::message::Message;
use crate::response::{TypedResponse, history_text};
use serde_json::Value;

/// Result of merging a server history into the local log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Server history was at least as long; it replaced the local log.
    Replaced { local_len: usize, server_len: usize },
    /// Server history was shorter and considered stale; local log kept.
    KeptLocal { local_len: usize, server_len: usize },
}

/// Ordered message log of the active session.
///
/// The log is always a prefix-consistent view of the server's stored
/// history, possibly ahead by optimistic entries the server has not
/// confirmed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replaces the log with the server's history, decoding legacy entries.
    pub fn hydrate(&mut self, server_history: &[Value]) {
        self.messages = decode_history(server_history);
    }

    /// Appends before network confirmation so input shows up immediately.
    pub fn append_optimistic(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends the interim assistant entry for a reply.
    ///
    /// Returns `false` when the reply derives no history text.
    pub fn append_reply(&mut self, response: &TypedResponse) -> bool {
        match history_text(response) {
            Some(text) => {
                self.messages
                    .push(Message::assistant(text, Some(response.clone())));
                true
            }
            None => false,
        }
    }

    /// Merges the history returned by a chat round-trip.
    ///
    /// The server wins whenever its decoded history is at least as long as
    /// the local log; a shorter server history is treated as stale.
    pub fn reconcile_with_server(&mut self, server_history: &[Value]) -> ReconcileOutcome {
        let server = decode_history(server_history);
        let local_len = self.messages.len();
        let server_len = server.len();

        if server_len >= local_len {
            self.messages = server;
            ReconcileOutcome::Replaced {
                local_len,
                server_len,
            }
        } else {
            tracing::debug!(
                "[Conversation] Server history shorter than local ({} < {}), keeping local",
                server_len,
                local_len
            );
            ReconcileOutcome::KeptLocal {
                local_len,
                server_len,
            }
        }
    }
}
