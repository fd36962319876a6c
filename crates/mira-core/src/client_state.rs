//! Client state owned by a single controller.

use crate::conversation::Conversation;
use crate::session::SessionSummary;
use crate::tutorial::TutorialContext;

/// Everything the client knows about the tab it runs in.
///
/// One controller owns this value and lends the pieces to the components
/// that need them.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// At most one active session per tab; `None` is the landing state.
    pub active_session_id: Option<String>,
    pub conversation: Conversation,
    pub tutorial: TutorialContext,
    /// Session list as last fetched from the backend.
    pub sessions: Vec<SessionSummary>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_landing(&self) -> bool {
        self.active_session_id.is_none()
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.active_session_id.as_deref() == Some(session_id)
    }

    /// Drops the active session and everything derived from it.
    pub fn reset_to_landing(&mut self) {
        self.active_session_id = None;
        self.conversation.clear();
        self.tutorial.reset();
    }

    /// Looks a session up by its 1-based list position or by id.
    pub fn find_session(&self, key: &str) -> Option<&SessionSummary> {
        if let Ok(index) = key.parse::<usize>() {
            if index >= 1 {
                if let Some(session) = self.sessions.get(index - 1) {
                    return Some(session);
                }
            }
        }
        self.sessions.iter().find(|s| s.session_id == key)
    }
}
