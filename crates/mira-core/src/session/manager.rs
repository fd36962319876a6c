use super::backend::SessionBackend;
use crate::client_state::ClientState;
use crate::error::{MiraError, Result};
use crate::state::repository::StateRepository;
use std::sync::Arc;

/// How `restore_on_load` left the tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No pointer was stored; the tab shows the landing state.
    Landing,
    /// The pointer named a session that no longer exists; it was cleared.
    StalePointerCleared(String),
    /// The stored session was selected and hydrated.
    Restored(String),
}

/// How `select_session` left the tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The session was already active; nothing happened.
    Unchanged,
    /// The session is now active with its history loaded.
    Selected { message_count: usize },
    /// The backend no longer knows the session; the tab fell back to landing.
    NotFound,
}

/// The session used by an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredSession {
    pub session_id: String,
    /// `true` when this call created the session.
    pub created: bool,
}

/// Manages which session a tab shows and its lifecycle on the backend.
///
/// `SessionManager` is responsible for:
/// - Restoring the tab's active session on load
/// - Switching between sessions and hydrating their history
/// - Creating a session lazily on the first outgoing message
/// - Returning to the landing state ("new chat")
/// - Renaming and deleting sessions, refreshing the session list after each
pub struct SessionManager {
    /// Backend session store
    backend: Arc<dyn SessionBackend>,
    /// Per-tab repository holding the active session pointer
    state_repository: Arc<dyn StateRepository>,
    user_id: String,
    license_id: String,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The backend session store
    /// * `state_repository` - The tab's active-session pointer store
    /// * `user_id` - Owner of the sessions listed and created
    /// * `license_id` - Sent when creating sessions
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        state_repository: Arc<dyn StateRepository>,
        user_id: impl Into<String>,
        license_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            state_repository,
            user_id: user_id.into(),
            license_id: license_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Restores the tab's active session on startup.
    ///
    /// Without a stored pointer the tab enters the landing state. A pointer
    /// whose session is missing from the backend's list is cleared and the
    /// tab falls back to landing; otherwise the session is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the session list or the session itself cannot be
    /// fetched. The pointer is kept in that case so a later load can retry.
    pub async fn restore_on_load(&self, state: &mut ClientState) -> Result<RestoreOutcome> {
        let Some(session_id) = self.state_repository.get_active_session().await else {
            state.reset_to_landing();
            return Ok(RestoreOutcome::Landing);
        };

        self.refresh_sessions(state).await?;

        if !state.sessions.iter().any(|s| s.session_id == session_id) {
            tracing::info!(
                "[SessionManager] Stored session {} no longer exists, clearing pointer",
                session_id
            );
            self.state_repository.clear_active_session().await?;
            state.reset_to_landing();
            return Ok(RestoreOutcome::StalePointerCleared(session_id));
        }

        match self.select_session(state, &session_id).await? {
            SelectOutcome::NotFound => Ok(RestoreOutcome::StalePointerCleared(session_id)),
            SelectOutcome::Selected { .. } | SelectOutcome::Unchanged => {
                Ok(RestoreOutcome::Restored(session_id))
            }
        }
    }

    /// Switches the tab to a session and hydrates its history.
    ///
    /// No-op when the session is already active. The pointer is written
    /// before the history request so a reload during the request lands on
    /// the same session.
    ///
    /// # Errors
    ///
    /// Returns an error if the history request fails for any reason other
    /// than the session being gone. The tab is then left on the new session
    /// with an empty conversation; no retry is attempted.
    pub async fn select_session(
        &self,
        state: &mut ClientState,
        session_id: &str,
    ) -> Result<SelectOutcome> {
        if state.is_active(session_id) {
            return Ok(SelectOutcome::Unchanged);
        }

        state.active_session_id = Some(session_id.to_string());
        state.conversation.clear();
        state.tutorial.reset();
        self.state_repository
            .set_active_session(session_id.to_string())
            .await?;

        match self.backend.get_session(session_id).await {
            Ok(detail) => {
                state.conversation.hydrate(&detail.history);
                tracing::debug!(
                    "[SessionManager] Selected session {} ({} messages)",
                    session_id,
                    state.conversation.len()
                );
                Ok(SelectOutcome::Selected {
                    message_count: state.conversation.len(),
                })
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(
                    "[SessionManager] Session {} not found on select, returning to landing",
                    session_id
                );
                self.state_repository.clear_active_session().await?;
                state.reset_to_landing();
                self.refresh_after_mutation(state).await;
                Ok(SelectOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the active session, creating one on the backend if the tab has none.
    ///
    /// Sessions are created lazily: only when a first message is actually sent.
    ///
    /// # Errors
    ///
    /// Returns an error if session creation or pointer persistence fails.
    pub async fn ensure_session_for_send(&self, state: &mut ClientState) -> Result<EnsuredSession> {
        if let Some(session_id) = &state.active_session_id {
            return Ok(EnsuredSession {
                session_id: session_id.clone(),
                created: false,
            });
        }

        let session_id = self
            .backend
            .create_session(&self.user_id, &self.license_id)
            .await?;
        if session_id.is_empty() {
            return Err(MiraError::data_shape("backend returned an empty session_id"));
        }

        tracing::info!("[SessionManager] Created session {}", session_id);
        state.active_session_id = Some(session_id.clone());
        state.tutorial.reset();
        self.state_repository
            .set_active_session(session_id.clone())
            .await?;
        self.refresh_after_mutation(state).await;

        Ok(EnsuredSession {
            session_id,
            created: true,
        })
    }

    /// Returns the tab to the landing state.
    ///
    /// The previous session is only discarded locally, never deleted.
    pub async fn new_chat(&self, state: &mut ClientState) -> Result<()> {
        state.reset_to_landing();
        self.state_repository.clear_active_session().await
    }

    /// Deletes a session from the backend.
    ///
    /// Deleting the active session behaves like `new_chat`.
    ///
    /// # Returns
    ///
    /// `true` if the deleted session was the active one.
    pub async fn delete_session(&self, state: &mut ClientState, session_id: &str) -> Result<bool> {
        self.backend.delete_session(session_id).await?;

        let was_active = state.is_active(session_id);
        if was_active {
            self.new_chat(state).await?;
        }
        self.refresh_after_mutation(state).await;

        Ok(was_active)
    }

    /// Renames a session.
    ///
    /// # Errors
    ///
    /// Returns `MiraError::Validation` for a blank title without contacting
    /// the backend.
    pub async fn rename_session(
        &self,
        state: &mut ClientState,
        session_id: &str,
        title: &str,
    ) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MiraError::validation("session title must not be empty"));
        }

        self.backend.rename_session(session_id, title).await?;
        self.refresh_after_mutation(state).await;
        Ok(())
    }

    /// Reloads the session list.
    pub async fn refresh_sessions(&self, state: &mut ClientState) -> Result<()> {
        state.sessions = self.backend.list_sessions(&self.user_id).await?;
        Ok(())
    }

    /// Best-effort list refresh; failures leave the previous list in place.
    pub async fn refresh_after_mutation(&self, state: &mut ClientState) {
        if let Err(e) = self.refresh_sessions(state).await {
            tracing::warn!("[SessionManager] Failed to refresh session list: {}", e);
        }
    }
}
