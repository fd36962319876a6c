#[cfg(test)]
mod tests {
    use crate::client_state::ClientState;
    use crate::conversation::Message;
    use crate::error::{MiraError, Result};
    use crate::response::{TutorialStep, TypedResponse};
    use crate::session::backend::SessionBackend;
    use crate::session::manager::{RestoreOutcome, SelectOutcome, SessionManager};
    use crate::session::model::{SessionDetail, SessionSummary};
    use crate::state::repository::StateRepository;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // Mock SessionBackend for testing
    #[derive(Default)]
    struct MockSessionBackend {
        sessions: Mutex<Vec<(SessionSummary, Vec<Value>)>>,
        created: AtomicUsize,
        fail_get: Mutex<bool>,
    }

    impl MockSessionBackend {
        fn with_session(self, id: &str, title: &str, history: Vec<Value>) -> Self {
            self.sessions
                .lock()
                .unwrap()
                .push((SessionSummary::new(id, title), history));
            self
        }
    }

    #[async_trait::async_trait]
    impl SessionBackend for MockSessionBackend {
        async fn list_sessions(&self, _user_id: &str) -> Result<Vec<SessionSummary>> {
            let sessions = self.sessions.lock().unwrap();
            Ok(sessions.iter().map(|(s, _)| s.clone()).collect())
        }

        async fn create_session(&self, _user_id: &str, _license_id: &str) -> Result<String> {
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("created-{}", n);
            self.sessions
                .lock()
                .unwrap()
                .push((SessionSummary::new(&id, "New Chat"), Vec::new()));
            Ok(id)
        }

        async fn get_session(&self, session_id: &str) -> Result<SessionDetail> {
            if *self.fail_get.lock().unwrap() {
                return Err(MiraError::transport(Some(500), "boom"));
            }
            let sessions = self.sessions.lock().unwrap();
            sessions
                .iter()
                .find(|(s, _)| s.session_id == session_id)
                .map(|(s, history)| SessionDetail {
                    session_id: Some(s.session_id.clone()),
                    title: Some(s.title.clone()),
                    history: history.clone(),
                })
                .ok_or_else(|| MiraError::not_found("session", session_id))
        }

        async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
            let mut sessions = self.sessions.lock().unwrap();
            let (summary, _) = sessions
                .iter_mut()
                .find(|(s, _)| s.session_id == session_id)
                .ok_or_else(|| MiraError::not_found("session", session_id))?;
            summary.title = title.to_string();
            Ok(())
        }

        async fn delete_session(&self, session_id: &str) -> Result<()> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|(s, _)| s.session_id != session_id);
            if sessions.len() == before {
                return Err(MiraError::not_found("session", session_id));
            }
            Ok(())
        }
    }

    // Mock StateRepository for testing
    #[derive(Default)]
    struct MockStateRepository {
        active_session_id: Mutex<Option<String>>,
    }

    impl MockStateRepository {
        fn with_pointer(id: &str) -> Self {
            Self {
                active_session_id: Mutex::new(Some(id.to_string())),
            }
        }

        fn pointer(&self) -> Option<String> {
            self.active_session_id.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl StateRepository for MockStateRepository {
        async fn get_active_session(&self) -> Option<String> {
            self.active_session_id.lock().unwrap().clone()
        }

        async fn set_active_session(&self, session_id: String) -> Result<()> {
            *self.active_session_id.lock().unwrap() = Some(session_id);
            Ok(())
        }

        async fn clear_active_session(&self) -> Result<()> {
            *self.active_session_id.lock().unwrap() = None;
            Ok(())
        }
    }

    fn history() -> Vec<Value> {
        vec![
            json!("User: How to add a new region?"),
            json!({"role": "assistant", "content": "Sure! Here is how.", "data": {
                "type": "tutorial",
                "content": "Sure! Here is how.",
                "steps": [{"step_number": 1, "text": "Open Regions"}]
            }}),
        ]
    }

    fn manager(
        backend: Arc<MockSessionBackend>,
        state_repository: Arc<MockStateRepository>,
    ) -> SessionManager {
        SessionManager::new(backend, state_repository, "default_user", "lic-1")
    }

    #[tokio::test]
    async fn test_restore_without_pointer_is_landing() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo);
        let mut state = ClientState::new();

        let outcome = manager.restore_on_load(&mut state).await.unwrap();

        assert_eq!(outcome, RestoreOutcome::Landing);
        assert!(state.is_landing());
        assert!(state.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_restore_clears_stale_pointer() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));
        let repo = Arc::new(MockStateRepository::with_pointer("gone"));
        let manager = manager(backend, repo.clone());
        let mut state = ClientState::new();

        let outcome = manager.restore_on_load(&mut state).await.unwrap();

        assert_eq!(outcome, RestoreOutcome::StalePointerCleared("gone".to_string()));
        assert!(state.is_landing());
        assert_eq!(repo.pointer(), None);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_matches_explicit_select() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));

        let restored = {
            let repo = Arc::new(MockStateRepository::with_pointer("s-1"));
            let manager = manager(backend.clone(), repo);
            let mut state = ClientState::new();
            let outcome = manager.restore_on_load(&mut state).await.unwrap();
            assert_eq!(outcome, RestoreOutcome::Restored("s-1".to_string()));
            state
        };

        let selected = {
            let repo = Arc::new(MockStateRepository::default());
            let manager = manager(backend, repo.clone());
            let mut state = ClientState::new();
            manager.select_session(&mut state, "s-1").await.unwrap();
            assert_eq!(repo.pointer().as_deref(), Some("s-1"));
            state
        };

        assert_eq!(restored.conversation, selected.conversation);
        assert_eq!(restored.active_session_id, selected.active_session_id);
        assert_eq!(restored.conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_select_same_session_is_noop() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo);
        let mut state = ClientState::new();

        manager.select_session(&mut state, "s-1").await.unwrap();
        state.conversation.append_optimistic(Message::user("pending"));

        let outcome = manager.select_session(&mut state, "s-1").await.unwrap();

        assert_eq!(outcome, SelectOutcome::Unchanged);
        assert_eq!(state.conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_select_resets_tutorial_context() {
        let backend = Arc::new(
            MockSessionBackend::default()
                .with_session("s-1", "a", history())
                .with_session("s-2", "b", Vec::new()),
        );
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo);
        let mut state = ClientState::new();

        manager.select_session(&mut state, "s-1").await.unwrap();
        state.tutorial.observe(&TypedResponse::Tutorial(crate::response::TutorialResponse {
            content: "x".to_string(),
            steps: vec![TutorialStep::new(1, "Open")],
            summary: String::new(),
            section_title: None,
            help_note: None,
            pro_tip: None,
            completion_message: None,
            suggested_actions: Vec::new(),
        }));
        assert!(!state.tutorial.is_empty());

        manager.select_session(&mut state, "s-2").await.unwrap();

        assert!(state.tutorial.is_empty());
        assert!(state.conversation.is_empty());
        assert!(state.is_active("s-2"));
    }

    #[tokio::test]
    async fn test_select_failure_leaves_safe_state() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));
        *backend.fail_get.lock().unwrap() = true;
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo);
        let mut state = ClientState::new();

        let result = manager.select_session(&mut state, "s-1").await;

        assert!(result.unwrap_err().is_transport());
        assert!(state.is_active("s-1"));
        assert!(state.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_select_missing_session_falls_back_to_landing() {
        let backend = Arc::new(MockSessionBackend::default());
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo.clone());
        let mut state = ClientState::new();

        let outcome = manager.select_session(&mut state, "ghost").await.unwrap();

        assert_eq!(outcome, SelectOutcome::NotFound);
        assert!(state.is_landing());
        assert_eq!(repo.pointer(), None);
    }

    #[tokio::test]
    async fn test_lazy_creation_happens_once() {
        let backend = Arc::new(MockSessionBackend::default());
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend.clone(), repo.clone());
        let mut state = ClientState::new();

        let first = manager.ensure_session_for_send(&mut state).await.unwrap();
        let second = manager.ensure_session_for_send(&mut state).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(backend.created.load(Ordering::SeqCst), 1);
        assert_eq!(repo.pointer(), Some(first.session_id.clone()));
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_new_chat_clears_pointer_and_state() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "t", history()));
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo.clone());
        let mut state = ClientState::new();
        manager.select_session(&mut state, "s-1").await.unwrap();

        manager.new_chat(&mut state).await.unwrap();

        assert!(state.is_landing());
        assert!(state.conversation.is_empty());
        assert_eq!(repo.pointer(), None);
    }

    #[tokio::test]
    async fn test_delete_active_session_behaves_like_new_chat() {
        let backend = Arc::new(
            MockSessionBackend::default()
                .with_session("s-1", "a", history())
                .with_session("s-2", "b", Vec::new()),
        );
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo.clone());
        let mut state = ClientState::new();
        manager.select_session(&mut state, "s-1").await.unwrap();

        let was_active = manager.delete_session(&mut state, "s-1").await.unwrap();

        assert!(was_active);
        assert!(state.is_landing());
        assert_eq!(repo.pointer(), None);
        assert_eq!(state.sessions, vec![SessionSummary::new("s-2", "b")]);
    }

    #[tokio::test]
    async fn test_delete_other_session_keeps_active() {
        let backend = Arc::new(
            MockSessionBackend::default()
                .with_session("s-1", "a", history())
                .with_session("s-2", "b", Vec::new()),
        );
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo.clone());
        let mut state = ClientState::new();
        manager.select_session(&mut state, "s-1").await.unwrap();

        let was_active = manager.delete_session(&mut state, "s-2").await.unwrap();

        assert!(!was_active);
        assert!(state.is_active("s-1"));
        assert_eq!(state.conversation.len(), 2);
        assert_eq!(repo.pointer().as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn test_rename_refreshes_list_and_rejects_blank() {
        let backend = Arc::new(MockSessionBackend::default().with_session("s-1", "old", Vec::new()));
        let repo = Arc::new(MockStateRepository::default());
        let manager = manager(backend, repo);
        let mut state = ClientState::new();

        manager
            .rename_session(&mut state, "s-1", "  Regions  ")
            .await
            .unwrap();
        assert_eq!(state.sessions[0].title, "Regions");

        let err = manager.rename_session(&mut state, "s-1", "   ").await.unwrap_err();
        assert!(matches!(err, MiraError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_keeps_backend_order() {
        let backend = Arc::new(
            MockSessionBackend::default()
                .with_session("newest", "n", Vec::new())
                .with_session("older", "o", Vec::new()),
        );
        let manager = manager(backend, Arc::new(MockStateRepository::default()));
        let mut state = ClientState::new();

        manager.refresh_sessions(&mut state).await.unwrap();

        let ids: Vec<&str> = state.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "older"]);
    }
}
