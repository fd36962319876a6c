//! Per-tab active-session pointer store.
//!
//! Each tab gets its own slot keyed by a random tab id. Slots live in
//! memory only and are dropped when the tab closes; nothing is written to
//! disk, so a fresh process always starts on the landing state.

use mira_core::error::Result;
use mira_core::state::repository::StateRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Storage shared by every tab of one client.
#[derive(Debug, Clone, Default)]
pub struct TabStateStore {
    slots: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl TabStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new tab with an empty pointer.
    pub fn open_tab(&self) -> TabStateRepository {
        let tab_id = Uuid::new_v4();
        tracing::debug!("[TabState] Opened tab {}", tab_id);
        TabStateRepository {
            tab_id,
            slots: self.slots.clone(),
        }
    }

    pub async fn open_tab_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}

/// The pointer slot of a single tab.
#[derive(Debug, Clone)]
pub struct TabStateRepository {
    tab_id: Uuid,
    slots: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl TabStateRepository {
    pub fn tab_id(&self) -> Uuid {
        self.tab_id
    }

    /// Drops the tab's pointer, as closing the tab would.
    pub async fn close(&self) {
        self.slots.lock().await.remove(&self.tab_id);
        tracing::debug!("[TabState] Closed tab {}", self.tab_id);
    }
}

#[async_trait::async_trait]
impl StateRepository for TabStateRepository {
    async fn get_active_session(&self) -> Option<String> {
        self.slots.lock().await.get(&self.tab_id).cloned()
    }

    async fn set_active_session(&self, session_id: String) -> Result<()> {
        self.slots.lock().await.insert(self.tab_id, session_id);
        Ok(())
    }

    async fn clear_active_session(&self) -> Result<()> {
        self.slots.lock().await.remove(&self.tab_id);
        Ok(())
    }
}
