//! Per-tab state repository trait.

use async_trait::async_trait;

use crate::error::Result;

/// Repository for the active-session pointer of one tab.
///
/// The pointer is ephemeral: it lives as long as the tab and is never
/// shared with other tabs, so each tab can hold its own conversation while
/// all tabs share the backend's session store.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Absent means the tab shows the landing state.
    async fn get_active_session(&self) -> Option<String>;

    async fn set_active_session(&self, session_id: String) -> Result<()>;

    async fn clear_active_session(&self) -> Result<()>;
}
