pub mod backend;
pub mod manager;
pub mod model;

#[cfg(test)]
mod manager_test;

pub use backend::{
    ChatBackend, ChatReply, ChatRequest, ImageProbe, SessionBackend, TranscriptionBackend,
};
pub use manager::{EnsuredSession, RestoreOutcome, SelectOutcome, SessionManager};
pub use model::{SessionDetail, SessionSummary, UNTITLED_SESSION};
