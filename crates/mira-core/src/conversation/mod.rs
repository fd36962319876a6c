//! Conversation domain module.
//!
//! - `message`: `Message` / `MessageRole`
//! - `decode`: legacy and structured history entry decoding
//! - `history`: the `Conversation` log and its reconciliation with the server

mod decode;
mod history;
mod message;

pub use decode::{decode_entry, decode_history};
pub use history::{Conversation, ReconcileOutcome};
pub use message::{Message, MessageRole};
