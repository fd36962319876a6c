pub mod chat_usecase;

pub use chat_usecase::{
    Backends, ChatController, DEFAULT_SUGGESTIONS, GENERIC_ERROR_MESSAGE, SendOutcome,
    VoiceOutcome,
};
