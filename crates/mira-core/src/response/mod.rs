//! Assistant response domain module.
//!
//! - `model`: the closed `TypedResponse` sum type and its variant payloads
//! - `history_text`: the text an assistant reply contributes to the conversation log

mod history_text;
mod model;

pub use history_text::history_text;
pub use model::{
    CapabilitiesResponse, ClarifiedStep, ClarifyResponse, ErrorResponse, Feature,
    GeneralResponse, ResponseKind, TutorialResponse, TutorialStep, TypedResponse,
};
