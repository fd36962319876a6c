//! Presentation protocol for assistant replies: dispatch into render plans,
//! inline formatting, progressive reveal, the image viewer and voice capture.

pub mod dispatcher;
pub mod image_viewer;
pub mod reveal;
pub mod rich_text;
pub mod voice;

pub use dispatcher::{Affordance, Block, NoteKind, RenderPlan, ResponseDispatcher};
pub use image_viewer::ImageViewer;
pub use reveal::{ProgressiveRenderer, RenderSink, RevealHandle, RevealOutcome};
pub use rich_text::{RichText, Span, SpanStyle, format_rich};
pub use voice::{RecorderState, StartOutcome, TickCallback, VoiceRecorder, format_elapsed};
