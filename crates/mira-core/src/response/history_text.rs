//! Text recorded in the conversation log for an assistant reply.

use super::model::TypedResponse;

/// Derives the assistant text stored in history for a reply.
///
/// - tutorial: `content + " " + summary`, trimmed
/// - tutorial_clarify: the clarified step text, falling back to `content`
/// - everything else: `content`
///
/// Returns `None` when the derived text is empty; such replies are not
/// appended to history.
pub fn history_text(response: &TypedResponse) -> Option<String> {
    let text = match response {
        TypedResponse::Tutorial(tutorial) => {
            format!("{} {}", tutorial.content, tutorial.summary)
                .trim()
                .to_string()
        }
        TypedResponse::TutorialClarify(clarify) => {
            let clarified = clarify.clarified_step.clarified.trim();
            if clarified.is_empty() {
                clarify.content.trim().to_string()
            } else {
                clarified.to_string()
            }
        }
        TypedResponse::General(_) | TypedResponse::Capabilities(_) | TypedResponse::Error(_) => {
            response.content().trim().to_string()
        }
    };

    (!text.is_empty()).then_some(text)
}
