//! Tutorial context cache.
//!
//! Holds the step list of the latest `tutorial` reply of the current
//! session. It is sent back as `last_tutorial` with every chat request so
//! the backend can resolve "clarify step N" on its own.

use crate::response::{TutorialStep, TypedResponse};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialContext {
    steps: Vec<TutorialStep>,
}

impl TutorialContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the steps of a `tutorial` reply.
    ///
    /// Every other reply type, `tutorial_clarify` included, leaves the cache
    /// untouched so repeated clarifications resolve against the original steps.
    pub fn observe(&mut self, response: &TypedResponse) {
        if let TypedResponse::Tutorial(tutorial) = response {
            tracing::debug!(
                "[TutorialContext] Caching {} steps",
                tutorial.steps.len()
            );
            self.steps = tutorial.steps.clone();
        }
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[TutorialStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tutorial() -> TypedResponse {
        TypedResponse::from_value(json!({
            "type": "tutorial",
            "content": "Sure!",
            "steps": [
                {"step_number": 1, "text": "Open Regions"},
                {"step_number": 2, "text": "Click Add"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_clarify_does_not_replace_steps() {
        let mut context = TutorialContext::new();
        context.observe(&tutorial());
        let cached = context.steps().to_vec();

        let clarify = TypedResponse::from_value(json!({
            "type": "tutorial_clarify",
            "content": "Step 1 clarification:",
            "clarified_step": {"step_number": 1, "clarified": "Click the gear icon"}
        }))
        .unwrap();
        context.observe(&clarify);
        context.observe(&TypedResponse::general("anything else?"));

        assert_eq!(context.steps(), cached.as_slice());
        assert_eq!(context.steps()[1].text, "Click Add");
    }

    #[test]
    fn test_reset_empties() {
        let mut context = TutorialContext::new();
        context.observe(&tutorial());
        context.reset();
        assert!(context.is_empty());
    }
}
