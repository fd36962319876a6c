//! Response dispatch.
//!
//! Turns a `TypedResponse` into a [`RenderPlan`]: the prose to reveal
//! progressively, the structured blocks appended afterwards and the
//! interactive affordances bound last. Each variant has its own arm, so a
//! new response type does not compile until it is handled here.

use mira_core::config::resolve_url;
use mira_core::response::{
    CapabilitiesResponse, ClarifyResponse, ErrorResponse, GeneralResponse, ResponseKind,
    TutorialResponse, TypedResponse,
};
use strum::Display;

/// Something the user can act on after a reply is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    /// Suggested follow-up; selecting it sends the text as a message.
    Suggest(String),
    /// "Clarify this step" shortcut.
    ClarifyStep(u32),
    /// Open a step image in the full-screen viewer.
    ViewImage(String),
}

impl Affordance {
    /// Message sent when the affordance is activated, if it sends one.
    pub fn message_text(&self) -> Option<String> {
        match self {
            Self::Suggest(text) => Some(text.clone()),
            Self::ClarifyStep(step_number) => Some(format!("clarify step {}", step_number)),
            Self::ViewImage(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Suggest(text) => text.clone(),
            Self::ClarifyStep(step_number) => format!("Clarify step {}", step_number),
            Self::ViewImage(url) => format!("View image {}", url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NoteKind {
    Summary,
    Help,
    ProTip,
    Completion,
    CallToAction,
}

/// Structured content appended after the prose reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Step {
        number: u32,
        text: String,
        image: Option<String>,
    },
    ClarifiedStep {
        number: u32,
        original: String,
        image: Option<String>,
    },
    Feature {
        title: String,
        description: String,
        icon: Option<String>,
    },
    Note {
        kind: NoteKind,
        text: String,
    },
    Suggestions(Vec<String>),
}

/// Everything needed to display one assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub kind: ResponseKind,
    /// Revealed progressively.
    pub prose: String,
    pub blocks: Vec<Block>,
    pub affordances: Vec<Affordance>,
}

impl RenderPlan {
    fn new(kind: ResponseKind, prose: impl Into<String>) -> Self {
        Self {
            kind,
            prose: prose.into(),
            blocks: Vec::new(),
            affordances: Vec::new(),
        }
    }

    /// Plan for a reply with nothing but text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(ResponseKind::General, text)
    }

    /// Resolved image URLs, in display order.
    pub fn images(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Step { image, .. } | Block::ClarifiedStep { image, .. } => image.as_deref(),
                _ => None,
            })
            .collect()
    }

    fn note(&mut self, kind: NoteKind, text: Option<&str>) {
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            self.blocks.push(Block::Note {
                kind,
                text: text.to_string(),
            });
        }
    }

    fn suggestions(&mut self, actions: &[String]) {
        let actions: Vec<String> = actions
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        if actions.is_empty() {
            return;
        }
        self.affordances
            .extend(actions.iter().cloned().map(Affordance::Suggest));
        self.blocks.push(Block::Suggestions(actions));
    }
}

/// Selects the renderer for each response variant.
#[derive(Debug, Clone)]
pub struct ResponseDispatcher {
    base_url: String,
}

impl ResponseDispatcher {
    /// `base_url` resolves server-relative image paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dispatch(&self, response: &TypedResponse) -> RenderPlan {
        match response {
            TypedResponse::General(general) => self.general(general),
            TypedResponse::Tutorial(tutorial) => self.tutorial(tutorial),
            TypedResponse::TutorialClarify(clarify) => self.clarify(clarify),
            TypedResponse::Capabilities(capabilities) => self.capabilities(capabilities),
            TypedResponse::Error(error) => self.error(error),
        }
    }

    fn general(&self, response: &GeneralResponse) -> RenderPlan {
        if let Some(source_type) = &response.source_type {
            tracing::debug!("[Dispatcher] Rendering '{}' as general", source_type);
        }
        let mut plan = RenderPlan::new(ResponseKind::General, &response.content);
        plan.suggestions(&response.suggested_actions);
        plan
    }

    fn tutorial(&self, response: &TutorialResponse) -> RenderPlan {
        let mut plan = RenderPlan::new(ResponseKind::Tutorial, &response.content);

        if let Some(title) = response.section_title.as_deref().filter(|t| !t.is_empty()) {
            plan.blocks.push(Block::Heading(title.to_string()));
        }
        for step in &response.steps {
            let image = step.image.as_deref().map(|path| self.resolve(path));
            if let Some(url) = &image {
                plan.affordances.push(Affordance::ViewImage(url.clone()));
            }
            plan.affordances.push(Affordance::ClarifyStep(step.step_number));
            plan.blocks.push(Block::Step {
                number: step.step_number,
                text: step.text.clone(),
                image,
            });
        }
        plan.note(NoteKind::Summary, Some(&response.summary));
        plan.note(NoteKind::Help, response.help_note.as_deref());
        plan.note(NoteKind::ProTip, response.pro_tip.as_deref());
        plan.note(NoteKind::Completion, response.completion_message.as_deref());
        plan.suggestions(&response.suggested_actions);
        plan
    }

    fn clarify(&self, response: &ClarifyResponse) -> RenderPlan {
        let step = &response.clarified_step;
        let prose = match (response.content.trim(), step.clarified.trim()) {
            (content, "") => content.to_string(),
            ("", clarified) => clarified.to_string(),
            (content, clarified) => format!("{}\n\n{}", content, clarified),
        };
        let mut plan = RenderPlan::new(ResponseKind::TutorialClarify, prose);

        let image = step.image.as_deref().map(|path| self.resolve(path));
        if let Some(url) = &image {
            plan.affordances.push(Affordance::ViewImage(url.clone()));
        }
        plan.blocks.push(Block::ClarifiedStep {
            number: step.step_number,
            original: step.original.clone(),
            image,
        });
        plan.suggestions(&response.suggested_actions);
        plan
    }

    fn capabilities(&self, response: &CapabilitiesResponse) -> RenderPlan {
        let mut plan = RenderPlan::new(ResponseKind::Capabilities, &response.content);
        if !response.title.is_empty() {
            plan.blocks.push(Block::Heading(response.title.clone()));
        }
        plan.blocks
            .extend(response.features.iter().map(|feature| Block::Feature {
                title: feature.title.clone(),
                description: feature.description.clone(),
                icon: feature.icon.clone(),
            }));
        plan.note(NoteKind::CallToAction, response.footer_cta.as_deref());
        plan.suggestions(&response.suggested_actions);
        plan
    }

    fn error(&self, response: &ErrorResponse) -> RenderPlan {
        let mut plan = RenderPlan::new(ResponseKind::Error, &response.content);
        plan.suggestions(&response.suggested_actions);
        plan
    }

    fn resolve(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }
}
