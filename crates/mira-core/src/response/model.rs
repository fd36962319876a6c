//! Typed assistant responses.
//!
//! The backend tags every reply with a `type` string. The client decodes it
//! once into the closed [`TypedResponse`] sum type; every later stage matches
//! on the variant instead of comparing strings.

use crate::error::{MiraError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// Discriminator values the client knows how to render natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResponseKind {
    General,
    Tutorial,
    TutorialClarify,
    Capabilities,
    Error,
}

/// A single step of a tutorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialStep {
    /// 1-based position; `0` on the wire means "not numbered" and is fixed up from the position.
    #[serde(default)]
    pub step_number: u32,
    #[serde(default, alias = "description")]
    pub text: String,
    #[serde(default, alias = "snapshot", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl TutorialStep {
    pub fn new(step_number: u32, text: impl Into<String>) -> Self {
        Self {
            step_number,
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralResponse {
    pub content: String,
    #[serde(default, alias = "suggestions")]
    pub suggested_actions: Vec<String>,
    /// Wire discriminator when the reply was a type the client folds into `general`.
    #[serde(skip)]
    pub source_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialResponse {
    pub content: String,
    #[serde(default)]
    pub steps: Vec<TutorialStep>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<String>,
    #[serde(default, alias = "suggestions")]
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClarifiedStep {
    #[serde(default)]
    pub step_number: u32,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub clarified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyResponse {
    pub content: String,
    #[serde(default)]
    pub clarified_step: ClarifiedStep,
    #[serde(default, alias = "suggestions")]
    pub suggested_actions: Vec<String>,
}

/// One entry of a capability listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FeatureRepr")]
pub struct Feature {
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureRepr {
    Plain(String),
    Detailed {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        icon: Option<String>,
    },
}

impl From<FeatureRepr> for Feature {
    fn from(repr: FeatureRepr) -> Self {
        match repr {
            FeatureRepr::Plain(title) => Self {
                title,
                description: String::new(),
                icon: None,
            },
            FeatureRepr::Detailed {
                title,
                description,
                icon,
            } => Self {
                title,
                description,
                icon,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_cta: Option<String>,
    #[serde(default, alias = "suggestions")]
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub content: String,
    #[serde(default, alias = "suggestions")]
    pub suggested_actions: Vec<String>,
}

/// A decoded assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypedResponse {
    General(GeneralResponse),
    Tutorial(TutorialResponse),
    TutorialClarify(ClarifyResponse),
    Capabilities(CapabilitiesResponse),
    Error(ErrorResponse),
}

impl TypedResponse {
    /// Plain conversational reply.
    pub fn general(content: impl Into<String>) -> Self {
        Self::General(GeneralResponse {
            content: content.into(),
            suggested_actions: Vec::new(),
            source_type: None,
        })
    }

    /// Decodes a JSON payload by its `type` discriminator.
    ///
    /// A missing or unknown discriminator decodes as `general`. A payload
    /// that is not an object, or whose fields do not fit the variant, is a
    /// data-shape error.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(MiraError::data_shape("response is not a JSON object"));
        };

        let raw_type = map
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let kind = match raw_type.as_deref() {
            None => ResponseKind::General,
            Some(raw) => raw.parse::<ResponseKind>().unwrap_or_else(|_| {
                tracing::debug!("[TypedResponse] Unknown type '{}', using general", raw);
                ResponseKind::General
            }),
        };

        let shape = |e: serde_json::Error| MiraError::data_shape(format!("{} response: {}", kind, e));

        let response = match kind {
            ResponseKind::General => {
                let mut general: GeneralResponse = serde_json::from_value(value).map_err(shape)?;
                general.source_type = raw_type.filter(|t| t != "general");
                Self::General(general)
            }
            ResponseKind::Tutorial => {
                let mut tutorial: TutorialResponse =
                    serde_json::from_value(value).map_err(shape)?;
                number_steps(&mut tutorial.steps);
                Self::Tutorial(tutorial)
            }
            ResponseKind::TutorialClarify => {
                Self::TutorialClarify(serde_json::from_value(value).map_err(shape)?)
            }
            ResponseKind::Capabilities => {
                Self::Capabilities(serde_json::from_value(value).map_err(shape)?)
            }
            ResponseKind::Error => Self::Error(serde_json::from_value(value).map_err(shape)?),
        };

        Ok(response)
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::General(_) => ResponseKind::General,
            Self::Tutorial(_) => ResponseKind::Tutorial,
            Self::TutorialClarify(_) => ResponseKind::TutorialClarify,
            Self::Capabilities(_) => ResponseKind::Capabilities,
            Self::Error(_) => ResponseKind::Error,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::General(r) => &r.content,
            Self::Tutorial(r) => &r.content,
            Self::TutorialClarify(r) => &r.content,
            Self::Capabilities(r) => &r.content,
            Self::Error(r) => &r.content,
        }
    }

    pub fn suggested_actions(&self) -> &[String] {
        match self {
            Self::General(r) => &r.suggested_actions,
            Self::Tutorial(r) => &r.suggested_actions,
            Self::TutorialClarify(r) => &r.suggested_actions,
            Self::Capabilities(r) => &r.suggested_actions,
            Self::Error(r) => &r.suggested_actions,
        }
    }
}

impl<'de> Deserialize<'de> for TypedResponse {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Steps sent without a number take their 1-based position.
fn number_steps(steps: &mut [TutorialStep]) {
    for (index, step) in steps.iter_mut().enumerate() {
        if step.step_number == 0 {
            step.step_number = index as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tutorial_decodes_steps_and_extras() {
        let response = TypedResponse::from_value(json!({
            "type": "tutorial",
            "content": "Sure! Here is how.",
            "steps": [
                {"step_number": 1, "text": "Open **Regions**", "image": "/static/images/r1.png"},
                {"step_number": 2, "text": "Click 'Add'"}
            ],
            "summary": "I hope these 2 steps help you achieve your goal.",
            "pro_tip": "Follow each step carefully.",
            "completion_message": "Thank you!",
            "suggested_actions": ["How to edit a region?"]
        }))
        .unwrap();

        let TypedResponse::Tutorial(tutorial) = response else {
            panic!("expected tutorial");
        };
        assert_eq!(tutorial.steps.len(), 2);
        assert_eq!(tutorial.steps[0].image.as_deref(), Some("/static/images/r1.png"));
        assert_eq!(tutorial.pro_tip.as_deref(), Some("Follow each step carefully."));
        assert!(tutorial.help_note.is_none());
        assert_eq!(tutorial.suggested_actions, vec!["How to edit a region?"]);
    }

    #[test]
    fn test_unnumbered_steps_take_position() {
        let response = TypedResponse::from_value(json!({
            "type": "tutorial",
            "content": "x",
            "steps": [{"description": "first"}, {"text": "second"}]
        }))
        .unwrap();
        let TypedResponse::Tutorial(tutorial) = response else {
            panic!("expected tutorial");
        };
        assert_eq!(tutorial.steps[0], TutorialStep::new(1, "first"));
        assert_eq!(tutorial.steps[1].step_number, 2);
    }

    #[test]
    fn test_unknown_types_fold_into_general() {
        for raw in ["no_relevant_content", "tutorial_fallback", "clarify_question", "fallback"] {
            let response =
                TypedResponse::from_value(json!({"type": raw, "content": "hmm"})).unwrap();
            assert_eq!(response.kind(), ResponseKind::General);
            let TypedResponse::General(general) = response else {
                unreachable!()
            };
            assert_eq!(general.source_type.as_deref(), Some(raw));
        }
    }

    #[test]
    fn test_missing_type_is_general() {
        let response = TypedResponse::from_value(json!({"content": "hello"})).unwrap();
        assert_eq!(response, TypedResponse::general("hello"));
    }

    #[test]
    fn test_suggestions_alias() {
        let response = TypedResponse::from_value(json!({
            "type": "error",
            "content": "Sorry",
            "suggestions": ["What can you help me with?"]
        }))
        .unwrap();
        assert_eq!(response.kind(), ResponseKind::Error);
        assert_eq!(response.suggested_actions(), ["What can you help me with?"]);
    }

    #[test]
    fn test_capability_features_accept_strings_and_objects() {
        let response = TypedResponse::from_value(json!({
            "type": "capabilities",
            "title": "I'm MIRA",
            "content": "I'm here to help.",
            "features": [
                {"title": "Visual Walkthroughs", "description": "Pictures", "icon": "📸"},
                "Bilingual Support"
            ],
            "footer_cta": "What would you like to learn today?"
        }))
        .unwrap();
        let TypedResponse::Capabilities(caps) = response else {
            panic!("expected capabilities");
        };
        assert_eq!(caps.features[0].icon.as_deref(), Some("📸"));
        assert_eq!(caps.features[1].title, "Bilingual Support");
        assert!(caps.features[1].description.is_empty());
    }

    #[test]
    fn test_missing_content_is_data_shape_error() {
        let err = TypedResponse::from_value(json!({"type": "tutorial", "steps": []})).unwrap_err();
        assert!(err.is_data_shape());

        let err = TypedResponse::from_value(json!("just a string")).unwrap_err();
        assert!(err.is_data_shape());
    }

    #[test]
    fn test_serialize_uses_snake_case_tag() {
        let response = TypedResponse::TutorialClarify(ClarifyResponse {
            content: "Step 1 clarification:".to_string(),
            clarified_step: ClarifiedStep {
                step_number: 1,
                clarified: "Click the gear icon".to_string(),
                ..ClarifiedStep::default()
            },
            suggested_actions: Vec::new(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "tutorial_clarify");
        assert_eq!(value["clarified_step"]["clarified"], "Click the gear icon");
    }
}
