//! HTTP client for the assistant backend.
//!
//! One `reqwest::Client` with a per-request timeout serves every endpoint.
//! Status handling is shared: 404 on a session route becomes
//! `MiraError::NotFound`, any other non-2xx becomes `MiraError::Transport`,
//! and a body that does not decode becomes `MiraError::DataShape`.

use async_trait::async_trait;
use mira_core::audio::RecordedAudio;
use mira_core::config::ClientConfig;
use mira_core::error::{MiraError, Result};
use mira_core::session::{
    ChatBackend, ChatReply, ChatRequest, ImageProbe, SessionBackend, SessionDetail,
    SessionSummary, TranscriptionBackend,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const AUDIO_FIELD: &str = "audio_data";

/// reqwest-backed implementation of every backend trait.
#[derive(Debug, Clone)]
pub struct HttpAssistantClient {
    client: Client,
    base_url: String,
}

impl HttpAssistantClient {
    /// Builds a client for `config.base_url` with `config.request_timeout()` on every call.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| MiraError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/sessions/{id}` with the id percent-encoded as one path segment.
    fn session_url(&self, session_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MiraError::config(format!("Invalid base_url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| MiraError::config(format!("base_url {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .push("sessions")
            .push(session_id);
        Ok(url)
    }

    /// Sends a request and checks its status.
    ///
    /// `entity` names the resource a 404 refers to; without it a 404 is a plain transport error.
    async fn execute(
        &self,
        request: RequestBuilder,
        operation: &str,
        entity: Option<(&'static str, &str)>,
    ) -> Result<Response> {
        let response = request.send().await.map_err(|err| {
            let message = if err.is_timeout() {
                format!("{operation} timed out: {err}")
            } else {
                format!("{operation} failed: {err}")
            };
            MiraError::transport(err.status().map(|s| s.as_u16()), message)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(map_http_error(status, &body, operation, entity))
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(|err| {
            MiraError::transport(None, format!("{operation}: failed to read body: {err}"))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|err| MiraError::data_shape(format!("{operation}: {err}")))
    }
}

#[derive(Deserialize)]
struct SessionListBody {
    #[serde(default)]
    sessions: Vec<SessionSummary>,
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    user_id: &'a str,
    license_id: &'a str,
}

#[derive(Deserialize)]
struct CreatedSessionBody {
    session_id: String,
}

#[derive(Serialize)]
struct RenameSessionBody<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct TranscriptionBody {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait]
impl SessionBackend for HttpAssistantClient {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let request = self
            .client
            .get(self.url("/sessions"))
            .query(&[("user_id", user_id)]);
        let response = self.execute(request, "List sessions", None).await?;
        let body: SessionListBody = Self::decode(response, "List sessions").await?;
        tracing::debug!("[HttpClient] Listed {} sessions", body.sessions.len());
        Ok(body.sessions)
    }

    async fn create_session(&self, user_id: &str, license_id: &str) -> Result<String> {
        let request = self
            .client
            .post(self.url("/sessions"))
            .json(&CreateSessionBody {
                user_id,
                license_id,
            });
        let response = self.execute(request, "Create session", None).await?;
        let body: CreatedSessionBody = Self::decode(response, "Create session").await?;
        Ok(body.session_id)
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionDetail> {
        let request = self.client.get(self.session_url(session_id)?);
        let response = self
            .execute(request, "Get session", Some(("session", session_id)))
            .await?;
        Self::decode(response, "Get session").await
    }

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        let request = self
            .client
            .put(self.session_url(session_id)?)
            .json(&RenameSessionBody { title });
        self.execute(request, "Rename session", Some(("session", session_id)))
            .await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let request = self.client.delete(self.session_url(session_id)?);
        self.execute(request, "Delete session", Some(("session", session_id)))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for HttpAssistantClient {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let http_request = self.client.post(self.url("/chat")).json(request);
        let response = self
            .execute(
                http_request,
                "Send chat",
                Some(("session", &request.session_id)),
            )
            .await?;
        let value: Value = Self::decode(response, "Send chat").await?;
        ChatReply::from_value(value)
    }
}

#[async_trait]
impl TranscriptionBackend for HttpAssistantClient {
    async fn transcribe(&self, audio: RecordedAudio) -> Result<Option<String>> {
        let part = Part::bytes(audio.bytes)
            .file_name(audio.format.file_name())
            .mime_str(audio.format.mime())
            .map_err(|e| MiraError::internal(format!("Invalid audio mime type: {e}")))?;
        let form = Form::new().part(AUDIO_FIELD, part);

        let request = self.client.post(self.url("/transcribe")).multipart(form);
        let response = self.execute(request, "Transcribe audio", None).await?;
        let body: TranscriptionBody = Self::decode(response, "Transcribe audio").await?;

        Ok(body.text.filter(|text| !text.trim().is_empty()))
    }
}

#[async_trait]
impl ImageProbe for HttpAssistantClient {
    async fn probe(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    "[HttpClient] Image {} unavailable ({})",
                    url,
                    response.status()
                );
                false
            }
            Err(err) => {
                tracing::debug!("[HttpClient] Image {} unavailable: {}", url, err);
                false
            }
        }
    }
}

fn map_http_error(
    status: StatusCode,
    body: &str,
    operation: &str,
    entity: Option<(&'static str, &str)>,
) -> MiraError {
    if status == StatusCode::NOT_FOUND {
        if let Some((entity_type, id)) = entity {
            return MiraError::not_found(entity_type, id);
        }
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|wrapper| wrapper.error)
        .unwrap_or_else(|_| body.trim().to_string());

    MiraError::transport(Some(status.as_u16()), format!("{operation}: {detail}"))
}
