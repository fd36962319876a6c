//! Chat use case.
//!
//! `ChatController` is the single owner of a tab's `ClientState`. It lends
//! the state to the session manager, composes the send pipeline as one
//! async function and drives the renderer and the voice recorder.

use mira_core::audio::AudioDevice;
use mira_core::client_state::ClientState;
use mira_core::config::ClientConfig;
use mira_core::conversation::{Message, ReconcileOutcome};
use mira_core::error::{MiraError, Result};
use mira_core::response::{ErrorResponse, ResponseKind, TypedResponse};
use mira_core::session::{
    ChatBackend, ChatRequest, ImageProbe, RestoreOutcome, SelectOutcome, SessionBackend,
    SessionManager, TranscriptionBackend,
};
use mira_core::state::repository::StateRepository;
use mira_infrastructure::HttpAssistantClient;
use mira_interaction::{
    Affordance, ImageViewer, ProgressiveRenderer, RenderPlan, RenderSink, ResponseDispatcher,
    RevealHandle, StartOutcome, TickCallback, VoiceRecorder,
};
use std::sync::Arc;

/// Notice shown in place of a reply when a send fails.
pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, something went wrong. Try again.";

/// Recovery suggestions offered with the generic error notice.
pub const DEFAULT_SUGGESTIONS: [&str; 2] = ["How to add a new region?", "What can you help me with?"];

/// The backend collaborators of a controller.
#[derive(Clone)]
pub struct Backends {
    pub sessions: Arc<dyn SessionBackend>,
    pub chat: Arc<dyn ChatBackend>,
    pub transcription: Arc<dyn TranscriptionBackend>,
    /// Image availability checks; `None` shows every image.
    pub images: Option<Arc<dyn ImageProbe>>,
}

impl Backends {
    /// Uses one client for every backend concern.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: SessionBackend + ChatBackend + TranscriptionBackend + ImageProbe + 'static,
    {
        Self {
            sessions: client.clone(),
            chat: client.clone(),
            transcription: client.clone(),
            images: Some(client),
        }
    }

    /// HTTP backends for `config.base_url`.
    pub fn http(config: &ClientConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(HttpAssistantClient::new(config)?)))
    }
}

/// Result of one send cycle.
#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input; nothing was sent.
    Empty,
    Replied {
        session_id: String,
        /// `true` when this send created the session.
        created_session: bool,
        kind: ResponseKind,
        reveal: RevealHandle,
        /// `None` when the reply carried no canonical history.
        reconcile: Option<ReconcileOutcome>,
    },
    /// The send failed; the generic notice was shown.
    Failed { error: MiraError },
}

/// Result of finishing a voice recording.
#[derive(Debug)]
pub enum VoiceOutcome {
    NotRecording,
    /// Nothing usable came back; the attempt was dropped.
    NoTranscript,
    Sent { transcript: String, outcome: SendOutcome },
}

pub struct ChatController {
    state: ClientState,
    sessions: SessionManager,
    chat: Arc<dyn ChatBackend>,
    transcription: Arc<dyn TranscriptionBackend>,
    dispatcher: ResponseDispatcher,
    renderer: ProgressiveRenderer,
    recorder: VoiceRecorder,
    viewer: ImageViewer,
    sink: Arc<dyn RenderSink>,
    /// Affordances of the latest rendered reply.
    affordances: Vec<Affordance>,
}

impl ChatController {
    /// Creates a controller for one tab.
    ///
    /// # Arguments
    ///
    /// * `backends` - Session, chat, transcription and image backends
    /// * `state_repository` - The tab's active-session pointer store
    /// * `audio_device` - Input device used by the voice recorder
    /// * `sink` - Where replies are rendered
    /// * `config` - Client configuration
    pub fn new(
        backends: Backends,
        state_repository: Arc<dyn StateRepository>,
        audio_device: Arc<dyn AudioDevice>,
        sink: Arc<dyn RenderSink>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            state: ClientState::new(),
            sessions: SessionManager::new(
                backends.sessions,
                state_repository,
                config.user_id.clone(),
                config.license_id.clone(),
            ),
            chat: backends.chat,
            transcription: backends.transcription,
            dispatcher: ResponseDispatcher::new(config.base_url.clone()),
            renderer: ProgressiveRenderer::new(config.reveal.clone(), backends.images),
            recorder: VoiceRecorder::new(audio_device),
            viewer: ImageViewer::new(),
            sink,
            affordances: Vec::new(),
        }
    }

    /// Sets the callback receiving the recording counter each second.
    pub fn with_recording_ticker(mut self, on_tick: TickCallback) -> Self {
        self.recorder = self.recorder.with_ticker(on_tick);
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    /// Affordance by its 1-based position.
    pub fn affordance(&self, position: usize) -> Option<&Affordance> {
        position
            .checked_sub(1)
            .and_then(|index| self.affordances.get(index))
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Restores the tab's session and replays its history.
    pub async fn restore_on_load(&mut self) -> Result<RestoreOutcome> {
        let outcome = self
            .sessions
            .restore_on_load(&mut self.state)
            .await
            .inspect_err(|e| tracing::error!("[ChatController] Restore failed: {}", e))?;

        match &outcome {
            RestoreOutcome::Restored(_) => self.replay_history().await,
            RestoreOutcome::Landing | RestoreOutcome::StalePointerCleared(_) => {
                self.affordances.clear();
                self.sessions.refresh_after_mutation(&mut self.state).await;
            }
        }
        Ok(outcome)
    }

    pub async fn select_session(&mut self, session_id: &str) -> Result<SelectOutcome> {
        if !self.state.is_active(session_id) {
            self.renderer.cancel_current();
            self.affordances.clear();
        }

        let outcome = self
            .sessions
            .select_session(&mut self.state, session_id)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "[ChatController] Failed to load session {}: {}",
                    session_id,
                    e
                )
            })?;

        if let SelectOutcome::Selected { .. } = outcome {
            self.replay_history().await;
        }
        Ok(outcome)
    }

    pub async fn new_chat(&mut self) -> Result<()> {
        self.renderer.cancel_current();
        self.affordances.clear();
        self.sessions.new_chat(&mut self.state).await
    }

    /// Returns `true` if the deleted session was the active one.
    pub async fn delete_session(&mut self, session_id: &str) -> Result<bool> {
        let was_active = self
            .sessions
            .delete_session(&mut self.state, session_id)
            .await?;
        if was_active {
            self.renderer.cancel_current();
            self.affordances.clear();
        }
        Ok(was_active)
    }

    pub async fn rename_session(&mut self, session_id: &str, title: &str) -> Result<()> {
        self.sessions
            .rename_session(&mut self.state, session_id, title)
            .await
    }

    pub async fn refresh_sessions(&mut self) -> Result<()> {
        self.sessions.refresh_sessions(&mut self.state).await
    }

    // ============================================================================
    // Send pipeline
    // ============================================================================

    /// Sends a message and starts revealing the reply.
    ///
    /// Transport and data-shape failures never escape: they are logged, the
    /// generic notice is rendered and the conversation keeps only the
    /// optimistic user message. If the backend no longer knows the active
    /// session, the tab falls back to landing and the message is sent once
    /// more on a newly created session.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }
        self.renderer.cancel_current();

        let result = match self.try_send(text).await {
            // The active session was deleted elsewhere: land and send again on a fresh one.
            Err(error) if error.is_not_found() && self.state.active_session_id.is_some() => {
                tracing::warn!(
                    "[ChatController] Active session is gone ({}), starting a new chat",
                    error
                );
                match self.sessions.new_chat(&mut self.state).await {
                    Ok(()) => {
                        self.affordances.clear();
                        self.try_send(text).await
                    }
                    Err(reset) => Err(reset),
                }
            }
            other => other,
        };

        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!("[ChatController] Send failed: {}", error);
                self.render_generic_error().await;
                SendOutcome::Failed { error }
            }
        }
    }

    async fn try_send(&mut self, text: &str) -> Result<SendOutcome> {
        let ensured = self.sessions.ensure_session_for_send(&mut self.state).await?;

        self.state.conversation.append_optimistic(Message::user(text));

        let request = ChatRequest {
            message: text.to_string(),
            session_id: ensured.session_id.clone(),
            last_tutorial: self.state.tutorial.steps().to_vec(),
        };
        tracing::debug!(
            "[ChatController] Sending to {} with {} tutorial steps",
            request.session_id,
            request.last_tutorial.len()
        );
        let reply = self.chat.send_chat(&request).await?;

        let plan = self.dispatcher.dispatch(&reply.response);
        self.affordances = plan.affordances.clone();
        let reveal = self.renderer.start(plan, self.sink.clone());

        self.state.conversation.append_reply(&reply.response);
        self.state.tutorial.observe(&reply.response);
        let reconcile = reply
            .conversation_history
            .as_deref()
            .map(|history| self.state.conversation.reconcile_with_server(history));

        self.sessions.refresh_after_mutation(&mut self.state).await;

        Ok(SendOutcome::Replied {
            session_id: ensured.session_id,
            created_session: ensured.created,
            kind: reply.response.kind(),
            reveal,
            reconcile,
        })
    }

    async fn render_generic_error(&mut self) {
        let notice = TypedResponse::Error(ErrorResponse {
            content: GENERIC_ERROR_MESSAGE.to_string(),
            suggested_actions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        });
        let plan = self.dispatcher.dispatch(&notice);
        self.affordances = plan.affordances.clone();
        self.renderer
            .render_immediate(&plan, self.sink.as_ref())
            .await;
    }

    /// Renders the whole conversation without animation.
    pub async fn replay_history(&mut self) {
        self.affordances.clear();
        for message in self.state.conversation.messages() {
            if message.is_user() {
                self.sink.user_message(message.content());
                continue;
            }
            let plan = match message.data() {
                Some(response) => self.dispatcher.dispatch(response),
                None => RenderPlan::plain(message.content()),
            };
            self.renderer
                .render_immediate(&plan, self.sink.as_ref())
                .await;
            self.affordances = plan.affordances;
        }
    }

    // ============================================================================
    // Affordances and image viewer
    // ============================================================================

    /// Activates an affordance.
    ///
    /// Returns the message to send for suggestions and clarify shortcuts.
    /// Image affordances open the viewer instead.
    pub fn activate(&mut self, affordance: &Affordance, scroll_offset: u16) -> Option<String> {
        match affordance {
            Affordance::ViewImage(url) => {
                self.viewer.open(url.clone(), scroll_offset);
                None
            }
            Affordance::Suggest(_) | Affordance::ClarifyStep(_) => affordance.message_text(),
        }
    }

    /// Image URLs of the latest reply, in display order.
    pub fn images(&self) -> Vec<&str> {
        self.affordances
            .iter()
            .filter_map(|a| match a {
                Affordance::ViewImage(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn viewer(&self) -> &ImageViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut ImageViewer {
        &mut self.viewer
    }

    // ============================================================================
    // Voice
    // ============================================================================

    /// Starts recording. A permission failure is returned for the caller to alert on.
    pub fn start_recording(&mut self) -> Result<StartOutcome> {
        self.recorder
            .start()
            .inspect_err(|e| tracing::warn!("[ChatController] Recording unavailable: {}", e))
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.state() == mira_interaction::RecorderState::Recording
    }

    /// Stops recording, transcribes the audio and sends the transcript.
    ///
    /// Failures are logged and dropped; no partial transcript is sent.
    pub async fn stop_recording_and_send(&mut self) -> VoiceOutcome {
        let audio = match self.recorder.stop() {
            Ok(Some(audio)) => audio,
            Ok(None) => return VoiceOutcome::NotRecording,
            Err(e) => {
                tracing::error!("[ChatController] Failed to finalize recording: {}", e);
                return VoiceOutcome::NoTranscript;
            }
        };

        let transcript = match self.transcription.transcribe(audio).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("[ChatController] Transcription returned no text");
                return VoiceOutcome::NoTranscript;
            }
            Err(e) => {
                tracing::error!("[ChatController] Transcription failed: {}", e);
                return VoiceOutcome::NoTranscript;
            }
        };

        self.sink.user_message(&transcript);
        let outcome = self.send(&transcript).await;
        VoiceOutcome::Sent {
            transcript,
            outcome,
        }
    }
}
