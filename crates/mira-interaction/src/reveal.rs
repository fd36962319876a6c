//! Progressive reveal of assistant replies.
//!
//! A reveal runs as its own task: every tick it re-formats the whole
//! revealed prefix and hands it to the sink. Once the prose is complete
//! the step images are probed and the structured blocks and affordances
//! follow. Starting a new reveal cancels the one in flight.

use crate::dispatcher::{Affordance, Block, RenderPlan};
use crate::rich_text::{RichText, format_rich};
use mira_core::config::RevealConfig;
use mira_core::session::ImageProbe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Destination of rendered output.
pub trait RenderSink: Send + Sync {
    /// Replaces the prose shown for the current reply. `complete` is set on the last frame.
    fn prose_frame(&self, frame: &RichText, complete: bool);

    fn append_structured(&self, blocks: &[Block]);

    /// (Re-)binds the interactive elements of the current reply.
    fn bind_affordances(&self, affordances: &[Affordance]);

    /// Marks an image that failed to load.
    ///
    /// Called before the blocks and affordances referencing `url`, which
    /// must then be shown without it.
    fn hide_image(&self, url: &str);

    /// Shows a user message that was not typed into the input (history replay, voice).
    fn user_message(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Handle to an in-flight reveal.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    cancel: CancellationToken,
    done: watch::Receiver<Option<RevealOutcome>>,
}

impl RevealHandle {
    /// Stops the reveal. Structured content is not appended after a cancel.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Waits until the reveal completes or is cancelled.
    pub async fn finished(&self) -> RevealOutcome {
        let mut done = self.done.clone();
        loop {
            if let Some(outcome) = *done.borrow_and_update() {
                return outcome;
            }
            if done.changed().await.is_err() {
                let outcome = *done.borrow();
                return outcome.unwrap_or(RevealOutcome::Cancelled);
            }
        }
    }
}

pub struct ProgressiveRenderer {
    config: RevealConfig,
    probe: Option<Arc<dyn ImageProbe>>,
    current: Option<RevealHandle>,
}

impl ProgressiveRenderer {
    pub fn new(config: RevealConfig, probe: Option<Arc<dyn ImageProbe>>) -> Self {
        Self {
            config,
            probe,
            current: None,
        }
    }

    /// Cancels the reveal in flight, if any.
    pub fn cancel_current(&mut self) {
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                tracing::debug!("[Reveal] Cancelling in-flight reveal");
            }
            handle.cancel();
        }
    }

    /// Starts revealing `plan` on a new task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, plan: RenderPlan, sink: Arc<dyn RenderSink>) -> RevealHandle {
        self.cancel_current();

        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(None);
        let handle = RevealHandle {
            cancel: cancel.clone(),
            done: done_rx,
        };

        let config = self.config.clone();
        let probe = self.probe.clone();
        tokio::spawn(async move {
            let outcome = run_reveal(&config, &plan, sink.as_ref(), &cancel).await;
            if outcome == RevealOutcome::Completed {
                finish_structured(&plan, sink.as_ref(), probe.as_deref()).await;
            }
            let _ = done_tx.send(Some(outcome));
        });

        self.current = Some(handle.clone());
        handle
    }

    /// Renders `plan` at once with no timer, as used for history replay.
    pub async fn render_immediate(&self, plan: &RenderPlan, sink: &dyn RenderSink) {
        sink.prose_frame(&format_rich(&plan.prose), true);
        finish_structured(plan, sink, self.probe.as_deref()).await;
    }
}

async fn run_reveal(
    config: &RevealConfig,
    plan: &RenderPlan,
    sink: &dyn RenderSink,
    cancel: &CancellationToken,
) -> RevealOutcome {
    let chars: Vec<char> = plan.prose.chars().collect();
    let step = config.chunk_chars.max(1);
    let mut end = 0;

    loop {
        end = (end + step).min(chars.len());
        let prefix: String = chars[..end].iter().collect();
        let complete = end == chars.len();
        sink.prose_frame(&format_rich(&prefix), complete);
        if complete {
            return RevealOutcome::Completed;
        }

        tokio::select! {
            _ = cancel.cancelled() => return RevealOutcome::Cancelled,
            _ = tokio::time::sleep(config.interval()) => {}
        }
    }
}

async fn finish_structured(plan: &RenderPlan, sink: &dyn RenderSink, probe: Option<&dyn ImageProbe>) {
    if let Some(probe) = probe {
        for url in plan.images() {
            if !probe.probe(url).await {
                tracing::debug!("[Reveal] Hiding unavailable image {}", url);
                sink.hide_image(url);
            }
        }
    }

    if !plan.blocks.is_empty() {
        sink.append_structured(&plan.blocks);
    }
    sink.bind_affordances(&plan.affordances);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NoteKind;
    use async_trait::async_trait;
    use mira_core::response::ResponseKind;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Frame(String, bool),
        Structured(usize),
        Bound(usize),
        Hidden(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl RenderSink for RecordingSink {
        fn prose_frame(&self, frame: &RichText, complete: bool) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Frame(frame.plain_text(), complete));
        }

        fn append_structured(&self, blocks: &[Block]) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Structured(blocks.len()));
        }

        fn bind_affordances(&self, affordances: &[Affordance]) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Bound(affordances.len()));
        }

        fn hide_image(&self, url: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Hidden(url.to_string()));
        }

        fn user_message(&self, _text: &str) {}
    }

    struct BrokenImages;

    #[async_trait]
    impl ImageProbe for BrokenImages {
        async fn probe(&self, url: &str) -> bool {
            !url.ends_with("broken.png")
        }
    }

    fn plan() -> RenderPlan {
        RenderPlan {
            kind: ResponseKind::Tutorial,
            prose: "**Hello** you".to_string(),
            blocks: vec![
                Block::Step {
                    number: 1,
                    text: "Open".to_string(),
                    image: Some("http://h/broken.png".to_string()),
                },
                Block::Note {
                    kind: NoteKind::Summary,
                    text: "done".to_string(),
                },
            ],
            affordances: vec![Affordance::ClarifyStep(1)],
        }
    }

    fn config() -> RevealConfig {
        RevealConfig {
            interval_ms: 10,
            chunk_chars: 4,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_frames_then_structured() {
        let sink = Arc::new(RecordingSink::default());
        let mut renderer = ProgressiveRenderer::new(config(), Some(Arc::new(BrokenImages)));

        let handle = renderer.start(plan(), sink.clone());
        assert_eq!(handle.finished().await, RevealOutcome::Completed);
        assert!(handle.is_finished());

        let events = sink.events();
        // "**Hello** you" is 13 chars: prefixes of 4, 8, 12, 13.
        assert_eq!(
            events,
            vec![
                Event::Frame("He".to_string(), false),
                Event::Frame("Hello".to_string(), false),
                Event::Frame("Hello yo".to_string(), false),
                Event::Frame("Hello you".to_string(), true),
                Event::Hidden("http://h/broken.png".to_string()),
                Event::Structured(2),
                Event::Bound(1),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_starting_new_reveal_cancels_previous() {
        let sink = Arc::new(RecordingSink::default());
        let mut renderer = ProgressiveRenderer::new(config(), None);

        let first = renderer.start(plan(), sink.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;
        let second = renderer.start(RenderPlan::plain("ok"), sink.clone());

        assert_eq!(first.finished().await, RevealOutcome::Cancelled);
        assert_eq!(second.finished().await, RevealOutcome::Completed);
        assert!(!sink.events().contains(&Event::Structured(2)));
    }

    #[tokio::test]
    async fn test_render_immediate_has_single_frame() {
        let sink = RecordingSink::default();
        let renderer = ProgressiveRenderer::new(config(), None);

        renderer.render_immediate(&plan(), &sink).await;

        assert_eq!(
            sink.events(),
            vec![
                Event::Frame("Hello you".to_string(), true),
                Event::Structured(2),
                Event::Bound(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_broken_image_is_hidden_before_its_step_is_shown() {
        let sink = RecordingSink::default();
        let renderer = ProgressiveRenderer::new(config(), Some(Arc::new(BrokenImages)));
        let mut plan = plan();
        plan.blocks.push(Block::Step {
            number: 2,
            text: "Save".to_string(),
            image: Some("http://h/ok.png".to_string()),
        });

        renderer.render_immediate(&plan, &sink).await;

        let events = sink.events();
        let hidden = events
            .iter()
            .position(|e| *e == Event::Hidden("http://h/broken.png".to_string()))
            .unwrap();
        let structured = events
            .iter()
            .position(|e| matches!(e, Event::Structured(_)))
            .unwrap();
        assert!(hidden < structured);
        assert!(!events.contains(&Event::Hidden("http://h/ok.png".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_prose_completes_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let mut renderer = ProgressiveRenderer::new(config(), None);

        let handle = renderer.start(RenderPlan::plain(""), sink.clone());

        assert_eq!(handle.finished().await, RevealOutcome::Completed);
        assert_eq!(sink.events()[0], Event::Frame(String::new(), true));
    }
}
