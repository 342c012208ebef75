use crate::client::{AutogenClient, ClientError};
use crate::models::{AutogenRequest, GenerationResult};
use crate::reveal::Reveal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shown in place of marketing copy for any failure, transport or otherwise.
pub const FAILURE_MESSAGE: &str = "Failed to generate marketing copy. Please try again.";

/// How long the "Copied!" acknowledgement stays up.
pub const COPIED_RESET: Duration = Duration::from_secs(2);

/// Writes text to the system clipboard. Seam so the panel can be exercised
/// without a display server.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        arboard::Clipboard::new()?.set_text(text.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// The generation panel: collects a title and feature list, submits them to
/// the generation endpoint, and holds the result for display. One submission
/// at a time by construction (`submit` takes `&mut self`); each submission
/// clears the previous result before the request goes out.
pub struct Panel {
    client: AutogenClient,
    phase: Phase,
    result: GenerationResult,
    marketing_copy: String,
    reveal: Option<Reveal>,
    copied: CopiedFlag,
}

impl Panel {
    pub fn new(client: AutogenClient) -> Self {
        Self {
            client,
            phase: Phase::Idle,
            result: GenerationResult::default(),
            marketing_copy: String::new(),
            reveal: None,
            copied: CopiedFlag::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// The full, non-animated marketing copy (or the failure message).
    pub fn marketing_copy(&self) -> &str {
        &self.marketing_copy
    }

    pub fn result(&self) -> &GenerationResult {
        &self.result
    }

    /// The animated prefix currently on display.
    pub fn displayed_copy(&self) -> String {
        self.reveal
            .as_ref()
            .map(|r| r.displayed())
            .unwrap_or_default()
    }

    /// Watch the reveal as it progresses; `None` before the first submission.
    pub fn subscribe_reveal(&self) -> Option<watch::Receiver<String>> {
        self.reveal.as_ref().map(Reveal::subscribe)
    }

    pub fn copied(&self) -> bool {
        self.copied.get()
    }

    /// Splits textarea-style feature text into the submitted feature list:
    /// blank and whitespace-only lines are discarded, order is preserved.
    pub fn split_features(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Submits the current form contents. Always returns with the loading
    /// flag cleared; no error escapes this path, every failure collapses into
    /// [`FAILURE_MESSAGE`].
    pub async fn submit(&mut self, title: &str, features_text: &str) -> Phase {
        self.reset_for_submission();

        let request = AutogenRequest {
            title: title.trim().to_string(),
            features: Self::split_features(features_text),
        };

        match self.client.generate(&request).await {
            Ok(result) => {
                info!(images = result.images.len(), "generation succeeded");
                self.marketing_copy = result.marketing_copy.clone();
                self.result = result;
                self.phase = Phase::Ready;
            }
            Err(e) => {
                self.log_failure(&e);
                self.marketing_copy = FAILURE_MESSAGE.to_string();
                self.phase = Phase::Failed;
            }
        }
        // new copy arrived: replacing the handle cancels any previous reveal
        self.reveal = Some(Reveal::start(&self.marketing_copy));
        self.phase
    }

    /// Clears everything the previous submission put on screen. Runs before
    /// the request is sent, so stale output is never shown while loading.
    fn reset_for_submission(&mut self) {
        self.phase = Phase::Loading;
        self.result = GenerationResult::default();
        self.marketing_copy.clear();
        self.reveal = None;
        self.copied.clear();
    }

    fn log_failure(&self, e: &ClientError) {
        match e {
            ClientError::Missing(field) => error!(field, "generation response unusable"),
            other => error!(error = %other, "generation failed"),
        }
    }

    /// Copies the full marketing copy to the clipboard. Success raises the
    /// transient copied flag; failure is logged and leaves state unchanged.
    pub fn copy_to_clipboard(&mut self, sink: &mut dyn ClipboardSink) {
        if self.marketing_copy.is_empty() {
            return;
        }
        match sink.set_text(&self.marketing_copy) {
            Ok(()) => self.copied.raise(),
            Err(e) => error!(error = %e, "failed to copy text"),
        }
    }
}

/// Transient acknowledgement with an auto-revert timer. Raising it again
/// reschedules; the previous timer is aborted so only one is ever pending.
struct CopiedFlag {
    state: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl CopiedFlag {
    fn new() -> Self {
        Self {
            state: Arc::new(AtomicBool::new(false)),
            timer: None,
        }
    }

    fn get(&self) -> bool {
        self.state.load(Ordering::SeqCst)
    }

    fn raise(&mut self) {
        self.cancel_timer();
        self.state.store(true, Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(COPIED_RESET).await;
            state.store(false, Ordering::SeqCst);
        }));
    }

    fn clear(&mut self) {
        self.cancel_timer();
        self.state.store(false, Ordering::SeqCst);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for CopiedFlag {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
