//! Voice capture scaffolding.
//!
//! The actual speech-to-text backend lives behind `VoiceTranscriber`; this
//! module only guarantees that at most one blocking listen cycle runs at a
//! time and that transcripts reach the dispatcher like typed input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::dispatcher::{Dispatcher, TurnOutcome};

/// One blocking listen-and-transcribe cycle.
///
/// `Ok(None)` means nothing intelligible was heard; that is not an error.
pub trait VoiceTranscriber: Send + 'static {
    fn listen_once(&mut self) -> anyhow::Result<Option<String>>;
}

/// Placeholder backend that never hears anything. Lets the rest of the
/// pipeline be wired and tested without an audio stack.
pub struct SilentTranscriber;

impl VoiceTranscriber for SilentTranscriber {
    fn listen_once(&mut self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Runs listen cycles off the async runtime, one at a time.
pub struct VoiceCapture {
    transcriber: Arc<Mutex<Box<dyn VoiceTranscriber>>>,
    in_flight: Arc<AtomicBool>,
}

impl VoiceCapture {
    pub fn new(transcriber: impl VoiceTranscriber) -> Self {
        Self {
            transcriber: Arc::new(Mutex::new(Box::new(transcriber))),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run one listen cycle on a blocking thread.
    ///
    /// Returns `Ok(None)` immediately if a cycle is already in flight or
    /// nothing was heard.
    pub async fn capture_once(&self) -> anyhow::Result<Option<String>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Voice capture already in flight, skipping");
            return Ok(None);
        }

        let transcriber = self.transcriber.clone();

        let joined = tokio::task::spawn_blocking(move || {
            transcriber
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .listen_once()
        })
        .await;

        // Release the guard before propagating a join error, so a panicking
        // backend does not block every later capture.
        self.in_flight.store(false, Ordering::SeqCst);

        joined.map_err(|e| anyhow::anyhow!("voice capture task panicked: {e}"))?
    }

    /// Capture once and feed any transcript through the dispatcher, exactly
    /// like typed input.
    pub async fn capture_and_dispatch(
        &self,
        dispatcher: &Dispatcher,
    ) -> anyhow::Result<Option<TurnOutcome>> {
        match self.capture_once().await? {
            Some(transcript) => {
                info!(transcript = %transcript, "Voice transcript captured");
                Ok(Some(dispatcher.handle_input(&transcript).await))
            }
            None => Ok(None),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
