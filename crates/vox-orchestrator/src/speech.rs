//! Speech output worker — a dedicated OS thread draining a FIFO queue of
//! utterances.
//!
//! Producers enqueue and return immediately; the worker speaks in order.
//! Shutdown pushes a sentinel: everything queued before it is still spoken,
//! then the thread exits and the owner joins with a bounded timeout.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// How long `shutdown` waits for the worker to drain and exit.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Output backend for one utterance. Blocking is fine; the worker owns its
/// own thread.
pub trait Speaker: Send + 'static {
    fn speak(&mut self, text: &str);
}

/// Prints utterances to stdout.
pub struct ConsoleSpeaker {
    prefix: String,
}

impl ConsoleSpeaker {
    pub fn new(assistant_name: &str) -> Self {
        Self {
            prefix: assistant_name.to_string(),
        }
    }
}

impl Speaker for ConsoleSpeaker {
    fn speak(&mut self, text: &str) {
        println!("{}: {}", self.prefix, text);
    }
}

enum QueueItem {
    Utterance(String),
    Shutdown,
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct SpeechHandle {
    tx: Sender<QueueItem>,
}

impl SpeechHandle {
    /// Enqueue one utterance. Returns immediately; the worker speaks it in
    /// FIFO order. Silently drops if the worker is already gone.
    pub fn say(&self, text: impl Into<String>) {
        let text = text.into();
        if self.tx.send(QueueItem::Utterance(text)).is_err() {
            warn!("Speech worker is gone, dropping utterance");
        }
    }
}

/// Owns the worker thread.
pub struct SpeechWorker {
    tx: Sender<QueueItem>,
    handle: Option<JoinHandle<()>>,
}

impl SpeechWorker {
    /// Spawn the worker thread around the given speaker.
    pub fn spawn(mut speaker: impl Speaker) -> Self {
        let (tx, rx): (Sender<QueueItem>, Receiver<QueueItem>) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("vox-speech".to_string())
            .spawn(move || {
                for item in rx {
                    match item {
                        QueueItem::Utterance(text) => speaker.speak(&text),
                        QueueItem::Shutdown => {
                            debug!("Speech worker received sentinel, exiting");
                            break;
                        }
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn speech worker thread: {e}"));

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// A producer handle for enqueueing utterances.
    pub fn handle(&self) -> SpeechHandle {
        SpeechHandle {
            tx: self.tx.clone(),
        }
    }

    /// Push the sentinel and join with a bounded timeout.
    ///
    /// Everything enqueued before this call is still spoken. A worker that
    /// outlives the timeout (a speaker stuck in a blocking call) is logged
    /// and detached rather than hanging shutdown.
    pub fn shutdown(mut self) {
        if self.tx.send(QueueItem::Shutdown).is_err() {
            // Worker already exited
            return;
        }

        let Some(handle) = self.handle.take() else {
            return;
        };

        // Bounded join: watch for thread exit from a side channel.
        let (done_tx, done_rx) = mpsc::channel();
        let watcher = thread::spawn(move || {
            let _ = handle.join();
            let _ = done_tx.send(());
        });

        match done_rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(()) => {
                let _ = watcher.join();
                debug!("Speech worker shut down cleanly");
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                warn!("Speech worker did not exit within timeout, detaching");
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
