//! Voice capture over an injected speech recognizer.
//!
//! One `VoiceCapture` handle owns at most one running capture. The capture
//! runs as a tokio task, reports progress on a `watch` channel and hands
//! its single result over a `oneshot`. Stopping cancels the task and waits
//! for it, so a transcript can never arrive after `stop()` returns.

pub mod intent;
pub mod transcript;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::NoteflowError;

pub use transcript::normalize_transcript;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("No speech detected within timeout.")]
    Timeout,
    #[error("Could not understand audio.")]
    Unintelligible,
    #[error("Could not request results; {0}")]
    Request(String),
}

/// Listens once and returns the raw recognized text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn listen(&self) -> Result<String, RecognitionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Listening,
    Recording,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Transcript(String),
    Cancelled,
}

/// Turn a recognizer result into display text. Failures become diagnostic
/// transcripts rather than errors.
fn transcript_for(result: Result<String, RecognitionError>) -> String {
    match result {
        Ok(text) => normalize_transcript(&text),
        Err(e) => e.to_string(),
    }
}

/// Clears the owner's busy flag when the capture task ends, however it ends.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct VoiceCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    active: Arc<AtomicBool>,
}

impl VoiceCapture {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start capturing. Rejected while another capture from this handle
    /// is still running.
    pub fn start(&self) -> Result<CaptureSession, NoteflowError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(NoteflowError::CaptureInProgress);
        }
        let guard = ActiveGuard(self.active.clone());

        let (status_tx, status_rx) = watch::channel(CaptureStatus::Listening);
        let (result_tx, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let recognizer = self.recognizer.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            status_tx.send_replace(CaptureStatus::Recording);

            let heard = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => None,
                result = recognizer.listen() => Some(result),
            };
            status_tx.send_replace(CaptureStatus::Finished);

            match heard {
                Some(result) if !task_cancel.is_cancelled() => {
                    let text = transcript_for(result);
                    log::info!("Capture finished ({} chars)", text.len());
                    let _ = result_tx.send(text);
                }
                _ => log::info!("Capture cancelled"),
            }
        });

        Ok(CaptureSession {
            status: status_rx,
            result: result_rx,
            cancel,
            task,
        })
    }
}

/// A running capture.
pub struct CaptureSession {
    status: watch::Receiver<CaptureStatus>,
    result: oneshot::Receiver<String>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CaptureSession {
    pub fn status(&self) -> watch::Receiver<CaptureStatus> {
        self.status.clone()
    }

    /// Wait for the transcript.
    pub async fn result(self) -> CaptureOutcome {
        match self.result.await {
            Ok(text) => CaptureOutcome::Transcript(text),
            Err(_) => CaptureOutcome::Cancelled,
        }
    }

    /// Cancel and wait for the task to wind down. Any transcript produced
    /// in the meantime is discarded.
    pub async fn stop(self) -> CaptureOutcome {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::warn!("Capture task ended abnormally: {}", e);
        }
        drop(self.result);
        CaptureOutcome::Cancelled
    }
}
