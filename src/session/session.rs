use super::config::SessionConfig;
use super::registry::Services;
use super::state::{LifecycleCell, RecorderState};
use super::stats::SessionStats;
use crate::artifact::{Artifact, ArtifactStore};
use crate::audio::encoder::{negotiate_format, CaptureEncoder, CaptureEvent, EncoderFactory};
use crate::audio::input::MicrophoneBroker;
use crate::error::{RecorderError, RecorderResult};
use crate::notify::{Notice, Notifier};
use crate::transcribe::TranscriptionCoordinator;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Count whitespace-delimited non-empty tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

struct ResponseText {
    /// Learner's response, externally editable; committed transcript text is
    /// appended here
    text: String,
    /// Provisional recognition text, replaced on every result batch
    interim: String,
    word_count: usize,
}

/// One response widget's capture lifecycle
///
/// Created once per discovered widget and alive for the page's duration,
/// cycling `Idle → Acquiring → Recording → Stopping → Finalizing → Idle`.
/// Chunks accumulate during capture; on stop they are finalized into a
/// downloadable artifact, replacing the previous one.
pub struct RecorderSession {
    id: String,
    config: SessionConfig,

    broker: Arc<MicrophoneBroker>,
    coordinator: Arc<TranscriptionCoordinator>,
    store: Arc<ArtifactStore>,
    encoders: Arc<dyn EncoderFactory>,
    notifier: Arc<dyn Notifier>,

    lifecycle: LifecycleCell,
    chunks: StdMutex<Vec<Vec<u8>>>,
    response: StdMutex<ResponseText>,
    artifact: StdMutex<Option<Artifact>>,
    started_at: StdMutex<Option<DateTime<Utc>>>,
    mime_type: StdMutex<String>,

    /// Encoder for the in-flight recording
    encoder: Mutex<Option<Box<dyn CaptureEncoder>>>,
    /// Handle for the capture event pump
    capture_task: Mutex<Option<JoinHandle<()>>>,
}

impl RecorderSession {
    pub(crate) fn new(id: String, services: &Services) -> Self {
        Self {
            id,
            config: services.config.clone(),
            broker: Arc::clone(&services.broker),
            coordinator: Arc::clone(&services.coordinator),
            store: Arc::clone(&services.store),
            encoders: Arc::clone(&services.encoders),
            notifier: Arc::clone(&services.notifier),
            lifecycle: LifecycleCell::new(),
            chunks: StdMutex::new(Vec::new()),
            response: StdMutex::new(ResponseText {
                text: String::new(),
                interim: String::new(),
                word_count: 0,
            }),
            artifact: StdMutex::new(None),
            started_at: StdMutex::new(None),
            mime_type: StdMutex::new(String::new()),
            encoder: Mutex::new(None),
            capture_task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> RecorderState {
        self.lifecycle.state()
    }

    /// Start a new recording
    ///
    /// The registry has already stopped every other session. Acquires the
    /// shared input (the one awaited step — a cancel while it is pending
    /// abandons the attempt and the late grant is discarded), then starts the
    /// encoder, attaches transcription and arms the max-duration timer.
    pub async fn begin(self: &Arc<Self>) -> RecorderResult<()> {
        let Some(attempt) = self.lifecycle.begin_attempt() else {
            warn!("[{}] start ignored: session not idle", self.id);
            return Ok(());
        };

        let input = match self.broker.acquire().await {
            Ok(input) => input,
            Err(e) => {
                if self.lifecycle.abandon(attempt) {
                    self.report_capture_failure(&e);
                }
                return Err(e);
            }
        };

        // The attempt may have been cancelled while the grant was pending
        if !self.lifecycle.is_current(attempt) {
            info!("[{}] discarding input grant for abandoned attempt", self.id);
            return Ok(());
        }

        let mime = negotiate_format(self.encoders.as_ref(), &self.config.format_preferences);
        let mut encoder = match self.encoders.create(&input, &mime) {
            Ok(encoder) => encoder,
            Err(e) => {
                if self.lifecycle.abandon(attempt) {
                    self.report_capture_failure(&e);
                }
                return Err(e);
            }
        };

        let events = match encoder.start().await {
            Ok(events) => events,
            Err(e) => {
                if self.lifecycle.abandon(attempt) {
                    self.report_capture_failure(&e);
                }
                return Err(e);
            }
        };

        // Chunks from the previous recording are gone once a new one starts
        self.chunks.lock().expect("chunk lock poisoned").clear();
        *self.mime_type.lock().expect("mime lock poisoned") = mime.clone();
        *self.encoder.lock().await = Some(encoder);

        if !self.lifecycle.try_transition(
            &[RecorderState::Acquiring],
            RecorderState::Recording,
            attempt,
        ) {
            // Cancelled in the meantime; tear the encoder down again
            if let Some(mut encoder) = self.encoder.lock().await.take() {
                let _ = encoder.stop().await;
            }
            return Ok(());
        }

        *self.started_at.lock().expect("started_at lock poisoned") = Some(Utc::now());

        let pump = tokio::spawn(Self::capture_pump(Arc::clone(self), attempt, events));
        *self.capture_task.lock().await = Some(pump);

        // Transcription is best-effort; a dead engine never blocks capture
        if let Err(e) = self.coordinator.attach(self).await {
            warn!("[{}] transcription unavailable: {}", self.id, e);
        }

        if self.config.auto_stop {
            self.arm_max_duration_timer(attempt);
        }

        self.notifier.recording_state_changed(&self.id, true);
        self.notifier.session_status(&self.id, "Recording...");
        info!("[{}] recording started ({})", self.id, mime);

        Ok(())
    }

    /// Stop the current recording and finalize it
    ///
    /// Detaches transcription, flushes the encoder and waits for the capture
    /// pump to finalize, so the whole stop → flush → finalize sequence has
    /// completed when this returns.
    pub async fn stop(&self) -> RecorderResult<()> {
        let Some(attempt) = self.lifecycle.attempt() else {
            return Ok(());
        };

        if !self.lifecycle.try_transition(
            &[RecorderState::Recording],
            RecorderState::Stopping,
            attempt,
        ) {
            return Ok(());
        }

        self.notifier.recording_state_changed(&self.id, false);
        self.notifier.session_status(&self.id, "Processing recording...");
        info!("[{}] recording stopping", self.id);

        self.coordinator.detach(self).await;

        let encoder = self.capture_encoder().await;
        if let Some(mut encoder) = encoder {
            if let Err(e) = encoder.stop().await {
                warn!("[{}] error stopping encoder: {}", self.id, e);
                self.notifier
                    .notify(Notice::error("Error stopping recording."));
            }
        }

        // The pump finalizes once it has observed the flush
        let task = self.capture_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("[{}] capture task panicked: {}", self.id, e);
            }
        }

        Ok(())
    }

    /// Abandon an acquisition that has not been granted yet
    pub fn cancel_acquire(&self) {
        let Some(attempt) = self.lifecycle.attempt() else {
            return;
        };
        if self.lifecycle.abandon(attempt) {
            info!("[{}] acquisition cancelled", self.id);
        }
    }

    /// Drive this session to `Idle`, whatever it is doing
    ///
    /// Used by the registry to enforce single-recording exclusivity before
    /// another session may start.
    pub async fn force_stop(&self) {
        match self.state() {
            RecorderState::Idle => {}
            RecorderState::Acquiring => self.cancel_acquire(),
            RecorderState::Recording => {
                let _ = self.stop().await;
            }
            RecorderState::Stopping | RecorderState::Finalizing => {
                self.lifecycle.wait_until_idle().await;
            }
        }
    }

    /// Wait until the session has returned to `Idle`
    pub async fn wait_until_idle(&self) {
        self.lifecycle.wait_until_idle().await;
    }

    async fn capture_pump(
        session: Arc<RecorderSession>,
        attempt: Uuid,
        mut events: mpsc::Receiver<CaptureEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                CaptureEvent::Chunk(bytes) => session.push_chunk(attempt, bytes),
                CaptureEvent::Flushed => break,
            }
        }

        session.finalize(attempt);
    }

    fn push_chunk(&self, attempt: Uuid, bytes: Vec<u8>) {
        if bytes.is_empty() || !self.lifecycle.is_current(attempt) {
            return;
        }
        match self.state() {
            RecorderState::Recording | RecorderState::Stopping => {
                self.chunks.lock().expect("chunk lock poisoned").push(bytes);
            }
            _ => {}
        }
    }

    /// Combine the accumulated chunks into this session's artifact
    fn finalize(&self, attempt: Uuid) {
        if !self.lifecycle.try_transition(
            &[RecorderState::Stopping],
            RecorderState::Finalizing,
            attempt,
        ) {
            return;
        }

        let chunks = std::mem::take(&mut *self.chunks.lock().expect("chunk lock poisoned"));
        let mime = self.mime_type.lock().expect("mime lock poisoned").clone();

        // The store revokes the previous handle before issuing the new one
        let artifact = self.store.finalize(&self.id, chunks, &mime);
        *self.artifact.lock().expect("artifact lock poisoned") = Some(artifact);

        self.lifecycle
            .try_transition(&[RecorderState::Finalizing], RecorderState::Idle, attempt);

        self.notifier.session_status(&self.id, "Recording complete");
        info!("[{}] recording finalized", self.id);
    }

    fn arm_max_duration_timer(self: &Arc<Self>, attempt: Uuid) {
        let weak = Arc::downgrade(self);
        let max_duration = self.config.max_duration;

        tokio::spawn(async move {
            tokio::time::sleep(max_duration).await;

            let Some(session) = weak.upgrade() else {
                return;
            };
            // Only fire for the attempt that armed the timer, and only while
            // it is still recording; a finished session makes this a no-op
            if session.lifecycle.is_current(attempt)
                && session.state() == RecorderState::Recording
            {
                info!("[{}] max recording duration reached", session.id);
                let _ = session.stop().await;
            }
        });
    }

    async fn capture_encoder(&self) -> Option<Box<dyn CaptureEncoder>> {
        self.encoder.lock().await.take()
    }

    fn report_capture_failure(&self, error: &RecorderError) {
        warn!("[{}] could not start recording: {}", self.id, error);
        let message = match error {
            RecorderError::PermissionDenied(_) | RecorderError::DeviceUnavailable(_) => {
                "Could not access microphone. Please check your browser settings."
            }
            _ => "Could not start recording.",
        };
        self.notifier.notify(Notice::error(message));
    }

    // ------------------------------------------------------------------
    // Response text and transcript
    // ------------------------------------------------------------------

    /// Replace the learner's response text (external edits)
    pub fn set_response_text(&self, text: &str) {
        let mut response = self.response.lock().expect("response lock poisoned");
        response.text = text.to_string();
        response.word_count = word_count(&response.text);
    }

    /// Append one committed transcript fragment, with a trailing separator
    pub fn append_final_transcript(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut response = self.response.lock().expect("response lock poisoned");
        response.text.push_str(text);
        response.text.push(' ');
        response.word_count = word_count(&response.text);
    }

    /// Replace the provisional transcript text
    pub fn set_interim_transcript(&self, text: &str) {
        let mut response = self.response.lock().expect("response lock poisoned");
        response.interim.clear();
        response.interim.push_str(text);
    }

    pub fn clear_interim_transcript(&self) {
        self.set_interim_transcript("");
    }

    pub fn response_text(&self) -> String {
        self.response
            .lock()
            .expect("response lock poisoned")
            .text
            .clone()
    }

    pub fn interim_transcript(&self) -> String {
        self.response
            .lock()
            .expect("response lock poisoned")
            .interim
            .clone()
    }

    pub fn word_count(&self) -> usize {
        self.response
            .lock()
            .expect("response lock poisoned")
            .word_count
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    /// The latest finalized recording, if any
    pub fn artifact(&self) -> Option<Artifact> {
        self.artifact
            .lock()
            .expect("artifact lock poisoned")
            .clone()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().expect("chunk lock poisoned").len()
    }

    /// Save the latest recording into `dir`
    pub fn download_latest(&self, dir: &Path) -> Result<PathBuf> {
        let Some(artifact) = self.artifact() else {
            bail!("no finished recording for session {}", self.id);
        };

        let path = self.store.download(&artifact, dir)?;
        self.notifier.notify(Notice::success("Recording saved."));
        Ok(path)
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let started_at = *self.started_at.lock().expect("started_at lock poisoned");
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            session_id: self.id.clone(),
            state: self.state(),
            started_at,
            duration_secs,
            chunk_count: self.chunk_count(),
            word_count: self.word_count(),
            has_artifact: self.artifact.lock().expect("artifact lock poisoned").is_some(),
        }
    }
}
