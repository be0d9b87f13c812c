// Shared fixtures for the integration tests: scripted stand-ins for the
// platform capabilities (audio input, capture encoder, recognition engine,
// presentation layer) so session behavior can be driven deterministically.

#![allow(dead_code)]

use fluent_recorder::{
    ArtifactStore, AudioInputSource, CaptureEncoder, CaptureEvent, EncoderFactory, EngineEvent,
    InputHandle, MicrophoneBroker, Notice, NoticeLevel, Notifier, RecognitionEngine,
    RecorderError, RecorderResult, Services, SessionConfig, SessionRegistry,
    TranscriptionCoordinator, WidgetDescriptor,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

fn test_handle() -> InputHandle {
    InputHandle {
        id: Uuid::new_v4(),
        label: "scripted microphone".to_string(),
        sample_rate: 48000,
        channels: 1,
    }
}

/// Input source that always grants, counting requests
pub struct GrantingSource {
    pub requests: Arc<AtomicUsize>,
}

impl GrantingSource {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl AudioInputSource for GrantingSource {
    async fn request(&self) -> RecorderResult<InputHandle> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(test_handle())
    }

    fn name(&self) -> &str {
        "granting"
    }
}

/// Input source that always refuses consent
pub struct DenyingSource;

#[async_trait::async_trait]
impl AudioInputSource for DenyingSource {
    async fn request(&self) -> RecorderResult<InputHandle> {
        Err(RecorderError::PermissionDenied(
            "user refused the prompt".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "denying"
    }
}

/// Input source that blocks until the test releases its gate
pub struct GatedSource {
    gate: Arc<Semaphore>,
}

impl GatedSource {
    /// Returns the source and the gate; `gate.add_permits(n)` releases
    /// pending (and future) grants
    pub fn new() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self { gate: Arc::clone(&gate) }, gate)
    }
}

#[async_trait::async_trait]
impl AudioInputSource for GatedSource {
    async fn request(&self) -> RecorderResult<InputHandle> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| RecorderError::DeviceUnavailable("gate closed".to_string()))?;
        permit.forget();
        Ok(test_handle())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Capture encoder whose chunk stream is fed by the test
pub struct ScriptedEncoder {
    mime: String,
    taps: Arc<Mutex<Vec<mpsc::Sender<CaptureEvent>>>>,
    events_tx: Option<mpsc::Sender<CaptureEvent>>,
    capturing: bool,
}

#[async_trait::async_trait]
impl CaptureEncoder for ScriptedEncoder {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<CaptureEvent>> {
        let (tx, rx) = mpsc::channel(32);
        self.taps
            .lock()
            .expect("tap lock poisoned")
            .push(tx.clone());
        self.events_tx = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        if let Some(tx) = self.events_tx.take() {
            let _ = tx.send(CaptureEvent::Flushed).await;
        }
        self.capturing = false;
        Ok(())
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }
}

/// Factory for scripted encoders; keeps every created encoder's event
/// sender so tests can inject chunks in capture order
pub struct ScriptedEncoderFactory {
    pub taps: Arc<Mutex<Vec<mpsc::Sender<CaptureEvent>>>>,
}

impl EncoderFactory for ScriptedEncoderFactory {
    fn supports(&self, mime_type: &str) -> bool {
        mime_type == "audio/webm"
    }

    fn create(
        &self,
        _input: &InputHandle,
        mime_type: &str,
    ) -> RecorderResult<Box<dyn CaptureEncoder>> {
        Ok(Box::new(ScriptedEncoder {
            mime: mime_type.to_string(),
            taps: Arc::clone(&self.taps),
            events_tx: None,
            capturing: false,
        }))
    }
}

/// Test handle into the scripted recognition engine
#[derive(Clone)]
pub struct EngineProbe {
    pub running: Arc<AtomicBool>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub events: mpsc::Sender<EngineEvent>,
}

impl EngineProbe {
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Simulate the engine dying on its own (before an `Ended` event)
    pub fn mark_ended(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Recognition engine driven entirely by the test
pub struct ScriptedEngine {
    language: String,
    running: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    events_rx: Option<mpsc::Receiver<EngineEvent>>,
    events_tx: mpsc::Sender<EngineEvent>,
}

impl ScriptedEngine {
    pub fn new(language: &str) -> (Self, EngineProbe) {
        let (events_tx, events_rx) = mpsc::channel(32);
        let running = Arc::new(AtomicBool::new(false));
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));

        let probe = EngineProbe {
            running: Arc::clone(&running),
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
            events: events_tx.clone(),
        };

        (
            Self {
                language: language.to_string(),
                running,
                starts,
                stops,
                events_rx: Some(events_rx),
                events_tx,
            },
            probe,
        )
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for ScriptedEngine {
    async fn start(&mut self) -> RecorderResult<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn take_event_stream(&mut self) -> Option<mpsc::Receiver<EngineEvent>> {
        self.events_rx.take()
    }
}

/// Notifier that records everything it is asked to present
#[derive(Default)]
pub struct CollectingNotifier {
    pub notices: Mutex<Vec<Notice>>,
    pub statuses: Mutex<Vec<(String, String)>>,
    pub button_states: Mutex<Vec<(String, bool)>>,
}

impl CollectingNotifier {
    pub fn notices_at(&self, level: NoticeLevel) -> Vec<Notice> {
        self.notices
            .lock()
            .expect("notice lock poisoned")
            .iter()
            .filter(|n| n.level == level)
            .cloned()
            .collect()
    }

    pub fn stop_count(&self, session_id: &str) -> usize {
        self.button_states
            .lock()
            .expect("button lock poisoned")
            .iter()
            .filter(|(id, recording)| id == session_id && !recording)
            .count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .expect("notice lock poisoned")
            .push(notice);
    }

    fn session_status(&self, session_id: &str, status: &str) {
        self.statuses
            .lock()
            .expect("status lock poisoned")
            .push((session_id.to_string(), status.to_string()));
    }

    fn recording_state_changed(&self, session_id: &str, recording: bool) {
        self.button_states
            .lock()
            .expect("button lock poisoned")
            .push((session_id.to_string(), recording));
    }
}

/// Fully wired registry over scripted capabilities
pub struct Harness {
    pub registry: SessionRegistry,
    pub store: Arc<ArtifactStore>,
    pub notifier: Arc<CollectingNotifier>,
    pub coordinator: Arc<TranscriptionCoordinator>,
    pub taps: Arc<Mutex<Vec<mpsc::Sender<CaptureEvent>>>>,
    pub engine: EngineProbe,
}

impl Harness {
    /// Event sender of the most recently created encoder
    pub fn latest_tap(&self) -> mpsc::Sender<CaptureEvent> {
        self.taps
            .lock()
            .expect("tap lock poisoned")
            .last()
            .cloned()
            .expect("no encoder was created")
    }

    pub async fn send_chunk(&self, bytes: &[u8]) {
        self.latest_tap()
            .send(CaptureEvent::Chunk(bytes.to_vec()))
            .await
            .expect("capture channel closed");
    }
}

/// Harness over scripted encoders (the default)
pub fn build_harness(
    widget_ids: &[&str],
    source: Box<dyn AudioInputSource>,
    config: SessionConfig,
) -> Harness {
    let taps = Arc::new(Mutex::new(Vec::new()));
    let encoders: Arc<dyn EncoderFactory> = Arc::new(ScriptedEncoderFactory {
        taps: Arc::clone(&taps),
    });
    build_harness_inner(widget_ids, source, encoders, taps, config)
}

/// Harness over a caller-supplied encoder factory
pub fn build_harness_with_encoders(
    widget_ids: &[&str],
    source: Box<dyn AudioInputSource>,
    encoders: Arc<dyn EncoderFactory>,
    config: SessionConfig,
) -> Harness {
    let taps = Arc::new(Mutex::new(Vec::new()));
    build_harness_inner(widget_ids, source, encoders, taps, config)
}

fn build_harness_inner(
    widget_ids: &[&str],
    source: Box<dyn AudioInputSource>,
    encoders: Arc<dyn EncoderFactory>,
    taps: Arc<Mutex<Vec<mpsc::Sender<CaptureEvent>>>>,
    config: SessionConfig,
) -> Harness {
    let notifier = Arc::new(CollectingNotifier::default());
    let dyn_notifier: Arc<dyn Notifier> = Arc::clone(&notifier) as Arc<dyn Notifier>;

    let (engine, probe) = ScriptedEngine::new(&config.language);
    let coordinator = TranscriptionCoordinator::spawn(Box::new(engine), Arc::clone(&dyn_notifier));

    let store = Arc::new(ArtifactStore::new());

    let services = Services {
        broker: Arc::new(MicrophoneBroker::new(source)),
        coordinator: Arc::clone(&coordinator),
        store: Arc::clone(&store),
        encoders,
        notifier: dyn_notifier,
        config,
    };

    let widgets: Vec<WidgetDescriptor> = widget_ids
        .iter()
        .map(|id| WidgetDescriptor::new(*id))
        .collect();

    Harness {
        registry: SessionRegistry::register_all(&widgets, services),
        store,
        notifier,
        coordinator,
        taps,
        engine: probe,
    }
}
