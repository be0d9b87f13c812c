use super::engine::{EngineError, EngineEvent, RecognitionEngine};
use crate::error::RecorderResult;
use crate::notify::{Notice, Notifier};
use crate::session::{RecorderSession, RecorderState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Routes one continuous recognition engine between recorder sessions
///
/// At most one session is attached at a time; the coordinator holds it
/// weakly and never outlives decisions about it. While the attached session
/// is recording, the engine is kept alive: if it ends on its own it is
/// restarted. Recognition failures never interrupt capture.
pub struct TranscriptionCoordinator {
    engine: Mutex<Box<dyn RecognitionEngine>>,
    attached: StdMutex<Option<Weak<RecorderSession>>>,
    notifier: Arc<dyn Notifier>,
    restarts: AtomicUsize,
}

impl TranscriptionCoordinator {
    /// Wrap an engine and spawn the event pump
    pub fn spawn(
        mut engine: Box<dyn RecognitionEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let events = engine.take_event_stream();

        let coordinator = Arc::new(Self {
            engine: Mutex::new(engine),
            attached: StdMutex::new(None),
            notifier,
            restarts: AtomicUsize::new(0),
        });

        if let Some(mut events) = events {
            let weak = Arc::downgrade(&coordinator);
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    let Some(coordinator) = weak.upgrade() else {
                        break;
                    };
                    coordinator.handle_event(event).await;
                }
            });
        } else {
            warn!("recognition engine had no event stream; transcription disabled");
        }

        coordinator
    }

    /// Attach the engine's results to a session
    ///
    /// Any previously attached session is detached first (its interim text
    /// cleared). Starts the engine if it is not already running.
    pub async fn attach(&self, session: &Arc<RecorderSession>) -> RecorderResult<()> {
        let previous = self
            .attached
            .lock()
            .expect("attachment lock poisoned")
            .replace(Arc::downgrade(session));

        if let Some(previous) = previous.and_then(|weak| weak.upgrade()) {
            if previous.id() != session.id() {
                previous.clear_interim_transcript();
            }
        }

        info!("[{}] transcription attached", session.id());

        let mut engine = self.engine.lock().await;
        if !engine.is_running() {
            engine.start().await?;
        }

        Ok(())
    }

    /// Detach a session and stop the engine
    ///
    /// Only effective when `session` is the currently attached one.
    pub async fn detach(&self, session: &RecorderSession) {
        {
            let mut attached = self.attached.lock().expect("attachment lock poisoned");
            let is_attached = attached
                .as_ref()
                .and_then(Weak::upgrade)
                .is_some_and(|current| current.id() == session.id());
            if !is_attached {
                return;
            }
            *attached = None;
        }

        session.clear_interim_transcript();
        info!("[{}] transcription detached", session.id());

        let mut engine = self.engine.lock().await;
        if engine.is_running() {
            if let Err(e) = engine.stop().await {
                warn!("failed to stop recognition engine: {}", e);
            }
        }
    }

    /// Process one engine event
    ///
    /// Exposed so ordering and attachment behavior can be exercised without
    /// a live engine; the spawned pump funnels everything through here.
    pub async fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Results(fragments) => {
                let Some(session) = self.attached_session() else {
                    return;
                };

                let mut interim = String::new();
                for fragment in fragments {
                    if fragment.is_final {
                        session.append_final_transcript(&fragment.text);
                    } else {
                        interim.push_str(&fragment.text);
                    }
                }

                // Interim text is replaced on every batch, even by emptiness
                session.set_interim_transcript(&interim);
            }

            EngineEvent::Ended => {
                let wants_restart = self
                    .attached_session()
                    .map(|session| session.state() == RecorderState::Recording)
                    .unwrap_or(false);

                if !wants_restart {
                    return;
                }

                let mut engine = self.engine.lock().await;
                if engine.is_running() {
                    return;
                }

                match engine.start().await {
                    Ok(()) => {
                        self.restarts.fetch_add(1, Ordering::SeqCst);
                        info!("recognition engine restarted");
                    }
                    Err(e) => {
                        warn!("recognition engine restart failed: {}", e);
                        self.notifier.notify(Notice::warning(
                            "Speech recognition was interrupted. Recording continues.",
                        ));
                    }
                }
            }

            EngineEvent::Error(error) => match error {
                EngineError::NotAllowed(reason) => {
                    warn!("recognition not allowed: {}", reason);
                    self.notifier.notify(Notice::error(
                        "Microphone access denied. Please allow microphone access \
                         to use voice recording.",
                    ));
                }
                EngineError::Network(reason) => {
                    warn!("recognition network error: {}", reason);
                    self.notifier.notify(Notice::warning(
                        "Network error occurred during speech recognition.",
                    ));
                }
                EngineError::Other(reason) => {
                    warn!("speech recognition error: {}", reason);
                }
            },
        }
    }

    /// Whether the underlying engine is currently running
    pub async fn engine_running(&self) -> bool {
        self.engine.lock().await.is_running()
    }

    /// How many times the engine has been auto-restarted
    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    fn attached_session(&self) -> Option<Arc<RecorderSession>> {
        self.attached
            .lock()
            .expect("attachment lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }
}
