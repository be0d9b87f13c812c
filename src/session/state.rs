use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

/// Where a recorder session is in its capture cycle
///
/// Sessions are page-lifetime objects; there is no terminal state, only the
/// cycle `Idle → Acquiring → Recording → Stopping → Finalizing → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Acquiring,
    Recording,
    Stopping,
    Finalizing,
}

struct Lifecycle {
    state: RecorderState,
    /// Identity of the in-flight recording attempt; late callbacks from an
    /// abandoned attempt carry a stale id and are discarded
    attempt: Option<Uuid>,
}

/// State holder for one session
///
/// Transitions are atomic with respect to the attempt id; observers follow
/// the state through a watch channel.
pub(crate) struct LifecycleCell {
    current: Mutex<Lifecycle>,
    watch_tx: watch::Sender<RecorderState>,
    watch_rx: watch::Receiver<RecorderState>,
}

impl LifecycleCell {
    pub fn new() -> Self {
        let (watch_tx, watch_rx) = watch::channel(RecorderState::Idle);
        Self {
            current: Mutex::new(Lifecycle {
                state: RecorderState::Idle,
                attempt: None,
            }),
            watch_tx,
            watch_rx,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.current.lock().expect("lifecycle lock poisoned").state
    }

    pub fn attempt(&self) -> Option<Uuid> {
        self.current.lock().expect("lifecycle lock poisoned").attempt
    }

    /// `Idle → Acquiring` with a fresh attempt id
    ///
    /// Returns `None` when the session is not idle.
    pub fn begin_attempt(&self) -> Option<Uuid> {
        let mut current = self.current.lock().expect("lifecycle lock poisoned");
        if current.state != RecorderState::Idle {
            return None;
        }

        let attempt = Uuid::new_v4();
        current.state = RecorderState::Acquiring;
        current.attempt = Some(attempt);
        let _ = self.watch_tx.send(RecorderState::Acquiring);
        Some(attempt)
    }

    /// Transition `from → to` if the state matches and the attempt is current
    ///
    /// Reaching `Idle` clears the attempt id, so anything still holding the
    /// old id can no longer transition the session.
    pub fn try_transition(
        &self,
        from: &[RecorderState],
        to: RecorderState,
        attempt: Uuid,
    ) -> bool {
        let mut current = self.current.lock().expect("lifecycle lock poisoned");
        if !from.contains(&current.state) || current.attempt != Some(attempt) {
            return false;
        }

        current.state = to;
        if to == RecorderState::Idle {
            current.attempt = None;
        }
        let _ = self.watch_tx.send(to);
        true
    }

    /// Abandon an in-flight acquisition: `Acquiring → Idle`
    ///
    /// Returns false when the attempt already moved on.
    pub fn abandon(&self, attempt: Uuid) -> bool {
        self.try_transition(&[RecorderState::Acquiring], RecorderState::Idle, attempt)
    }

    /// Whether the given attempt is still the session's current one
    pub fn is_current(&self, attempt: Uuid) -> bool {
        self.attempt() == Some(attempt)
    }

    pub fn subscribe(&self) -> watch::Receiver<RecorderState> {
        self.watch_rx.clone()
    }

    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // wait_for inspects the current value first, so an already-idle
        // session returns immediately
        let _ = rx.wait_for(|state| *state == RecorderState::Idle).await;
    }
}
