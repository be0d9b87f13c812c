use super::config::SessionConfig;
use super::session::RecorderSession;
use super::state::RecorderState;
use crate::artifact::ArtifactStore;
use crate::audio::encoder::EncoderFactory;
use crate::audio::input::MicrophoneBroker;
use crate::error::RecorderResult;
use crate::notify::Notifier;
use crate::transcribe::TranscriptionCoordinator;
use std::sync::Arc;
use tracing::{info, warn};

/// One response widget discovered on the page
#[derive(Debug, Clone)]
pub struct WidgetDescriptor {
    /// Stable widget identity
    pub id: String,
}

impl WidgetDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Shared capabilities every session works against
#[derive(Clone)]
pub struct Services {
    pub broker: Arc<MicrophoneBroker>,
    pub coordinator: Arc<TranscriptionCoordinator>,
    pub store: Arc<ArtifactStore>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub notifier: Arc<dyn Notifier>,
    pub config: SessionConfig,
}

/// All recorder sessions on the page
///
/// Holds one session per discovered widget, in discovery order, and owns the
/// single-active-recording invariant: before any session may start, every
/// other one is driven back to `Idle`.
pub struct SessionRegistry {
    sessions: Vec<Arc<RecorderSession>>,
}

impl SessionRegistry {
    /// Build one session per discovered widget
    pub fn register_all(widgets: &[WidgetDescriptor], services: Services) -> Self {
        let sessions: Vec<_> = widgets
            .iter()
            .map(|widget| Arc::new(RecorderSession::new(widget.id.clone(), &services)))
            .collect();

        info!("Registered {} response widgets", sessions.len());

        Self { sessions }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<RecorderSession>> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    /// Sessions in discovery order
    pub fn sessions(&self) -> &[Arc<RecorderSession>] {
        &self.sessions
    }

    /// The session currently recording or winding down, if any
    pub fn active_session(&self) -> Option<&Arc<RecorderSession>> {
        self.sessions.iter().find(|session| {
            matches!(
                session.state(),
                RecorderState::Recording | RecorderState::Stopping
            )
        })
    }

    /// Handle a record-button press for one widget
    ///
    /// Pressing the button of the session that is already recording stops
    /// it; pressing any other button stops whatever else is active, then
    /// starts that session.
    pub async fn toggle(&self, id: &str) -> RecorderResult<()> {
        let Some(session) = self.get(id) else {
            warn!("toggle for unknown widget: {}", id);
            return Ok(());
        };

        match session.state() {
            RecorderState::Recording => session.stop().await,
            RecorderState::Stopping | RecorderState::Finalizing => {
                // A stop is already underway; let it finish
                session.wait_until_idle().await;
                Ok(())
            }
            RecorderState::Acquiring => {
                session.cancel_acquire();
                Ok(())
            }
            RecorderState::Idle => {
                self.enforce_exclusive(id).await;
                session.begin().await
            }
        }
    }

    /// Drive every session other than `requester` back to `Idle`
    ///
    /// Completes each stop sequence (including finalize) before returning,
    /// so at most one session is ever capturing.
    pub async fn enforce_exclusive(&self, requester: &str) {
        for session in &self.sessions {
            if session.id() != requester && session.state() != RecorderState::Idle {
                info!(
                    "[{}] stopping so that [{}] can record",
                    session.id(),
                    requester
                );
                session.force_stop().await;
            }
        }
    }
}
