use crate::error::RecorderResult;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Descriptor for the shared audio input
///
/// Cheap to clone; the underlying device stays owned by the host platform.
#[derive(Debug, Clone)]
pub struct InputHandle {
    /// Identity of this acquisition
    pub id: Uuid,
    /// Human-readable device label
    pub label: String,
    /// Sample rate the input delivers, in Hz
    pub sample_rate: u32,
    /// Number of channels the input delivers
    pub channels: u16,
}

/// Platform capability that grants access to the user's microphone
///
/// Granting is user-permission-gated and may fail with `PermissionDenied`
/// or `DeviceUnavailable`. Implementations must not prompt more than once
/// per `request` call.
#[async_trait::async_trait]
pub trait AudioInputSource: Send + Sync {
    /// Ask the platform for the microphone input
    async fn request(&self) -> RecorderResult<InputHandle>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Owns the one shared microphone handle for the whole page
///
/// The first successful `acquire` is memoized and reused by every session;
/// the handle is never released for the lifetime of the process. A failed
/// acquisition is not retried here — the caller reports it and stays idle.
pub struct MicrophoneBroker {
    source: Box<dyn AudioInputSource>,
    handle: Mutex<Option<InputHandle>>,
}

impl MicrophoneBroker {
    pub fn new(source: Box<dyn AudioInputSource>) -> Self {
        Self {
            source,
            handle: Mutex::new(None),
        }
    }

    /// Get the shared input handle, requesting it on first use
    pub async fn acquire(&self) -> RecorderResult<InputHandle> {
        let mut handle = self.handle.lock().await;

        if let Some(existing) = handle.as_ref() {
            return Ok(existing.clone());
        }

        info!("Requesting audio input from {}", self.source.name());

        match self.source.request().await {
            Ok(acquired) => {
                info!(
                    "Audio input acquired: {} ({}Hz, {} channels)",
                    acquired.label, acquired.sample_rate, acquired.channels
                );
                *handle = Some(acquired.clone());
                Ok(acquired)
            }
            Err(e) => {
                warn!("Audio input acquisition failed: {}", e);
                Err(e)
            }
        }
    }

    /// Whether an input handle is currently held
    pub async fn is_acquired(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}
