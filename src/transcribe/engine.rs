use crate::error::RecorderResult;
use tokio::sync::mpsc;

/// One piece of recognized speech
#[derive(Debug, Clone)]
pub struct RecognitionFragment {
    /// Recognized text
    pub text: String,
    /// Final fragments are committed; non-final ones are provisional
    pub is_final: bool,
    /// Confidence score (0.0 to 1.0), if the engine reports one
    pub confidence: Option<f32>,
}

impl RecognitionFragment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            confidence: None,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            confidence: None,
        }
    }
}

/// Errors reported by the recognition engine
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Recognition consent refused (user-facing)
    NotAllowed(String),
    /// Transient network problem (warning, capture unaffected)
    Network(String),
    /// Anything else (logged and swallowed)
    Other(String),
}

/// Events a recognition engine delivers to its single subscriber
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A batch of recognition results, final and interim mixed
    Results(Vec<RecognitionFragment>),
    /// The engine terminated, deliberately or spontaneously
    Ended,
    Error(EngineError),
}

/// Continuous speech-to-text capability
///
/// Configured for one language locale. The engine may terminate on its own
/// (reporting `Ended`) and must accept being started again; `start` on a
/// running engine is a silent no-op. All events flow through one channel that
/// survives restarts.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Begin continuous recognition (no-op when already running)
    async fn start(&mut self) -> RecorderResult<()>;

    /// Stop recognition (no-op when not running)
    async fn stop(&mut self) -> RecorderResult<()>;

    /// Whether the engine is currently recognizing
    fn is_running(&self) -> bool;

    /// The configured recognition locale, e.g. "en-US"
    fn language(&self) -> &str;

    /// Take the single event receiver
    ///
    /// Returns `None` on every call after the first; the engine has exactly
    /// one subscriber.
    fn take_event_stream(&mut self) -> Option<mpsc::Receiver<EngineEvent>>;
}
