//! Continuous transcription
//!
//! Wraps the platform's continuous speech-to-text capability and routes its
//! results to whichever session is currently recording. Transcription is a
//! best-effort enhancement; capture never depends on it.

pub mod coordinator;
pub mod engine;

pub use coordinator::TranscriptionCoordinator;
pub use engine::{EngineError, EngineEvent, RecognitionEngine, RecognitionFragment};
