pub mod artifact;
pub mod audio;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod transcribe;

pub use artifact::{Artifact, ArtifactHandle, ArtifactStore};
pub use audio::{
    extension_for, negotiate_format, AudioFrame, AudioInputSource, CaptureEncoder, CaptureEvent,
    EncoderFactory, InputHandle, MicrophoneBroker, WavCaptureEncoder, WavEncoderFactory,
};
pub use config::Config;
pub use error::{RecorderError, RecorderResult};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use session::{
    word_count, RecorderSession, RecorderState, Services, SessionConfig, SessionRegistry,
    SessionStats, WidgetDescriptor,
};
pub use transcribe::{
    EngineError, EngineEvent, RecognitionEngine, RecognitionFragment, TranscriptionCoordinator,
};
