use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub recorder: RecorderSettings,
    pub recognition: RecognitionSettings,
    pub download: DownloadSettings,
}

#[derive(Debug, Deserialize)]
pub struct RecorderSettings {
    /// Maximum length of one recording, in seconds
    pub max_recording_secs: u64,
    /// Whether recordings stop automatically at the maximum
    pub auto_stop: bool,
    /// Encoding formats in preference order
    pub format_preferences: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecognitionSettings {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadSettings {
    pub dir: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Runtime configuration for the recorder sessions
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_duration: Duration::from_secs(self.recorder.max_recording_secs),
            auto_stop: self.recorder.auto_stop,
            format_preferences: self.recorder.format_preferences.clone(),
            language: self.recognition.language.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            recorder: RecorderSettings {
                max_recording_secs: session.max_duration.as_secs(),
                auto_stop: session.auto_stop,
                format_preferences: session.format_preferences,
            },
            recognition: RecognitionSettings {
                language: session.language,
            },
            download: DownloadSettings {
                dir: "recordings".to_string(),
            },
        }
    }
}
