use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every recorder session on the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Longest a single recording may run before it is auto-stopped
    /// Default: 60 seconds
    pub max_duration: Duration,

    /// Whether the max-duration timer is armed at all
    pub auto_stop: bool,

    /// Encoding formats in preference order; the first one the platform
    /// supports wins
    pub format_preferences: Vec<String>,

    /// Recognition locale (e.g. "en-US")
    pub language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(60),
            auto_stop: true,
            format_preferences: vec![
                "audio/webm".to_string(),
                "audio/mp4".to_string(),
                "audio/ogg".to_string(),
            ],
            language: "en-US".to_string(),
        }
    }
}
