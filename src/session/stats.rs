use super::state::RecorderState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a recorder session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Widget this session belongs to
    pub session_id: String,

    /// Where the session is in its capture cycle
    pub state: RecorderState,

    /// When the current (or most recent) recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Elapsed recording time in seconds
    pub duration_secs: f64,

    /// Number of encoded chunks accumulated so far
    pub chunk_count: usize,

    /// Word count of the learner's response text
    pub word_count: usize,

    /// Whether a finalized recording exists for this session
    pub has_artifact: bool,
}
