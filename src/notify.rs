//! Presentation-layer contract
//!
//! The recording core never touches the page. Everything the user sees goes
//! through the `Notifier` trait: transient global messages, per-widget status
//! lines and record-button state changes. The host decides how (and for how
//! long) to render them.

use tracing::{error, info, warn};

/// Severity of a transient global message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
    Success,
    Info,
}

/// A transient, dismissible message shown outside any single widget
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Callbacks into the (out-of-scope) presentation layer
pub trait Notifier: Send + Sync {
    /// Show a transient global message
    fn notify(&self, notice: Notice);

    /// Update the status line of one response widget
    fn session_status(&self, session_id: &str, status: &str);

    /// Flip a widget's record button between recording and idle
    fn recording_state_changed(&self, session_id: &str, recording: bool);
}

/// Default notifier that routes everything to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => info!("{}", notice.message),
        }
    }

    fn session_status(&self, session_id: &str, status: &str) {
        info!("[{}] {}", session_id, status);
    }

    fn recording_state_changed(&self, session_id: &str, recording: bool) {
        info!(
            "[{}] recording {}",
            session_id,
            if recording { "started" } else { "stopped" }
        );
    }
}
