//! Recorder session management
//!
//! This module provides the per-widget `RecorderSession` state machine and
//! the `SessionRegistry` that:
//! - builds one session per discovered response widget
//! - enforces the single-active-recording invariant
//! - routes record-button presses (toggle semantics)
//! - tracks response text, word counts and session statistics

mod config;
mod registry;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use registry::{Services, SessionRegistry, WidgetDescriptor};
pub use session::{word_count, RecorderSession};
pub use state::RecorderState;
pub use stats::SessionStats;
