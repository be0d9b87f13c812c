//! Finished-recording lifecycle
//!
//! A finalized recording becomes an `Artifact`: the encoded bytes plus a
//! revocable playback handle. The store keeps one ledger entry per session so
//! a new recording always revokes its predecessor's handle before taking its
//! place.

use crate::audio::encoder::extension_for;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Revocable reference to a finalized recording's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle {
    id: Uuid,
}

impl ArtifactHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// A finalized, playable recording
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub handle: ArtifactHandle,
}

#[derive(Default)]
struct Ledger {
    /// Live handle per session (at most one)
    current: HashMap<String, ArtifactHandle>,
    /// Handles that have been revoked, with revocation counts
    revoked: HashMap<Uuid, usize>,
}

/// Owns artifact handles for every session on the page
#[derive(Default)]
pub struct ArtifactStore {
    ledger: Mutex<Ledger>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine a recording's chunks into one artifact
    ///
    /// Chunks are concatenated in capture order. The session's previous
    /// handle, if any, is revoked before the new one is installed, so a
    /// session never holds two live handles.
    pub fn finalize(&self, session_id: &str, chunks: Vec<Vec<u8>>, mime_type: &str) -> Artifact {
        let mut bytes = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in &chunks {
            bytes.extend_from_slice(chunk);
        }

        let handle = ArtifactHandle { id: Uuid::new_v4() };

        let mut ledger = self.ledger.lock().expect("artifact ledger poisoned");
        if let Some(previous) = ledger.current.remove(session_id) {
            *ledger.revoked.entry(previous.id).or_insert(0) += 1;
            info!(
                "[{}] revoked previous artifact handle {}",
                session_id, previous.id
            );
        }
        ledger.current.insert(session_id.to_string(), handle);

        info!(
            "[{}] artifact finalized: {} chunks, {} bytes, {}",
            session_id,
            chunks.len(),
            bytes.len(),
            mime_type
        );

        Artifact {
            bytes,
            mime_type: mime_type.to_string(),
            handle,
        }
    }

    /// Revoke a handle explicitly
    ///
    /// Returns false if the handle was already revoked or never issued by
    /// this store's finalize path.
    pub fn revoke(&self, handle: ArtifactHandle) -> bool {
        let mut ledger = self.ledger.lock().expect("artifact ledger poisoned");

        let session = ledger
            .current
            .iter()
            .find(|(_, h)| h.id == handle.id)
            .map(|(s, _)| s.clone());

        match session {
            Some(session) => {
                ledger.current.remove(&session);
                *ledger.revoked.entry(handle.id).or_insert(0) += 1;
                true
            }
            None => {
                warn!("attempted to revoke a dead handle: {}", handle.id);
                false
            }
        }
    }

    /// Whether the handle is still live
    pub fn is_live(&self, handle: ArtifactHandle) -> bool {
        let ledger = self.ledger.lock().expect("artifact ledger poisoned");
        ledger.current.values().any(|h| h.id == handle.id)
    }

    /// The session's current live handle, if any
    pub fn current_handle(&self, session_id: &str) -> Option<ArtifactHandle> {
        let ledger = self.ledger.lock().expect("artifact ledger poisoned");
        ledger.current.get(session_id).copied()
    }

    /// How many times the handle has been revoked (0 for live/unknown)
    pub fn revocation_count(&self, handle: ArtifactHandle) -> usize {
        let ledger = self.ledger.lock().expect("artifact ledger poisoned");
        ledger.revoked.get(&handle.id).copied().unwrap_or(0)
    }

    /// Save the artifact's bytes into `dir`
    ///
    /// The filename is `recording-<timestamp>.<ext>` where the timestamp is
    /// the current UTC time in ISO 8601 with ':' and '.' replaced by '-'.
    /// Pure side effect; neither the artifact nor any session changes.
    pub fn download(&self, artifact: &Artifact, dir: &Path) -> Result<PathBuf> {
        let timestamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let filename = format!(
            "recording-{}.{}",
            timestamp,
            extension_for(&artifact.mime_type)
        );

        let path = dir.join(filename);
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write recording to {:?}", path))?;

        info!("Recording saved: {:?} ({} bytes)", path, artifact.bytes.len());

        Ok(path)
    }
}
