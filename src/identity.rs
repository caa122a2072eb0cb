//! Per-device player identity persisted across sessions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::types::PlayerId;

const DEFAULT_IDENTITY_FILE: &str = "whosaidit-identity.json";

/// On-disk record associating this device with its most recent seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityRecord {
    player_id: PlayerId,
    saved_at: String,
}

/// Stores the player id handed out by the last create/join, so a returning
/// client can re-associate with its existing Player row. No expiry.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the identity file path from `IDENTITY_FILE`, with a local
    /// default next to the working directory.
    pub fn from_env() -> Self {
        let path = std::env::var("IDENTITY_FILE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_IDENTITY_FILE.to_string());
        Self::new(path)
    }

    /// Read the saved player id, if any. An unreadable or corrupt file is
    /// treated as absent so the device simply gets a fresh seat next time.
    pub fn load(&self) -> Option<PlayerId> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<IdentityRecord>(&raw) {
            Ok(record) => Some(record.player_id),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "identity file unreadable, ignoring");
                None
            }
        }
    }

    /// Persist the player id for the next session, replacing any previous one.
    pub fn save(&self, player_id: &PlayerId) -> StoreResult<()> {
        let record = IdentityRecord {
            player_id: player_id.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        let raw = serde_json::to_string_pretty(&record).map_err(|e| StoreError::Io(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        std::fs::write(&self.path, raw).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}
