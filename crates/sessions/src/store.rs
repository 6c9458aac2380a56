//! Profile-scoped session identity.
//!
//! Persists the session identifier in `session.json` under the profile
//! directory.  The identifier is minted on first use and then only ever
//! read; there is no expiry.  If persistence fails the store degrades to
//! an in-memory identifier for the life of the process.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use courier_domain::error::Result;
use courier_domain::trace::TraceEvent;

/// On-disk shape of the persisted session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    session_id: String,
    created_at: DateTime<Utc>,
}

/// Durable per-profile session identity.
pub struct SessionStore {
    record_path: PathBuf,
    current: RwLock<Option<String>>,
}

impl SessionStore {
    /// Open the store rooted at `profile_dir`, loading any previously
    /// persisted identifier.
    pub fn open(profile_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(profile_dir)?;
        let record_path = profile_dir.join("session.json");

        let existing = if record_path.exists() {
            let raw = std::fs::read_to_string(&record_path)?;
            serde_json::from_str::<SessionRecord>(&raw)
                .ok()
                .map(|r| r.session_id)
        } else {
            None
        };

        if let Some(id) = &existing {
            tracing::debug!(session_id = %id, "session store loaded");
        }

        Ok(Self {
            record_path,
            current: RwLock::new(existing),
        })
    }

    /// Return the profile's session identifier, minting and persisting a
    /// new one on first call.  Infallible once the store is open.
    pub fn get_or_create(&self) -> String {
        // Fast path: already resolved.
        {
            let current = self.current.read();
            if let Some(id) = current.as_ref() {
                return id.clone();
            }
        }

        let mut current = self.current.write();
        // Re-check under the write lock.
        if let Some(id) = current.as_ref() {
            return id.clone();
        }

        let id = uuid::Uuid::new_v4().to_string();
        let record = SessionRecord {
            session_id: id.clone(),
            created_at: Utc::now(),
        };

        match serde_json::to_string_pretty(&record) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.record_path, json) {
                    tracing::warn!(
                        error = %e,
                        path = %self.record_path.display(),
                        "failed to persist session id, keeping it in memory"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize session record");
            }
        }

        TraceEvent::SessionResolved {
            session_id: id.clone(),
            is_new: true,
        }
        .emit();

        *current = Some(id.clone());
        id
    }
}
