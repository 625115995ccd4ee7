//! In-memory pending-action registry for destructive operations.
//!
//! First request arms an entry; an identical second request executes; a
//! cancel or the TTL sweep discards. Entries never touch the database —
//! a process restart simply forgets unconfirmed requests.

use crate::types::AccountId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// What a pending entry is keyed by. Account deletion and global reset are
/// per-operator (a second operator asking does not confirm the first);
/// group deletion is per-tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingKey {
    AccountDeletion { operator: AccountId },
    GroupDeletion { tag: String },
    GlobalReset { operator: AccountId },
}

#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub operator: AccountId,
    /// Encodes the armed target; a repeat request must match it exactly.
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

pub struct PendingActions {
    entries: Mutex<HashMap<PendingKey, PendingEntry>>,
    ttl: Duration,
}

impl PendingActions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Drop entries older than the TTL. Called on every access.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        entries.retain(|_, entry| now - entry.created_at < ttl);
    }

    /// Arm (or re-arm, superseding any previous target) an entry.
    pub fn arm(&self, key: PendingKey, operator: AccountId, payload: String, now: DateTime<Utc>) {
        self.sweep(now);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            PendingEntry {
                operator,
                payload,
                created_at: now,
            },
        );
    }

    /// If an unexpired entry with the same payload exists, consume it and
    /// return true — the caller executes. Otherwise leave state untouched.
    pub fn confirm(&self, key: &PendingKey, payload: &str, now: DateTime<Utc>) -> bool {
        self.sweep(now);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.payload == payload => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Discard an armed entry. Returns whether anything was pending.
    pub fn cancel(&self, key: &PendingKey, now: DateTime<Utc>) -> bool {
        self.sweep(now);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }
}

/// Result of a request-to-confirm operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// First request: armed, awaiting the identical repeat.
    Armed { summary: String },
    /// Second request: the destructive action ran.
    Executed,
}
