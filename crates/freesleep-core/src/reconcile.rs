// ── Pending command table ──
//
// Tracks writes that were applied optimistically and are waiting for a
// poll to show the pod agrees. At most one entry per field path; a newer
// command for the same path supersedes the older one, whose completion
// (success or failure) then no longer touches the cache.
//
// Entries age only once their write has been acknowledged: a write still
// in flight cannot have reached the pod yet.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;
use serde_json::Value;

use crate::store::{FieldPath, SnapshotCache};

/// A write waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCommand {
    pub id: u64,
    pub path: FieldPath,
    /// Merged value before the command was applied.
    pub previous: Option<Value>,
    pub value: Value,
    pub issued_at: DateTime<FixedOffset>,
    pub deadline: DateTime<FixedOffset>,
    pub acked: bool,
    /// Successful polls seen since the write was acknowledged.
    pub polls_seen: u32,
}

/// Outcome of checking pending commands against a fresh snapshot.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// The pod reports the intended value.
    pub confirmed: Vec<PendingCommand>,
    /// Gave up waiting; the intended value is assumed applied.
    pub forced: Vec<PendingCommand>,
}

/// Pending commands keyed by field path.
#[derive(Debug)]
pub struct PendingTable {
    entries: BTreeMap<FieldPath, PendingCommand>,
    next_id: u64,
    max_polls: u32,
    window: TimeDelta,
}

impl PendingTable {
    /// `max_polls` acknowledged polls, or `window` after issue, whichever
    /// comes first, before a write is force-confirmed.
    pub fn new(max_polls: u32, window: std::time::Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
            max_polls,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Register a command, superseding any entry for the same path.
    /// Returns the new command's id.
    pub fn insert(
        &mut self,
        path: FieldPath,
        previous: Option<Value>,
        value: Value,
        now: DateTime<FixedOffset>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let entry = PendingCommand {
            id,
            path: path.clone(),
            previous,
            value,
            issued_at: now,
            deadline: now + self.window,
            acked: false,
            polls_seen: 0,
        };
        if let Some(old) = self.entries.insert(path, entry) {
            tracing::debug!(path = %old.path, superseded = old.id, by = id, "pending command superseded");
        }
        id
    }

    /// Whether `id` is still the live command for `path`.
    pub fn is_current(&self, path: &FieldPath, id: u64) -> bool {
        self.entries.get(path).is_some_and(|e| e.id == id)
    }

    /// Mark the write acknowledged. Returns `false` if the command was
    /// already confirmed or superseded.
    pub fn mark_acked(&mut self, path: &FieldPath, id: u64) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) if entry.id == id => {
                entry.acked = true;
                true
            }
            _ => false,
        }
    }

    /// Remove the entry only if `id` is still current.
    pub fn remove_if_current(&mut self, path: &FieldPath, id: u64) -> Option<PendingCommand> {
        if self.is_current(path, id) {
            self.entries.remove(path)
        } else {
            None
        }
    }

    /// Check every entry against the cache's authoritative snapshot after
    /// a successful poll. Confirmed and forced entries are removed.
    pub fn reconcile(&mut self, cache: &SnapshotCache, now: DateTime<FixedOffset>) -> Reconciliation {
        let mut out = Reconciliation::default();
        let paths: Vec<FieldPath> = self.entries.keys().cloned().collect();

        for path in paths {
            let Some(entry) = self.entries.get_mut(&path) else {
                continue;
            };
            if cache.authoritative_value(&path).as_ref() == Some(&entry.value) {
                if let Some(done) = self.entries.remove(&path) {
                    out.confirmed.push(done);
                }
                continue;
            }
            if !entry.acked {
                continue;
            }
            entry.polls_seen += 1;
            if entry.polls_seen >= self.max_polls || now >= entry.deadline {
                if let Some(done) = self.entries.remove(&path) {
                    out.forced.push(done);
                }
            }
        }
        out
    }

    pub fn get(&self, path: &FieldPath) -> Option<&PendingCommand> {
        self.entries.get(path)
    }

    pub fn snapshot(&self) -> Vec<PendingCommand> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
