// ── Change sets ──

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::cache::MergedState;
use super::path::FieldPath;

/// One field whose value differs between two published states. `None`
/// means the path did not exist on that side (e.g. before the first
/// successful poll).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub path: FieldPath,
    pub previous: Option<Value>,
    pub current: Option<Value>,
}

/// Field-level differences, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Compare two flattened views.
    pub fn diff(before: &BTreeMap<FieldPath, Value>, after: &BTreeMap<FieldPath, Value>) -> Self {
        let mut changes = Vec::new();
        for (path, new) in after {
            match before.get(path) {
                Some(old) if old == new => {}
                old => changes.push(FieldChange {
                    path: path.clone(),
                    previous: old.cloned(),
                    current: Some(new.clone()),
                }),
            }
        }
        for (path, old) in before {
            if !after.contains_key(path) {
                changes.push(FieldChange {
                    path: path.clone(),
                    previous: Some(old.clone()),
                    current: None,
                });
            }
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Self { changes }
    }

    /// Fold a later change set into this one. A path keeps its earliest
    /// `previous` and latest `current`; paths that end where they started
    /// are dropped.
    pub fn merge(&mut self, later: ChangeSet) {
        if later.is_empty() {
            return;
        }
        let mut by_path: BTreeMap<FieldPath, (Option<Value>, Option<Value>)> = self
            .changes
            .drain(..)
            .map(|c| (c.path, (c.previous, c.current)))
            .collect();
        for c in later.changes {
            by_path
                .entry(c.path)
                .and_modify(|(_, current)| current.clone_from(&c.current))
                .or_insert((c.previous, c.current));
        }
        self.changes = by_path
            .into_iter()
            .filter(|(_, (previous, current))| previous != current)
            .map(|(path, (previous, current))| FieldChange {
                path,
                previous,
                current,
            })
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.changes.iter()
    }

    pub fn get(&self, path: &str) -> Option<&FieldChange> {
        self.changes
            .binary_search_by(|c| c.path.as_str().cmp(path))
            .ok()
            .and_then(|i| self.changes.get(i))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Changes at or below `prefix`.
    pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a FieldChange> + 'a {
        self.changes.iter().filter(move |c| c.path.is_under(prefix))
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Why a state was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCause {
    /// A successful poll (including confirmations it triggered).
    Poll,
    /// A failed poll: availability and time-derived fields only.
    PollFailed,
    /// A command was applied locally ahead of the pod.
    Optimistic,
    /// A command failed and its local change was undone.
    Rollback,
}

/// One notification delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct StateUpdate {
    pub cause: UpdateCause,
    pub changes: ChangeSet,
    pub state: Arc<MergedState>,
}
