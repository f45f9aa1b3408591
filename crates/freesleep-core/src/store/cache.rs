// ── Snapshot cache ──
//
// Holds the last authoritative snapshot, the optimistic overlays written
// on top of it, availability bookkeeping and the last published view.
// Every mutation rebuilds the merged view (overlays applied, derived
// fields recomputed for `now`) and returns what changed.
//
// The cache is owned by the coordinator and mutated only under its lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::derive::DerivedStateResolver;
use crate::error::CoreError;
use crate::model::{DerivedState, PodSnapshot};

use super::changes::ChangeSet;
use super::path::{FieldPath, flatten};

/// The state an adapter reads: availability, the snapshot with optimistic
/// overlays applied, derived fields and bookkeeping.
///
/// Only `available`, `snapshot` and `derived` take part in diffing; the
/// counters and timestamps are bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedState {
    pub available: bool,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<FixedOffset>>,
    pub last_attempt: Option<DateTime<FixedOffset>>,
    pub snapshot: Option<PodSnapshot>,
    pub derived: Option<DerivedState>,
    /// When each field path last changed value.
    pub field_updated_at: BTreeMap<FieldPath, DateTime<FixedOffset>>,
}

impl MergedState {
    /// The diffable view: `available`, the snapshot's `pod`/`left`/`right`
    /// at the root, and `derived`.
    pub fn view(&self) -> Result<Value, CoreError> {
        let mut root = serde_json::Map::new();
        root.insert("available".into(), Value::Bool(self.available));
        if let Some(snapshot) = &self.snapshot {
            if let Value::Object(fields) = serde_json::to_value(snapshot)? {
                root.extend(fields);
            }
        }
        if let Some(derived) = &self.derived {
            root.insert("derived".into(), serde_json::to_value(derived)?);
        }
        Ok(Value::Object(root))
    }

    /// Current value at a field path, if the path exists.
    pub fn value_at(&self, path: &str) -> Option<Value> {
        self.view()
            .ok()?
            .pointer(&FieldPath::from(path).to_pointer())
            .cloned()
    }

    pub fn updated_at(&self, path: &str) -> Option<DateTime<FixedOffset>> {
        self.field_updated_at.get(path).copied()
    }
}

/// Owned cache of pod state.
#[derive(Debug)]
pub struct SnapshotCache {
    resolver: DerivedStateResolver,
    raw: Option<PodSnapshot>,
    overlays: BTreeMap<FieldPath, Value>,
    available: bool,
    consecutive_failures: u32,
    last_success: Option<DateTime<FixedOffset>>,
    last_attempt: Option<DateTime<FixedOffset>>,
    field_updated_at: BTreeMap<FieldPath, DateTime<FixedOffset>>,
    flat: BTreeMap<FieldPath, Value>,
    current: Arc<MergedState>,
}

impl SnapshotCache {
    /// An empty, unavailable cache.
    pub fn new(resolver: DerivedStateResolver) -> Self {
        let current = MergedState::default();
        let flat = current.view().map(|v| flatten(&v)).unwrap_or_default();
        Self {
            resolver,
            raw: None,
            overlays: BTreeMap::new(),
            available: false,
            consecutive_failures: 0,
            last_success: None,
            last_attempt: None,
            field_updated_at: BTreeMap::new(),
            flat,
            current: Arc::new(current),
        }
    }

    /// The last published merged view.
    pub fn get(&self) -> Arc<MergedState> {
        Arc::clone(&self.current)
    }

    /// Snapshot with overlays applied, if any poll has succeeded.
    pub fn merged_snapshot(&self) -> Option<&PodSnapshot> {
        self.current.snapshot.as_ref()
    }

    /// Value at `path` in the last authoritative snapshot (no overlays).
    pub fn authoritative_value(&self, path: &FieldPath) -> Option<Value> {
        let raw = serde_json::to_value(self.raw.as_ref()?).ok()?;
        raw.pointer(&path.to_pointer()).cloned()
    }

    pub fn overlay(&self, path: &FieldPath) -> Option<&Value> {
        self.overlays.get(path)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Install a freshly polled snapshot. Overlays stay in place until
    /// their commands are confirmed, forced or reverted.
    pub fn replace(
        &mut self,
        snapshot: PodSnapshot,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        self.raw = Some(snapshot);
        self.last_success = Some(now);
        self.rebuild(now)
    }

    /// Show `value` at `path` ahead of the pod confirming it.
    pub fn apply_optimistic(
        &mut self,
        path: FieldPath,
        value: Value,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        let Some(raw) = &self.raw else {
            return Err(CoreError::NotReady);
        };
        let raw = serde_json::to_value(raw)?;
        if raw.pointer(&path.to_pointer()).is_none() {
            return Err(CoreError::Internal(format!("unknown field path {path}")));
        }

        let replaced = self.overlays.insert(path.clone(), value);
        match self.rebuild(now) {
            Ok(changes) => Ok(changes),
            Err(e) => {
                // Value did not fit the field's type: restore the old overlay.
                match replaced {
                    Some(old) => self.overlays.insert(path, old),
                    None => self.overlays.remove(&path),
                };
                Err(e)
            }
        }
    }

    /// Drop the overlay at `path`, falling back to the authoritative value.
    pub fn revert(
        &mut self,
        path: &FieldPath,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        if self.overlays.remove(path).is_none() {
            return Ok(ChangeSet::default());
        }
        self.rebuild(now)
    }

    /// The pod now reports the intended value: the overlay is redundant.
    pub fn confirm(
        &mut self,
        path: &FieldPath,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        trace!(%path, "overlay confirmed");
        self.revert(path, now)
    }

    /// Force-confirm: fold the overlay into the authoritative snapshot so
    /// it survives until the next poll overwrites it.
    pub fn commit(
        &mut self,
        path: &FieldPath,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        let (Some(raw), Some(value)) = (&self.raw, self.overlays.get(path)) else {
            return Ok(ChangeSet::default());
        };
        let mut raw = serde_json::to_value(raw)?;
        if let Some(slot) = raw.pointer_mut(&path.to_pointer()) {
            *slot = value.clone();
        }
        let mut committed: PodSnapshot = serde_json::from_value(raw)?;
        committed.settle_modes();
        self.raw = Some(committed);
        self.overlays.remove(path);
        self.rebuild(now)
    }

    /// Recompute derived fields for `now` without new pod data.
    pub fn refresh_derived(&mut self, now: DateTime<FixedOffset>) -> Result<ChangeSet, CoreError> {
        self.rebuild(now)
    }

    pub fn set_availability(
        &mut self,
        available: bool,
        now: DateTime<FixedOffset>,
    ) -> Result<ChangeSet, CoreError> {
        if self.available == available {
            return Ok(ChangeSet::default());
        }
        self.available = available;
        self.rebuild(now)
    }

    pub fn record_attempt(&mut self, now: DateTime<FixedOffset>) {
        self.last_attempt = Some(now);
    }

    /// Count a failed poll; returns the new consecutive failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    pub fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
    }

    // ── Internals ────────────────────────────────────────────────────

    fn effective_snapshot(&self) -> Result<Option<PodSnapshot>, CoreError> {
        let Some(raw) = &self.raw else {
            return Ok(None);
        };
        if self.overlays.is_empty() {
            return Ok(Some(raw.clone()));
        }
        let mut value = serde_json::to_value(raw)?;
        for (path, overlay) in &self.overlays {
            if let Some(slot) = value.pointer_mut(&path.to_pointer()) {
                *slot = overlay.clone();
            }
        }
        let mut merged: PodSnapshot = serde_json::from_value(value)?;
        merged.settle_modes();
        Ok(Some(merged))
    }

    fn rebuild(&mut self, now: DateTime<FixedOffset>) -> Result<ChangeSet, CoreError> {
        let snapshot = self.effective_snapshot()?;
        let derived = snapshot.as_ref().map(|s| self.resolver.resolve(s, now));

        let mut merged = MergedState {
            available: self.available,
            consecutive_failures: self.consecutive_failures,
            last_success: self.last_success,
            last_attempt: self.last_attempt,
            snapshot,
            derived,
            field_updated_at: BTreeMap::new(),
        };
        let flat = flatten(&merged.view()?);
        let changes = ChangeSet::diff(&self.flat, &flat);

        for change in &changes {
            self.field_updated_at.insert(change.path.clone(), now);
        }
        merged.field_updated_at.clone_from(&self.field_updated_at);

        self.flat = flat;
        self.current = Arc::new(merged);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunningStatus, SideActivity, ThermalMode};
    use crate::test_support::snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).expect("timestamp")
    }

    #[test]
    fn replace_with_identical_snapshot_is_empty() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");

        let first = cache.replace(snapshot(), now).expect("replace");
        assert!(first.contains("left.target_temperature_f"));
        assert!(first.contains("derived.left.today_alarm.time"));

        let second = cache.replace(snapshot(), now).expect("replace");
        assert!(second.is_empty(), "unexpected changes: {second:?}");
    }

    #[test]
    fn day_rollover_changes_today_alarm_without_schedule_change() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        cache
            .replace(snapshot(), at("2024-06-10T23:59:00+00:00"))
            .expect("replace");

        let changes = cache
            .replace(snapshot(), at("2024-06-11T00:01:00+00:00"))
            .expect("replace");

        let time = changes
            .get("derived.left.today_alarm.time")
            .expect("today alarm changed");
        assert_eq!(time.previous, Some(json!("07:00")));
        assert_eq!(time.current, Some(json!("07:30")));
        assert!(changes.contains("derived.today"));
        assert_eq!(changes.under("left.schedule").count(), 0);
    }

    #[test]
    fn overlay_commit_and_revert() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");
        cache.replace(snapshot(), now).expect("replace");

        let path = FieldPath::from("left.away_mode");
        let changes = cache
            .apply_optimistic(path.clone(), json!(true), now)
            .expect("overlay");
        assert!(changes.contains("left.away_mode"));
        assert!(changes.contains("derived.left.activity"));
        assert_eq!(cache.authoritative_value(&path), Some(json!(false)));

        let reverted = cache.revert(&path, now).expect("revert");
        assert_eq!(
            reverted.get("left.away_mode").and_then(|c| c.current.clone()),
            Some(json!(false))
        );

        cache
            .apply_optimistic(path.clone(), json!(true), now)
            .expect("overlay");
        let committed = cache.commit(&path, now).expect("commit");
        assert!(committed.is_empty());
        assert_eq!(cache.overlay_count(), 0);
        assert_eq!(cache.authoritative_value(&path), Some(json!(true)));
    }

    #[test]
    fn power_off_overlay_settles_mode_and_running() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");
        cache.replace(snapshot(), now).expect("replace");

        let changes = cache
            .apply_optimistic("left.is_on".into(), json!(false), now)
            .expect("overlay");
        assert_eq!(
            changes.get("left.mode").and_then(|c| c.current.clone()),
            Some(json!("idle"))
        );
        assert_eq!(
            changes
                .get("derived.left.running")
                .and_then(|c| c.current.clone()),
            Some(json!("idle"))
        );
        let state = cache.get();
        let derived = state.derived.as_ref().expect("derived");
        assert_eq!(derived.left.running, RunningStatus::Idle);
        assert_eq!(derived.left.activity, SideActivity::Idle);

        // Committing keeps the settled mode in the authoritative copy.
        cache.commit(&"left.is_on".into(), now).expect("commit");
        assert_eq!(
            cache.authoritative_value(&"left.mode".into()),
            Some(json!("idle"))
        );
    }

    #[test]
    fn target_overlay_flips_heating_to_cooling() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");
        cache.replace(snapshot(), now).expect("replace");

        cache
            .apply_optimistic("right.target_temperature_f".into(), json!(70), now)
            .expect("overlay");
        let state = cache.get();
        assert_eq!(
            state.snapshot.as_ref().map(|s| s.right.mode),
            Some(ThermalMode::Cooling)
        );
    }

    #[test]
    fn overlay_with_wrong_type_is_rejected() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");
        cache.replace(snapshot(), now).expect("replace");

        let result = cache.apply_optimistic("pod.led_brightness".into(), json!("bright"), now);
        assert!(matches!(result, Err(CoreError::Internal(_))));
        assert_eq!(cache.overlay_count(), 0);

        let unknown = cache.apply_optimistic("pod.nope".into(), json!(1), now);
        assert!(matches!(unknown, Err(CoreError::Internal(_))));
    }

    #[test]
    fn optimistic_write_needs_a_snapshot() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let result = cache.apply_optimistic(
            "left.away_mode".into(),
            json!(true),
            at("2024-06-10T12:00:00+00:00"),
        );
        assert_eq!(result, Err(CoreError::NotReady));
    }

    #[test]
    fn availability_is_diffed_but_counters_are_not() {
        let mut cache = SnapshotCache::new(DerivedStateResolver::default());
        let now = at("2024-06-10T12:00:00+00:00");
        cache.replace(snapshot(), now).expect("replace");

        let up = cache.set_availability(true, now).expect("available");
        assert_eq!(up.len(), 1);
        assert!(up.contains("available"));
        assert_eq!(cache.get().updated_at("available"), Some(now));

        cache.record_failure();
        cache.record_attempt(now);
        assert!(cache.refresh_derived(now).expect("refresh").is_empty());
        assert_eq!(cache.get().consecutive_failures, 1);
    }
}
