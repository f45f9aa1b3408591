// ── Derived state resolver ──
//
// Pure functions of (snapshot, now). No I/O, no stored state: the cache
// calls `resolve` on every publish so time-dependent fields (today's
// alarm, vitals freshness) advance even when the pod reports nothing new.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Utc};

use crate::model::{
    Alarm, DerivedState, PodSnapshot, RunningStatus, SideActivity, SideDerived, SideSnapshot,
    ThermalMode, Weekday, WeeklySchedule,
};

/// Server services whose failure makes the pod unhealthy.
pub const CRITICAL_SERVICES: [&str; 3] = ["franken", "database", "biometricsStream"];

/// Default age limit for the newest vitals sample.
pub const DEFAULT_VITALS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Computes [`DerivedState`] from a snapshot and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedStateResolver {
    vitals_max_age: TimeDelta,
}

impl Default for DerivedStateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_VITALS_MAX_AGE)
    }
}

impl DerivedStateResolver {
    pub fn new(vitals_max_age: Duration) -> Self {
        Self {
            vitals_max_age: TimeDelta::from_std(vitals_max_age).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn resolve(&self, snapshot: &PodSnapshot, now: DateTime<FixedOffset>) -> DerivedState {
        let today = Weekday::from(now.weekday());
        let side = |s: &SideSnapshot| SideDerived {
            vitals_available: vitals_available(
                snapshot.pod.biometrics_enabled,
                s.vitals.latest_sample(),
                now,
                self.vitals_max_age,
            ),
            today_alarm: today_alarm(&s.schedule, now).clone(),
            running: running_status(s.mode),
            activity: side_activity(s.mode, s.away_mode),
        };

        DerivedState {
            today,
            left: side(&snapshot.left),
            right: side(&snapshot.right),
            server_healthy: snapshot.pod.server_health.as_ref().map(server_healthy),
        }
    }
}

/// Vitals are available when biometrics are enabled and the newest sample
/// is no older than `max_age`. Samples dated in the future count as fresh.
pub fn vitals_available(
    biometrics_enabled: bool,
    latest_sample: Option<DateTime<Utc>>,
    now: DateTime<FixedOffset>,
    max_age: TimeDelta,
) -> bool {
    let Some(sample) = latest_sample else {
        return false;
    };
    biometrics_enabled && now.with_timezone(&Utc) - sample <= max_age
}

/// The schedule entry for `now`'s weekday, in `now`'s own offset.
pub fn today_alarm(schedule: &WeeklySchedule, now: DateTime<FixedOffset>) -> &Alarm {
    &schedule.day(Weekday::from(now.weekday())).alarm
}

pub fn running_status(mode: ThermalMode) -> RunningStatus {
    match mode {
        ThermalMode::Heating | ThermalMode::Cooling => RunningStatus::Running,
        ThermalMode::Idle => RunningStatus::Idle,
    }
}

/// Away mode wins over whatever the thermal unit is doing.
pub fn side_activity(mode: ThermalMode, away_mode: bool) -> SideActivity {
    if away_mode {
        return SideActivity::Away;
    }
    match running_status(mode) {
        RunningStatus::Running => SideActivity::Running,
        RunningStatus::Idle => SideActivity::Idle,
    }
}

/// Healthy when every critical service that is reported is `healthy` or
/// `started`. Services the server does not list are ignored.
pub fn server_healthy(services: &BTreeMap<String, String>) -> bool {
    CRITICAL_SERVICES
        .iter()
        .filter_map(|name| services.get(*name))
        .all(|status| matches!(status.as_str(), "healthy" | "started"))
}
