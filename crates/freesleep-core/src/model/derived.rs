// ── Derived state ──
//
// Fields computed from a snapshot and the current time. Never stored on
// their own: the cache recomputes them on every publish.

use serde::{Deserialize, Serialize};

use super::schedule::Alarm;
use super::side::{Side, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningStatus {
    Running,
    Idle,
}

/// Running status refined by away mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideActivity {
    Running,
    Idle,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideDerived {
    pub vitals_available: bool,
    /// Schedule entry for the current local weekday.
    pub today_alarm: Alarm,
    pub running: RunningStatus,
    pub activity: SideActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedState {
    /// Local weekday the derived fields were evaluated for.
    pub today: Weekday,
    pub left: SideDerived,
    pub right: SideDerived,
    /// `None` when the server does not report service health.
    pub server_healthy: Option<bool>,
}

impl DerivedState {
    pub fn side(&self, side: Side) -> &SideDerived {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}
