// ── Pod snapshot ──
//
// One successful read of the pod, immutable once built. Serializes to the
// nested view that field paths are taken from (`pod.led_brightness`,
// `left.schedule.monday.alarm.time`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schedule::{TapActions, WeeklySchedule};
use super::side::Side;
use super::vitals::Vitals;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub pod: PodStatus,
    pub left: SideSnapshot,
    pub right: SideSnapshot,
}

impl PodSnapshot {
    pub fn side(&self, side: Side) -> &SideSnapshot {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Recompute each side's `mode` after power or target were edited in
    /// place.
    pub fn settle_modes(&mut self) {
        self.left.settle_mode();
        self.right.settle_mode();
    }
}

/// Pod-wide status and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodStatus {
    pub water_level: WaterLevel,
    /// Percent.
    pub wifi_strength: u8,
    pub cover_version: String,
    pub hub_version: String,
    pub server_version: String,
    pub server_branch: Option<String>,
    pub is_priming: bool,
    /// 0–100.
    pub led_brightness: u8,
    pub prime_daily: PrimeDaily,
    pub biometrics_enabled: bool,
    pub reboot_daily: bool,
    /// Status string per internal server service; `None` when the server
    /// does not expose health information.
    pub server_health: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterLevel {
    Ok,
    Low,
}

/// Daily automatic priming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeDaily {
    pub enabled: bool,
    /// Local time, `HH:MM`.
    pub time: String,
}

/// State of one side of the bed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSnapshot {
    /// User-assigned label, if any.
    pub name: Option<String>,
    pub is_on: bool,
    pub target_temperature_f: u16,
    pub current_temperature_f: f64,
    pub mode: ThermalMode,
    pub away_mode: bool,
    pub present: bool,
    pub alarm_vibrating: bool,
    /// Next alarm is skipped by a one-night override.
    pub alarm_disabled_tonight: bool,
    /// Temperature schedule is suspended until noon.
    pub temp_schedules_disabled_tonight: bool,
    pub vitals: Vitals,
    pub schedule: WeeklySchedule,
    pub taps: TapActions,
}

impl SideSnapshot {
    pub fn settle_mode(&mut self) {
        self.mode = ThermalMode::from_temperatures(
            self.is_on,
            self.current_temperature_f,
            self.target_temperature_f,
        );
    }
}

/// What the side's thermal unit is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalMode {
    Heating,
    Cooling,
    Idle,
}

impl ThermalMode {
    /// Off, or already at target, is idle; otherwise the side is moving
    /// toward the target.
    pub fn from_temperatures(is_on: bool, current_f: f64, target_f: u16) -> Self {
        let target = f64::from(target_f);
        if !is_on || (current_f - target).abs() < f64::EPSILON {
            Self::Idle
        } else if current_f < target {
            Self::Heating
        } else {
            Self::Cooling
        }
    }
}
