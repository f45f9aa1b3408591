// ── Alarm schedule and tap gestures ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::side::Weekday;

/// Vibration pattern of the wake-up alarm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VibrationPattern {
    Double,
    Rise,
}

/// The alarm configured for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Local wake time, `HH:MM`.
    pub time: String,
    pub enabled: bool,
    /// 1–100.
    pub vibration_intensity: u8,
    /// Seconds, 0–180.
    pub vibration_duration: u16,
    pub vibration_pattern: VibrationPattern,
    /// Temperature the side moves to at alarm time, if set.
    pub alarm_temperature_f: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub alarm: Alarm,
}

/// One side's schedule, keyed by weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeeklySchedule {
    pub fn day(&self, day: Weekday) -> &DaySchedule {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }
}

/// Bed tap gestures the pod recognizes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TapGesture {
    Double,
    Triple,
    Quad,
}

impl TapGesture {
    /// Field name under a side's `taps` object.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Triple => "triple",
            Self::Quad => "quad",
        }
    }
}

/// What a tap gesture does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TapAction {
    /// Raise the target temperature by one degree.
    IncreaseTemperature,
    /// Lower the target temperature by one degree.
    DecreaseTemperature,
    DismissAlarm,
    SnoozeAlarm,
}

/// Tap action mapping for one side. `None` means the gesture is unassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapActions {
    pub double: Option<TapAction>,
    pub triple: Option<TapAction>,
    pub quad: Option<TapAction>,
}

impl TapActions {
    pub fn get(&self, gesture: TapGesture) -> Option<TapAction> {
        match gesture {
            TapGesture::Double => self.double,
            TapGesture::Triple => self.triple,
            TapGesture::Quad => self.quad,
        }
    }
}
