// Wire models for the free-sleep REST API
//
// Field names follow the server's JSON (camelCase, except sleep records
// which are snake_case). Fields the server always sends are required so a
// schema drift surfaces as a deserialization error; everything else is
// optional or defaulted. Unknown fields are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Device status (`/api/deviceStatus`) ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub left: SideStatus,
    pub right: SideStatus,
    pub water_level: WaterLevelReading,
    pub is_priming: bool,
    pub settings: DeviceSettings,
    pub cover_version: String,
    pub hub_version: String,
    pub free_sleep: FreeSleepInfo,
    pub wifi_strength: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideStatus {
    pub current_temperature_f: f64,
    pub target_temperature_f: u16,
    pub is_on: bool,
    #[serde(default)]
    pub is_alarm_vibrating: bool,
}

/// Water level as reported by the server: older firmware sends the strings
/// `"true"`/`"false"`, newer builds send a JSON boolean. `true` means OK.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WaterLevelReading {
    Flag(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    pub led_brightness: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FreeSleepInfo {
    pub version: String,
    #[serde(default)]
    pub branch: Option<String>,
}

// ── Settings (`/api/settings`) ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub left: SideSettings,
    pub right: SideSettings,
    pub prime_pod_daily: PrimePodDaily,
    #[serde(default)]
    pub reboot_daily: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSettings {
    #[serde(default)]
    pub name: Option<String>,
    pub away_mode: bool,
    #[serde(default)]
    pub taps: TapSettings,
    #[serde(default)]
    pub schedule_overrides: ScheduleOverrides,
}

/// One-night exceptions to the weekly schedule. The server stops
/// honoring an override once `expiresAt` has passed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOverrides {
    #[serde(default)]
    pub alarm: Option<AlarmOverride>,
    #[serde(default)]
    pub temperature_schedules: Option<TemperatureSchedulesOverride>,
}

/// Skip (or move) the next alarm. Empty strings clear the fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmOverride {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub time_override: String,
    /// RFC 3339 timestamp, or empty when no override is active.
    #[serde(default)]
    pub expires_at: String,
}

/// Suspend the temperature schedule for one night.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureSchedulesOverride {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub expires_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapSettings {
    #[serde(default)]
    pub double_tap: Option<TapConfig>,
    #[serde(default)]
    pub triple_tap: Option<TapConfig>,
    #[serde(default)]
    pub quad_tap: Option<TapConfig>,
}

/// What a tap gesture does, as stored by the server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TapConfig {
    Temperature {
        change: TemperatureChange,
        amount: i32,
    },
    Alarm {
        behavior: AlarmTapBehavior,
        #[serde(rename = "snoozeDuration")]
        snooze_duration: u32,
        #[serde(rename = "inactiveAlarmBehavior")]
        inactive_alarm_behavior: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureChange {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmTapBehavior {
    Dismiss,
    Snooze,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PrimePodDaily {
    pub enabled: bool,
    pub time: String,
}

// ── Presence (`/api/metrics/presence`) ──────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Presence {
    pub left: SidePresence,
    pub right: SidePresence,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SidePresence {
    pub present: bool,
}

// ── Schedules (`/api/schedules`) ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Schedules {
    pub left: WeeklySchedule,
    pub right: WeeklySchedule,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeeklySchedule {
    pub monday: DailySchedule,
    pub tuesday: DailySchedule,
    pub wednesday: DailySchedule,
    pub thursday: DailySchedule,
    pub friday: DailySchedule,
    pub saturday: DailySchedule,
    pub sunday: DailySchedule,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailySchedule {
    pub alarm: AlarmSettings,
}

/// The alarm object for one day. The server replaces it wholesale on
/// POST, so writes must always carry every field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSettings {
    pub time: String,
    pub enabled: bool,
    pub vibration_intensity: u8,
    pub vibration_pattern: VibrationPattern,
    pub duration: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrationPattern {
    Double,
    Rise,
}

// ── Services (`/api/services`) ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Services {
    pub biometrics: BiometricsService,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BiometricsService {
    pub enabled: bool,
}

// ── Vitals & sleep (`/api/metrics/...`) ─────────────────────────────

/// Aggregated vitals over a query window. Every field is null when no
/// samples exist in the window.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSummary {
    #[serde(default)]
    pub avg_heart_rate: Option<f64>,
    #[serde(default)]
    pub min_heart_rate: Option<f64>,
    #[serde(default)]
    pub max_heart_rate: Option<f64>,
    #[serde(default, rename = "avgHRV")]
    pub avg_hrv: Option<f64>,
    #[serde(default)]
    pub avg_breathing_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SleepRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub side: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub entered_bed_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "flexible_timestamp_opt")]
    pub left_bed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sleep_period_seconds: Option<u64>,
    #[serde(default)]
    pub times_exited_bed: Option<u32>,
}

// ── Server status (`/api/serverStatus`) ─────────────────────────────

/// Health of the server's internal services, keyed by service name
/// (`franken`, `database`, `biometricsStream`, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ServerStatus(pub BTreeMap<String, ServiceStatus>);

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Write-side payloads ─────────────────────────────────────────────

/// Resource a partial-merge write is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    DeviceStatus,
    Settings,
    Schedules,
    Services,
}

impl PatchTarget {
    /// Path below `/api/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::DeviceStatus => "deviceStatus",
            Self::Settings => "settings",
            Self::Schedules => "schedules",
            Self::Services => "services",
        }
    }
}

/// Background jobs accepted by `POST /api/jobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Job {
    Reboot,
    Update,
}

/// Body of `POST /api/alarm` (vibrate now).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTrigger {
    pub side: String,
    pub vibration_intensity: u8,
    pub vibration_pattern: VibrationPattern,
    pub duration: u16,
    /// Vibrate even when the side is off.
    pub force: bool,
}

// ── Timestamp helpers ───────────────────────────────────────────────

/// Sleep timestamps arrive either as RFC 3339 strings or as Unix seconds
/// depending on server version.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Seconds(i64),
}

impl RawTimestamp {
    fn into_datetime<E: serde::de::Error>(self) -> Result<DateTime<Utc>, E> {
        match self {
            Self::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| E::custom(format!("invalid timestamp {s:?}: {e}"))),
            Self::Seconds(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| E::custom(format!("timestamp out of range: {secs}"))),
        }
    }
}

fn flexible_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    RawTimestamp::deserialize(d)?.into_datetime()
}

fn flexible_timestamp_opt<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<RawTimestamp>::deserialize(d)?
        .map(RawTimestamp::into_datetime)
        .transpose()
}
