// ── API-to-domain type conversions ──
//
// Bridges raw `freesleep_api` payloads into the canonical `PodSnapshot`,
// and domain values back into the wire shapes used by writes. The pod's
// state is spread over several endpoints; `PodReadings` collects one
// poll's worth of them before conversion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use freesleep_api::models::{
    self as wire, AlarmTapBehavior, DeviceStatus, Presence, Schedules, ServerStatus, Services,
    Settings, SleepRecord, TapConfig, TemperatureChange, VitalsSummary, WaterLevelReading,
};

use crate::error::CoreError;
use crate::model::{
    Alarm, DaySchedule, PodSnapshot, PodStatus, PrimeDaily, Sampled, SideSnapshot, TapAction,
    TapActions, ThermalMode, VibrationPattern, Vitals, WaterLevel, WeeklySchedule,
};

/// Snooze length written for the snooze tap action, in seconds.
const SNOOZE_SECS: u32 = 60;
/// What an alarm tap does when no alarm is ringing.
const INACTIVE_ALARM_BEHAVIOR: &str = "power";

/// Everything fetched during one poll.
#[derive(Debug, Clone)]
pub struct PodReadings {
    pub device: DeviceStatus,
    pub settings: Settings,
    pub presence: Presence,
    pub schedules: Schedules,
    pub services: Services,
    pub left_biometrics: BiometricReadings,
    pub right_biometrics: BiometricReadings,
    /// `None` when the server status endpoint failed or is missing.
    pub server_status: Option<ServerStatus>,
}

/// Optional per-side metrics. Either half may be missing on its own.
#[derive(Debug, Clone, Default)]
pub struct BiometricReadings {
    pub summary: Option<VitalsSummary>,
    pub sleep: Option<Vec<SleepRecord>>,
}

// ── Wire → domain ──────────────────────────────────────────────────

impl TryFrom<PodReadings> for PodSnapshot {
    type Error = CoreError;

    fn try_from(r: PodReadings) -> Result<Self, Self::Error> {
        let water_level = water_level(&r.device.water_level)?;

        let pod = PodStatus {
            water_level,
            wifi_strength: r.device.wifi_strength,
            cover_version: r.device.cover_version,
            hub_version: r.device.hub_version,
            server_version: r.device.free_sleep.version,
            server_branch: r.device.free_sleep.branch,
            is_priming: r.device.is_priming,
            led_brightness: r.device.settings.led_brightness,
            prime_daily: PrimeDaily {
                enabled: r.settings.prime_pod_daily.enabled,
                time: r.settings.prime_pod_daily.time,
            },
            biometrics_enabled: r.services.biometrics.enabled,
            reboot_daily: r.settings.reboot_daily,
            server_health: r.server_status.map(|status| {
                status
                    .0
                    .into_iter()
                    .filter_map(|(name, svc)| svc.status.map(|s| (name, s)))
                    .collect::<BTreeMap<_, _>>()
            }),
        };

        Ok(PodSnapshot {
            pod,
            left: side_snapshot(
                &r.device.left,
                r.settings.left,
                r.presence.left.present,
                &r.schedules.left,
                r.left_biometrics,
            ),
            right: side_snapshot(
                &r.device.right,
                r.settings.right,
                r.presence.right.present,
                &r.schedules.right,
                r.right_biometrics,
            ),
        })
    }
}

fn water_level(reading: &WaterLevelReading) -> Result<WaterLevel, CoreError> {
    match reading {
        WaterLevelReading::Flag(true) => Ok(WaterLevel::Ok),
        WaterLevelReading::Flag(false) => Ok(WaterLevel::Low),
        WaterLevelReading::Text(s) if s.eq_ignore_ascii_case("true") => Ok(WaterLevel::Ok),
        WaterLevelReading::Text(s) if s.eq_ignore_ascii_case("false") => Ok(WaterLevel::Low),
        WaterLevelReading::Text(other) => Err(CoreError::MalformedResponse {
            message: format!("unexpected waterLevel value {other:?}"),
        }),
    }
}

fn side_snapshot(
    status: &wire::SideStatus,
    settings: wire::SideSettings,
    present: bool,
    schedule: &wire::WeeklySchedule,
    biometrics: BiometricReadings,
) -> SideSnapshot {
    SideSnapshot {
        name: settings.name.filter(|n| !n.trim().is_empty()),
        is_on: status.is_on,
        target_temperature_f: status.target_temperature_f,
        current_temperature_f: status.current_temperature_f,
        mode: ThermalMode::from_temperatures(
            status.is_on,
            status.current_temperature_f,
            status.target_temperature_f,
        ),
        away_mode: settings.away_mode,
        present,
        alarm_vibrating: status.is_alarm_vibrating,
        alarm_disabled_tonight: settings
            .schedule_overrides
            .alarm
            .as_ref()
            .is_some_and(|o| o.disabled),
        temp_schedules_disabled_tonight: settings
            .schedule_overrides
            .temperature_schedules
            .as_ref()
            .is_some_and(|o| o.disabled),
        vitals: vitals(biometrics),
        schedule: weekly_schedule(schedule),
        taps: TapActions {
            double: settings.taps.double_tap.as_ref().map(tap_action),
            triple: settings.taps.triple_tap.as_ref().map(tap_action),
            quad: settings.taps.quad_tap.as_ref().map(tap_action),
        },
    }
}

fn weekly_schedule(s: &wire::WeeklySchedule) -> WeeklySchedule {
    let day = |d: &wire::DailySchedule| DaySchedule {
        alarm: Alarm::from(&d.alarm),
    };
    WeeklySchedule {
        monday: day(&s.monday),
        tuesday: day(&s.tuesday),
        wednesday: day(&s.wednesday),
        thursday: day(&s.thursday),
        friday: day(&s.friday),
        saturday: day(&s.saturday),
        sunday: day(&s.sunday),
    }
}

impl From<&wire::AlarmSettings> for Alarm {
    fn from(a: &wire::AlarmSettings) -> Self {
        Alarm {
            time: a.time.clone(),
            enabled: a.enabled,
            vibration_intensity: a.vibration_intensity,
            vibration_duration: a.duration,
            vibration_pattern: a.vibration_pattern.into(),
            alarm_temperature_f: a.alarm_temperature,
        }
    }
}

impl From<wire::VibrationPattern> for VibrationPattern {
    fn from(p: wire::VibrationPattern) -> Self {
        match p {
            wire::VibrationPattern::Double => Self::Double,
            wire::VibrationPattern::Rise => Self::Rise,
        }
    }
}

fn tap_action(cfg: &TapConfig) -> TapAction {
    match cfg {
        TapConfig::Temperature {
            change: TemperatureChange::Increment,
            ..
        } => TapAction::IncreaseTemperature,
        TapConfig::Temperature {
            change: TemperatureChange::Decrement,
            ..
        } => TapAction::DecreaseTemperature,
        TapConfig::Alarm {
            behavior: AlarmTapBehavior::Dismiss,
            ..
        } => TapAction::DismissAlarm,
        TapConfig::Alarm {
            behavior: AlarmTapBehavior::Snooze,
            ..
        } => TapAction::SnoozeAlarm,
    }
}

/// Stamp every vitals metric with the end of the latest sleep record.
fn vitals(readings: BiometricReadings) -> Vitals {
    let Some(latest) = readings
        .sleep
        .as_deref()
        .and_then(|records| records.iter().max_by_key(|r| r.entered_bed_at))
    else {
        return Vitals::default();
    };
    let sampled_at: DateTime<Utc> = latest.left_bed_at.unwrap_or(latest.entered_bed_at);
    let stamp = |v: Option<f64>| v.map(|value| Sampled { value, sampled_at });
    let summary = readings.summary.unwrap_or_default();

    Vitals {
        avg_heart_rate: stamp(summary.avg_heart_rate),
        min_heart_rate: stamp(summary.min_heart_rate),
        max_heart_rate: stamp(summary.max_heart_rate),
        avg_hrv: stamp(summary.avg_hrv),
        avg_breathing_rate: stamp(summary.avg_breathing_rate),
        last_sleep_duration_secs: latest
            .sleep_period_seconds
            .map(|value| Sampled { value, sampled_at }),
        times_exited_bed: latest
            .times_exited_bed
            .map(|value| Sampled { value, sampled_at }),
    }
}

// ── Domain → wire ──────────────────────────────────────────────────

impl From<&Alarm> for wire::AlarmSettings {
    fn from(a: &Alarm) -> Self {
        wire::AlarmSettings {
            time: a.time.clone(),
            enabled: a.enabled,
            vibration_intensity: a.vibration_intensity,
            vibration_pattern: a.vibration_pattern.into(),
            duration: a.vibration_duration,
            alarm_temperature: a.alarm_temperature_f,
        }
    }
}

impl From<VibrationPattern> for wire::VibrationPattern {
    fn from(p: VibrationPattern) -> Self {
        match p {
            VibrationPattern::Double => Self::Double,
            VibrationPattern::Rise => Self::Rise,
        }
    }
}

impl From<TapAction> for TapConfig {
    fn from(action: TapAction) -> Self {
        match action {
            TapAction::IncreaseTemperature => TapConfig::Temperature {
                change: TemperatureChange::Increment,
                amount: 1,
            },
            TapAction::DecreaseTemperature => TapConfig::Temperature {
                change: TemperatureChange::Decrement,
                amount: 1,
            },
            TapAction::DismissAlarm => TapConfig::Alarm {
                behavior: AlarmTapBehavior::Dismiss,
                snooze_duration: SNOOZE_SECS,
                inactive_alarm_behavior: INACTIVE_ALARM_BEHAVIOR.into(),
            },
            TapAction::SnoozeAlarm => TapConfig::Alarm {
                behavior: AlarmTapBehavior::Snooze,
                snooze_duration: SNOOZE_SECS,
                inactive_alarm_behavior: INACTIVE_ALARM_BEHAVIOR.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entered: &str, left: Option<&str>) -> SleepRecord {
        serde_json::from_value(json!({
            "side": "left",
            "entered_bed_at": entered,
            "left_bed_at": left,
            "sleep_period_seconds": 25200,
            "times_exited_bed": 1
        }))
        .expect("record")
    }

    #[test]
    fn vitals_are_stamped_with_latest_sleep_end() {
        let readings = BiometricReadings {
            summary: Some(VitalsSummary {
                avg_heart_rate: Some(61.0),
                ..VitalsSummary::default()
            }),
            sleep: Some(vec![
                record("2024-06-08T23:00:00Z", Some("2024-06-09T07:00:00Z")),
                record("2024-06-09T23:30:00Z", Some("2024-06-10T06:45:00Z")),
            ]),
        };
        let v = vitals(readings);
        let hr = v.avg_heart_rate.expect("heart rate");
        assert_eq!(hr.sampled_at.to_rfc3339(), "2024-06-10T06:45:00+00:00");
        assert_eq!(v.min_heart_rate, None);
        assert_eq!(v.times_exited_bed.map(|s| s.value), Some(1));
    }

    #[test]
    fn open_sleep_record_uses_entered_time() {
        let readings = BiometricReadings {
            summary: None,
            sleep: Some(vec![record("2024-06-09T23:30:00Z", None)]),
        };
        let v = vitals(readings);
        assert_eq!(
            v.latest_sample().map(|t| t.to_rfc3339()),
            Some("2024-06-09T23:30:00+00:00".into())
        );
    }

    #[test]
    fn no_sleep_record_means_no_vitals() {
        let readings = BiometricReadings {
            summary: Some(VitalsSummary {
                avg_heart_rate: Some(61.0),
                ..VitalsSummary::default()
            }),
            sleep: Some(Vec::new()),
        };
        assert!(vitals(readings).is_empty());
    }

    #[test]
    fn water_level_rejects_unknown_text() {
        assert_eq!(
            water_level(&WaterLevelReading::Text("true".into())).ok(),
            Some(WaterLevel::Ok)
        );
        assert!(matches!(
            water_level(&WaterLevelReading::Text("maybe".into())),
            Err(CoreError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn tap_actions_round_trip_through_wire_config() {
        for action in [
            TapAction::IncreaseTemperature,
            TapAction::DecreaseTemperature,
            TapAction::DismissAlarm,
            TapAction::SnoozeAlarm,
        ] {
            assert_eq!(tap_action(&TapConfig::from(action)), action);
        }
    }
}
