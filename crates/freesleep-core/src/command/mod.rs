// ── Command API ──
//
// All writes flow through the `Command` enum. A command is validated,
// then planned against the current merged snapshot into the field it
// changes (for the optimistic overlay) and the partial-merge body that
// is posted to the pod. Fire-and-forget operations with no observable
// field are `PodAction`s.

pub mod validate;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Timelike};
use serde_json::{Value, json};

use freesleep_api::PatchTarget;
use freesleep_api::models::{AlarmOverride, AlarmSettings, TapConfig, TemperatureSchedulesOverride};

use crate::error::CoreError;
use crate::model::{
    Alarm, PodSnapshot, Side, TapAction, TapGesture, VibrationPattern, Weekday,
};
use crate::store::FieldPath;

use self::validate::{
    LED_BRIGHTNESS, TEMPERATURE_F, VIBRATION_DURATION_SECS, VIBRATION_INTENSITY, clock_time,
    in_range,
};

/// An alarm override stays active this many minutes past the alarm it
/// skips.
const ALARM_OVERRIDE_GRACE_MINS: i64 = 2;
/// Local hour at which "tonight" moves to the next night. Temperature
/// schedule overrides also expire then.
const NOON: u32 = 12;

/// State-changing writes. Alarm commands always target the current local
/// weekday.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Side controls ────────────────────────────────────────────────
    SetPower {
        side: Side,
        on: bool,
    },
    SetTargetTemperature {
        side: Side,
        temperature_f: u16,
    },
    SetAwayMode {
        side: Side,
        away: bool,
    },
    SetTapAction {
        side: Side,
        gesture: TapGesture,
        action: TapAction,
    },

    // ── Pod settings ─────────────────────────────────────────────────
    SetLedBrightness {
        brightness: u8,
    },
    StartPriming,
    SetPrimeDaily {
        enabled: bool,
    },
    SetPrimeDailyTime {
        time: String,
    },
    SetBiometrics {
        enabled: bool,
    },
    SetRebootDaily {
        enabled: bool,
    },

    // ── Today's alarm ────────────────────────────────────────────────
    SetAlarmEnabled {
        side: Side,
        enabled: bool,
    },
    SetAlarmTime {
        side: Side,
        time: String,
    },
    SetAlarmVibrationIntensity {
        side: Side,
        intensity: u8,
    },
    SetAlarmVibrationDuration {
        side: Side,
        seconds: u16,
    },
    SetAlarmVibrationPattern {
        side: Side,
        pattern: VibrationPattern,
    },

    // ── Tonight's overrides ──────────────────────────────────────────
    /// Skip the next alarm. Expires two minutes after it would have rung.
    SetAlarmDisabledTonight {
        side: Side,
        disabled: bool,
    },
    /// Suspend the temperature schedule until noon.
    SetTempScheduleDisabledTonight {
        side: Side,
        disabled: bool,
    },
}

/// Operations with no optimistic state. The coordinator refreshes after
/// each one.
#[derive(Debug, Clone, PartialEq)]
pub enum PodAction {
    Reboot,
    /// Install the latest free-sleep server build.
    Update,
    /// Vibrate the alarm on one side immediately.
    TriggerAlarm {
        side: Side,
        vibration_intensity: u8,
        vibration_pattern: VibrationPattern,
        duration_secs: u16,
    },
}

/// A partial-merge body for one writable resource.
#[derive(Debug, Clone, PartialEq)]
pub struct PodWrite {
    pub target: PatchTarget,
    pub body: Value,
}

/// What a command changes locally and what it sends.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandPlan {
    pub path: FieldPath,
    pub value: Value,
    pub write: PodWrite,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPower { .. } => "set_power",
            Self::SetTargetTemperature { .. } => "set_target_temperature",
            Self::SetAwayMode { .. } => "set_away_mode",
            Self::SetTapAction { .. } => "set_tap_action",
            Self::SetLedBrightness { .. } => "set_led_brightness",
            Self::StartPriming => "start_priming",
            Self::SetPrimeDaily { .. } => "set_prime_daily",
            Self::SetPrimeDailyTime { .. } => "set_prime_daily_time",
            Self::SetBiometrics { .. } => "set_biometrics",
            Self::SetRebootDaily { .. } => "set_reboot_daily",
            Self::SetAlarmEnabled { .. } => "set_alarm_enabled",
            Self::SetAlarmTime { .. } => "set_alarm_time",
            Self::SetAlarmVibrationIntensity { .. } => "set_alarm_vibration_intensity",
            Self::SetAlarmVibrationDuration { .. } => "set_alarm_vibration_duration",
            Self::SetAlarmVibrationPattern { .. } => "set_alarm_vibration_pattern",
            Self::SetAlarmDisabledTonight { .. } => "set_alarm_disabled_tonight",
            Self::SetTempScheduleDisabledTonight { .. } => "set_temp_schedule_disabled_tonight",
        }
    }

    /// Range and format checks. Needs no pod state.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetTargetTemperature { temperature_f, .. } => {
                in_range("target_temperature_f", *temperature_f, &TEMPERATURE_F)
            }
            Self::SetLedBrightness { brightness } => {
                in_range("led_brightness", *brightness, &LED_BRIGHTNESS)
            }
            Self::SetPrimeDailyTime { time } => clock_time("prime_daily.time", time),
            Self::SetAlarmTime { time, .. } => clock_time("alarm.time", time),
            Self::SetAlarmVibrationIntensity { intensity, .. } => {
                in_range("alarm.vibration_intensity", *intensity, &VIBRATION_INTENSITY)
            }
            Self::SetAlarmVibrationDuration { seconds, .. } => {
                in_range("alarm.vibration_duration", *seconds, &VIBRATION_DURATION_SECS)
            }
            Self::SetPower { .. }
            | Self::SetAwayMode { .. }
            | Self::SetTapAction { .. }
            | Self::StartPriming
            | Self::SetPrimeDaily { .. }
            | Self::SetBiometrics { .. }
            | Self::SetRebootDaily { .. }
            | Self::SetAlarmEnabled { .. }
            | Self::SetAlarmVibrationPattern { .. }
            | Self::SetAlarmDisabledTonight { .. }
            | Self::SetTempScheduleDisabledTonight { .. } => Ok(()),
        }
    }

    /// Validate, then resolve the target field and write body against the
    /// current merged snapshot. `now` is local time: it picks today's
    /// alarm and dates tonight's overrides.
    #[allow(clippy::too_many_lines)]
    pub fn plan(
        &self,
        view: &PodSnapshot,
        now: DateTime<FixedOffset>,
    ) -> Result<CommandPlan, CoreError> {
        self.validate()?;
        let today = Weekday::from(now.weekday());

        let plan = match self {
            Self::SetPower { side, on } => CommandPlan {
                path: FieldPath::side(*side, "is_on"),
                value: json!(on),
                write: device_status(json!({ side.as_str(): { "isOn": on } })),
            },
            Self::SetTargetTemperature {
                side,
                temperature_f,
            } => CommandPlan {
                path: FieldPath::side(*side, "target_temperature_f"),
                value: json!(temperature_f),
                write: device_status(
                    json!({ side.as_str(): { "targetTemperatureF": temperature_f } }),
                ),
            },
            Self::SetAwayMode { side, away } => CommandPlan {
                path: FieldPath::side(*side, "away_mode"),
                value: json!(away),
                write: settings(json!({ side.as_str(): { "awayMode": away } })),
            },
            Self::SetTapAction {
                side,
                gesture,
                action,
            } => {
                let key = match gesture {
                    TapGesture::Double => "doubleTap",
                    TapGesture::Triple => "tripleTap",
                    TapGesture::Quad => "quadTap",
                };
                let config = serde_json::to_value(TapConfig::from(*action))?;
                CommandPlan {
                    path: FieldPath::side(*side, &format!("taps.{}", gesture.as_str())),
                    value: serde_json::to_value(action)?,
                    write: settings(json!({ side.as_str(): { "taps": { key: config } } })),
                }
            }
            Self::SetLedBrightness { brightness } => CommandPlan {
                path: FieldPath::pod("led_brightness"),
                value: json!(brightness),
                write: device_status(json!({ "settings": { "ledBrightness": brightness } })),
            },
            Self::StartPriming => CommandPlan {
                path: FieldPath::pod("is_priming"),
                value: json!(true),
                write: device_status(json!({ "isPriming": true })),
            },
            Self::SetPrimeDaily { enabled } => CommandPlan {
                path: FieldPath::pod("prime_daily.enabled"),
                value: json!(enabled),
                write: settings(json!({ "primePodDaily": { "enabled": enabled } })),
            },
            Self::SetPrimeDailyTime { time } => CommandPlan {
                path: FieldPath::pod("prime_daily.time"),
                value: json!(time),
                write: settings(json!({ "primePodDaily": { "time": time } })),
            },
            Self::SetBiometrics { enabled } => CommandPlan {
                path: FieldPath::pod("biometrics_enabled"),
                value: json!(enabled),
                write: PodWrite {
                    target: PatchTarget::Services,
                    body: json!({ "biometrics": { "enabled": enabled } }),
                },
            },
            Self::SetRebootDaily { enabled } => CommandPlan {
                path: FieldPath::pod("reboot_daily"),
                value: json!(enabled),
                write: settings(json!({ "rebootDaily": enabled })),
            },
            Self::SetAlarmEnabled { side, enabled } => {
                alarm_plan(view, *side, today, "enabled", json!(enabled), |a| {
                    a.enabled = *enabled;
                })?
            }
            Self::SetAlarmTime { side, time } => {
                alarm_plan(view, *side, today, "time", json!(time), |a| {
                    a.time.clone_from(time);
                })?
            }
            Self::SetAlarmVibrationIntensity { side, intensity } => alarm_plan(
                view,
                *side,
                today,
                "vibration_intensity",
                json!(intensity),
                |a| a.vibration_intensity = *intensity,
            )?,
            Self::SetAlarmVibrationDuration { side, seconds } => alarm_plan(
                view,
                *side,
                today,
                "vibration_duration",
                json!(seconds),
                |a| a.vibration_duration = *seconds,
            )?,
            Self::SetAlarmVibrationPattern { side, pattern } => alarm_plan(
                view,
                *side,
                today,
                "vibration_pattern",
                serde_json::to_value(pattern)?,
                |a| a.vibration_pattern = *pattern,
            )?,
            Self::SetAlarmDisabledTonight { side, disabled } => {
                let over = if *disabled {
                    let night = tonight(now)?;
                    let alarm = &view.side(*side).schedule.day(night.weekday().into()).alarm;
                    let time = NaiveTime::parse_from_str(&alarm.time, "%H:%M").map_err(|_| {
                        CoreError::invalid(
                            "alarm.time",
                            format!("no alarm time to skip ({:?})", alarm.time),
                        )
                    })?;
                    AlarmOverride {
                        disabled: true,
                        time_override: String::new(),
                        expires_at: (local(now, night, time)?
                            + TimeDelta::minutes(ALARM_OVERRIDE_GRACE_MINS))
                        .to_rfc3339(),
                    }
                } else {
                    AlarmOverride::default()
                };
                CommandPlan {
                    path: FieldPath::side(*side, "alarm_disabled_tonight"),
                    value: json!(disabled),
                    write: settings(json!({
                        side.as_str(): { "scheduleOverrides": { "alarm": serde_json::to_value(&over)? } }
                    })),
                }
            }
            Self::SetTempScheduleDisabledTonight { side, disabled } => {
                let over = if *disabled {
                    let noon = NaiveTime::from_hms_opt(NOON, 0, 0)
                        .ok_or_else(|| CoreError::Internal("invalid noon".into()))?;
                    TemperatureSchedulesOverride {
                        disabled: true,
                        expires_at: local(now, tonight(now)?, noon)?.to_rfc3339(),
                    }
                } else {
                    TemperatureSchedulesOverride::default()
                };
                CommandPlan {
                    path: FieldPath::side(*side, "temp_schedules_disabled_tonight"),
                    value: json!(disabled),
                    write: settings(json!({
                        side.as_str(): {
                            "scheduleOverrides": { "temperatureSchedules": serde_json::to_value(&over)? }
                        }
                    })),
                }
            }
        };
        Ok(plan)
    }
}

impl PodAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Update => "update",
            Self::TriggerAlarm { .. } => "trigger_alarm",
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Reboot | Self::Update => Ok(()),
            Self::TriggerAlarm {
                vibration_intensity,
                duration_secs,
                ..
            } => {
                in_range(
                    "vibration_intensity",
                    *vibration_intensity,
                    &VIBRATION_INTENSITY,
                )?;
                in_range("duration", *duration_secs, &VIBRATION_DURATION_SECS)
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn device_status(body: Value) -> PodWrite {
    PodWrite {
        target: PatchTarget::DeviceStatus,
        body,
    }
}

fn settings(body: Value) -> PodWrite {
    PodWrite {
        target: PatchTarget::Settings,
        body,
    }
}

/// The night a "tonight" override applies to, named by the morning it
/// ends: from noon on it is tomorrow, before noon it is today.
fn tonight(now: DateTime<FixedOffset>) -> Result<NaiveDate, CoreError> {
    let date = now.date_naive();
    if now.hour() < NOON {
        return Ok(date);
    }
    date.succ_opt()
        .ok_or_else(|| CoreError::Internal(format!("no day after {date}")))
}

/// `date` at `time` in `now`'s offset.
fn local(
    now: DateTime<FixedOffset>,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<FixedOffset>, CoreError> {
    now.offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| CoreError::Internal(format!("{date} {time} is not a local time")))
}

/// The server replaces a day's alarm object wholesale, so the write
/// carries today's full alarm with the one field changed.
fn alarm_plan(
    view: &PodSnapshot,
    side: Side,
    today: Weekday,
    field: &str,
    value: Value,
    apply: impl FnOnce(&mut Alarm),
) -> Result<CommandPlan, CoreError> {
    let mut alarm = view.side(side).schedule.day(today).alarm.clone();
    apply(&mut alarm);
    let wire = serde_json::to_value(AlarmSettings::from(&alarm))?;

    Ok(CommandPlan {
        path: FieldPath::side(side, &format!("schedule.{}.alarm.{field}", today.as_str())),
        value,
        write: PodWrite {
            target: PatchTarget::Schedules,
            body: json!({ side.as_str(): { today.as_str(): { "alarm": wire } } }),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;
    use pretty_assertions::assert_eq;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).expect("timestamp")
    }

    fn monday() -> DateTime<FixedOffset> {
        at("2024-06-10T09:00:00-04:00")
    }

    fn tuesday() -> DateTime<FixedOffset> {
        at("2024-06-11T09:00:00-04:00")
    }

    #[test]
    fn temperature_out_of_range_is_invalid() {
        let cmd = Command::SetTargetTemperature {
            side: Side::Left,
            temperature_f: 120,
        };
        assert!(matches!(
            cmd.plan(&snapshot(), monday()),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn alarm_write_sends_full_alarm_for_today() {
        let cmd = Command::SetAlarmTime {
            side: Side::Right,
            time: "06:15".into(),
        };
        let plan = cmd.plan(&snapshot(), tuesday()).expect("plan");

        assert_eq!(plan.path.as_str(), "right.schedule.tuesday.alarm.time");
        assert_eq!(plan.value, json!("06:15"));
        assert_eq!(plan.write.target, PatchTarget::Schedules);
        assert_eq!(
            plan.write.body,
            json!({
                "right": {
                    "tuesday": {
                        "alarm": {
                            "time": "06:15",
                            "enabled": true,
                            "vibrationIntensity": 50,
                            "vibrationPattern": "rise",
                            "duration": 10
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn tap_action_targets_settings() {
        let cmd = Command::SetTapAction {
            side: Side::Left,
            gesture: TapGesture::Triple,
            action: TapAction::SnoozeAlarm,
        };
        let plan = cmd.plan(&snapshot(), monday()).expect("plan");
        assert_eq!(plan.path.as_str(), "left.taps.triple");
        assert_eq!(plan.value, json!("snooze_alarm"));
        assert_eq!(
            plan.write.body,
            json!({
                "left": {
                    "taps": {
                        "tripleTap": {
                            "type": "alarm",
                            "behavior": "snooze",
                            "snoozeDuration": 60,
                            "inactiveAlarmBehavior": "power"
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn pod_settings_bodies() {
        let led = Command::SetLedBrightness { brightness: 30 }
            .plan(&snapshot(), monday())
            .expect("plan");
        assert_eq!(led.write.body, json!({ "settings": { "ledBrightness": 30 } }));

        let bio = Command::SetBiometrics { enabled: false }
            .plan(&snapshot(), monday())
            .expect("plan");
        assert_eq!(bio.write.target, PatchTarget::Services);
        assert_eq!(bio.path.as_str(), "pod.biometrics_enabled");

        assert!(Command::SetLedBrightness { brightness: 101 }.validate().is_err());
        assert!(
            Command::SetAlarmVibrationIntensity {
                side: Side::Left,
                intensity: 0
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn alarm_override_in_the_evening_expires_after_tomorrows_alarm() {
        let cmd = Command::SetAlarmDisabledTonight {
            side: Side::Left,
            disabled: true,
        };
        // Monday evening: tonight's alarm is Tuesday 07:30.
        let plan = cmd
            .plan(&snapshot(), at("2024-06-10T21:00:00-04:00"))
            .expect("plan");

        assert_eq!(plan.path.as_str(), "left.alarm_disabled_tonight");
        assert_eq!(plan.value, json!(true));
        assert_eq!(plan.write.target, PatchTarget::Settings);
        assert_eq!(
            plan.write.body,
            json!({
                "left": {
                    "scheduleOverrides": {
                        "alarm": {
                            "disabled": true,
                            "timeOverride": "",
                            "expiresAt": "2024-06-11T07:32:00-04:00"
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn alarm_override_before_noon_targets_this_morning() {
        let cmd = Command::SetAlarmDisabledTonight {
            side: Side::Right,
            disabled: true,
        };
        let plan = cmd
            .plan(&snapshot(), at("2024-06-10T05:30:00-04:00"))
            .expect("plan");
        assert_eq!(
            plan.write.body["right"]["scheduleOverrides"]["alarm"]["expiresAt"],
            json!("2024-06-10T07:02:00-04:00")
        );
    }

    #[test]
    fn clearing_overrides_sends_empty_fields() {
        let alarm = Command::SetAlarmDisabledTonight {
            side: Side::Left,
            disabled: false,
        }
        .plan(&snapshot(), monday())
        .expect("plan");
        assert_eq!(
            alarm.write.body,
            json!({
                "left": {
                    "scheduleOverrides": {
                        "alarm": { "disabled": false, "timeOverride": "", "expiresAt": "" }
                    }
                }
            })
        );

        let temp = Command::SetTempScheduleDisabledTonight {
            side: Side::Right,
            disabled: false,
        }
        .plan(&snapshot(), monday())
        .expect("plan");
        assert_eq!(temp.path.as_str(), "right.temp_schedules_disabled_tonight");
        assert_eq!(
            temp.write.body,
            json!({
                "right": {
                    "scheduleOverrides": {
                        "temperatureSchedules": { "disabled": false, "expiresAt": "" }
                    }
                }
            })
        );
    }

    #[test]
    fn temperature_override_expires_at_noon_tomorrow() {
        let cmd = Command::SetTempScheduleDisabledTonight {
            side: Side::Left,
            disabled: true,
        };
        let plan = cmd
            .plan(&snapshot(), at("2024-06-10T12:00:00+00:00"))
            .expect("plan");
        assert_eq!(
            plan.write.body["left"]["scheduleOverrides"]["temperatureSchedules"],
            json!({ "disabled": true, "expiresAt": "2024-06-11T12:00:00+00:00" })
        );
    }

    #[test]
    fn alarm_override_needs_an_alarm_time() {
        let mut view = snapshot();
        view.left.schedule.tuesday.alarm.time = String::new();
        let cmd = Command::SetAlarmDisabledTonight {
            side: Side::Left,
            disabled: true,
        };
        assert!(matches!(
            cmd.plan(&view, at("2024-06-10T21:00:00-04:00")),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn trigger_alarm_is_validated() {
        let action = PodAction::TriggerAlarm {
            side: Side::Left,
            vibration_intensity: 50,
            vibration_pattern: VibrationPattern::Double,
            duration_secs: 181,
        };
        assert!(matches!(
            action.validate(),
            Err(CoreError::InvalidValue { .. })
        ));
    }
}
