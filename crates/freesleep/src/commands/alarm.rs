//! Alarm command handlers. Edits always target today's local weekday.

use serde::Serialize;
use tabled::Tabled;

use freesleep_core::{Alarm, Command as CoreCommand, Coordinator, Side, Weekday};

use crate::cli::{AlarmArgs, AlarmCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Intensity")]
    intensity: u8,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
}

/// One side's alarm for the current local weekday.
#[derive(Serialize)]
struct TodayAlarm {
    side: Side,
    day: Weekday,
    alarm: Alarm,
}

impl From<&TodayAlarm> for AlarmRow {
    fn from(t: &TodayAlarm) -> Self {
        Self {
            side: t.side.as_str().into(),
            day: t.day.as_str().into(),
            time: t.alarm.time.clone(),
            enabled: util::on_off(t.alarm.enabled).into(),
            intensity: t.alarm.vibration_intensity,
            duration: format!("{}s", t.alarm.vibration_duration),
            pattern: t.alarm.vibration_pattern.to_string(),
        }
    }
}

pub async fn handle(
    coordinator: &Coordinator,
    args: AlarmArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (side, command) = match args.command {
        AlarmCommand::Show => return show(coordinator, global).await,
        AlarmCommand::Enable { side } => (
            Side::from(side),
            CoreCommand::SetAlarmEnabled {
                side: side.into(),
                enabled: true,
            },
        ),
        AlarmCommand::Disable { side } => (
            Side::from(side),
            CoreCommand::SetAlarmEnabled {
                side: side.into(),
                enabled: false,
            },
        ),
        AlarmCommand::Time { side, time } => (
            Side::from(side),
            CoreCommand::SetAlarmTime {
                side: side.into(),
                time,
            },
        ),
        AlarmCommand::Intensity { side, value } => (
            Side::from(side),
            CoreCommand::SetAlarmVibrationIntensity {
                side: side.into(),
                intensity: value,
            },
        ),
        AlarmCommand::Duration { side, seconds } => (
            Side::from(side),
            CoreCommand::SetAlarmVibrationDuration {
                side: side.into(),
                seconds,
            },
        ),
        AlarmCommand::Pattern { side, pattern } => (
            Side::from(side),
            CoreCommand::SetAlarmVibrationPattern {
                side: side.into(),
                pattern: pattern.into(),
            },
        ),
        AlarmCommand::SkipTonight { side, state } => (
            Side::from(side),
            CoreCommand::SetAlarmDisabledTonight {
                side: side.into(),
                disabled: state.is_on(),
            },
        ),
    };

    let done = format!("{} side alarm updated", util::side_title(side));
    util::apply(coordinator, command, global, &done).await
}

async fn show(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let state = util::load_state(coordinator).await?;
    let Some(derived) = &state.derived else {
        return Err(CliError::NotReady);
    };

    let alarms: Vec<TodayAlarm> = Side::ALL
        .iter()
        .map(|&side| TodayAlarm {
            side,
            day: derived.today,
            alarm: derived.side(side).today_alarm.clone(),
        })
        .collect();

    let out = output::render_list(&global.output, &alarms, |a| AlarmRow::from(a), |t| {
        format!("{} {}", t.side, t.alarm.time)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
