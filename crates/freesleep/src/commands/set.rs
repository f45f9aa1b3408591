//! Set and tap command handlers.

use freesleep_core::{Command as CoreCommand, Coordinator, Side, TapAction, TapGesture};

use crate::cli::{GlobalOpts, SetArgs, SetCommand, TapArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(
    coordinator: &Coordinator,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SetCommand::Power { side, state } => {
            let side = Side::from(side);
            let done = format!(
                "{} side turned {}",
                util::side_title(side),
                util::on_off(state.is_on())
            );
            util::apply(
                coordinator,
                CoreCommand::SetPower {
                    side,
                    on: state.is_on(),
                },
                global,
                &done,
            )
            .await
        }

        SetCommand::Temp { side, fahrenheit } => {
            let side = Side::from(side);
            let done = format!("{} side target set to {fahrenheit}°F", util::side_title(side));
            util::apply(
                coordinator,
                CoreCommand::SetTargetTemperature {
                    side,
                    temperature_f: fahrenheit,
                },
                global,
                &done,
            )
            .await
        }

        SetCommand::Away { side, state } => {
            let side = Side::from(side);
            let done = format!(
                "{} side away mode {}",
                util::side_title(side),
                util::on_off(state.is_on())
            );
            util::apply(
                coordinator,
                CoreCommand::SetAwayMode {
                    side,
                    away: state.is_on(),
                },
                global,
                &done,
            )
            .await
        }

        SetCommand::Led { brightness } => {
            util::apply(
                coordinator,
                CoreCommand::SetLedBrightness { brightness },
                global,
                &format!("LED brightness set to {brightness}%"),
            )
            .await
        }

        SetCommand::PrimeDaily { state, time } => {
            if let Some(time) = time {
                let done = format!("Daily priming time set to {time}");
                util::apply(
                    coordinator,
                    CoreCommand::SetPrimeDailyTime { time },
                    global,
                    &done,
                )
                .await?;
            }
            util::apply(
                coordinator,
                CoreCommand::SetPrimeDaily {
                    enabled: state.is_on(),
                },
                global,
                &format!("Daily priming {}", util::on_off(state.is_on())),
            )
            .await
        }

        SetCommand::Biometrics { state } => {
            util::apply(
                coordinator,
                CoreCommand::SetBiometrics {
                    enabled: state.is_on(),
                },
                global,
                &format!("Biometrics {}", util::on_off(state.is_on())),
            )
            .await
        }

        SetCommand::RebootDaily { state } => {
            util::apply(
                coordinator,
                CoreCommand::SetRebootDaily {
                    enabled: state.is_on(),
                },
                global,
                &format!("Daily reboot {}", util::on_off(state.is_on())),
            )
            .await
        }

        SetCommand::ScheduleOffTonight { side, state } => {
            let side = Side::from(side);
            let done = format!(
                "{} side temperature schedule {} tonight",
                util::side_title(side),
                if state.is_on() { "paused" } else { "resumed" }
            );
            util::apply(
                coordinator,
                CoreCommand::SetTempScheduleDisabledTonight {
                    side,
                    disabled: state.is_on(),
                },
                global,
                &done,
            )
            .await
        }
    }
}

pub async fn handle_tap(
    coordinator: &Coordinator,
    args: TapArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let side = Side::from(args.side);
    let gesture = TapGesture::from(args.gesture);
    let action = TapAction::from(args.action);
    let done = format!(
        "{} side {} tap set to {action}",
        util::side_title(side),
        gesture.as_str()
    );
    let command = CoreCommand::SetTapAction {
        side,
        gesture,
        action,
    };
    util::apply(coordinator, command, global, &done).await
}
