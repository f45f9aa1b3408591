//! Maintenance and one-shot action handlers.

use freesleep_core::{Command as CoreCommand, Coordinator, PodAction, Side};

use crate::cli::{GlobalOpts, TriggerAlarmArgs};
use crate::error::CliError;

use super::util;

pub async fn prime(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    util::apply(coordinator, CoreCommand::StartPriming, global, "Priming started").await
}

pub async fn reboot(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    run(coordinator, PodAction::Reboot, global, "Pod reboot initiated").await
}

pub async fn update(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    run(coordinator, PodAction::Update, global, "Server update started").await
}

pub async fn trigger_alarm(
    coordinator: &Coordinator,
    args: TriggerAlarmArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let side = Side::from(args.side);
    let done = format!("{} side alarm vibrating", util::side_title(side));
    let action = PodAction::TriggerAlarm {
        side,
        vibration_intensity: args.intensity,
        vibration_pattern: args.pattern.into(),
        duration_secs: args.duration,
    };
    run(coordinator, action, global, &done).await
}

async fn run(
    coordinator: &Coordinator,
    action: PodAction,
    global: &GlobalOpts,
    done: &str,
) -> Result<(), CliError> {
    coordinator.run_action(action).await?;
    if !global.quiet {
        eprintln!("{done}");
    }
    Ok(())
}
