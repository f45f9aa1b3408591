//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod actions;
pub mod alarm;
pub mod config_cmd;
pub mod set;
pub mod status;
pub mod util;
pub mod watch;

use freesleep_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a pod-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(coordinator, global).await,
        Command::Watch(_) => watch::handle(coordinator, global).await,
        Command::Set(args) => set::handle(coordinator, args, global).await,
        Command::Alarm(args) => alarm::handle(coordinator, args, global).await,
        Command::Tap(args) => set::handle_tap(coordinator, args, global).await,
        Command::Prime => actions::prime(coordinator, global).await,
        Command::Reboot => actions::reboot(coordinator, global).await,
        Command::Update => actions::update(coordinator, global).await,
        Command::TriggerAlarm(args) => actions::trigger_alarm(coordinator, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
