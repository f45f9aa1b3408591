//! Shared helpers for command handlers.

use std::sync::Arc;

use serde::Serialize;

use freesleep_core::{Command as CoreCommand, Coordinator, MergedState, Side};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Poll once and return the merged state.
pub async fn load_state(coordinator: &Coordinator) -> Result<Arc<MergedState>, CliError> {
    coordinator.refresh_now().await?;
    Ok(coordinator.state())
}

/// Validate `command` locally, load the pod state it is planned against,
/// then send it. Prints `done` unless quiet.
pub async fn apply(
    coordinator: &Coordinator,
    command: CoreCommand,
    global: &GlobalOpts,
    done: &str,
) -> Result<(), CliError> {
    command.validate()?;
    coordinator.refresh_now().await?;

    tracing::debug!(command = command.name(), "sending command");
    coordinator.dispatch(command).await?;
    if !global.quiet {
        eprintln!("{done}");
    }
    Ok(())
}

/// The serde name of a unit enum value (`heating`, `away`, ...).
pub fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "-".into(),
    }
}

pub fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

pub fn side_title(side: Side) -> &'static str {
    match side {
        Side::Left => "Left",
        Side::Right => "Right",
    }
}
