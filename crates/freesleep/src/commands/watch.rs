//! Watch command handler: runs the coordinator's poll loop and prints
//! every published change until Ctrl-C.

use futures_util::StreamExt;
use serde_json::{Value, json};

use freesleep_core::{Coordinator, StateUpdate, UpdateCause};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::status;

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    coordinator.start().await?;
    let mut updates = coordinator.updates();
    let paint = Painter::new(&global.color);

    if matches!(global.output, OutputFormat::Table) {
        output::print_output(&status::detail(&coordinator.state(), paint), global.quiet);
    }
    if !global.quiet {
        let config = coordinator.config();
        eprintln!(
            "{}",
            paint.dim(&format!(
                "watching {}:{} every {}s (Ctrl-C to stop)",
                config.host,
                config.port,
                config.poll_interval.as_secs()
            ))
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.next() => {
                let Some(update) = update else { break };
                output::print_output(&render_update(&update, &global.output, paint), global.quiet);
                for warning in coordinator.take_warnings().await {
                    eprintln!("{} {warning}", paint.bad("warning:"));
                }
            }
        }
    }
    Ok(())
}

fn render_update(update: &StateUpdate, format: &OutputFormat, paint: Painter) -> String {
    let summary = json!({ "cause": update.cause, "changes": update.changes });
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(&summary),
        OutputFormat::Yaml => output::render_yaml(&summary),
        OutputFormat::Table | OutputFormat::Plain => {
            let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
            let cause = match update.cause {
                UpdateCause::Poll => "poll",
                UpdateCause::PollFailed => "poll failed",
                UpdateCause::Optimistic => "optimistic",
                UpdateCause::Rollback => "rollback",
            };
            update
                .changes
                .iter()
                .map(|c| {
                    format!(
                        "{} {} {}: {} -> {}",
                        paint.dim(&stamp),
                        paint.dim(cause),
                        paint.accent(c.path.as_str()),
                        show(c.previous.as_ref()),
                        show(c.current.as_ref())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

fn show(value: Option<&Value>) -> String {
    match value {
        None => "-".into(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
