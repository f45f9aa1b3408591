//! Config subcommand handlers.

use tabled::Tabled;

use freesleep_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Default")]
    default: String,
}

#[derive(serde::Serialize)]
struct NamedProfile<'a> {
    name: &'a str,
    is_default: bool,
    #[serde(flatten)]
    profile: &'a Profile,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);
    let _ = writeln!(out, "failure_threshold = {}", cfg.defaults.failure_threshold);
    let _ = writeln!(out, "vitals_window_hours = {}", cfg.defaults.vitals_window_hours);

    for (name, p) in sorted_profiles(cfg) {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
    }

    out
}

fn sorted_profiles(cfg: &Config) -> Vec<(&String, &Profile)> {
    let mut profiles: Vec<_> = cfg.profiles.iter().collect();
    profiles.sort_by(|a, b| a.0.cmp(b.0));
    profiles
}

fn save(cfg: &Config, quiet: bool) -> Result<(), CliError> {
    let path = config::save_config(cfg)?;
    if !quiet {
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { host, port, name } => {
            let mut cfg = config::load_config()?;
            let profile = Profile {
                port,
                ..Profile::for_host(host)
            };
            freesleep_config::profile_to_coordinator_config(&profile, &cfg.defaults)?;

            let first = cfg.profiles.is_empty();
            cfg.profiles.insert(name.clone(), profile);
            if first || cfg.default_profile.is_none() {
                cfg.default_profile = Some(name);
            }
            save(&cfg, global.quiet)
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                c.default_profile.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref();
            let profiles: Vec<NamedProfile<'_>> = sorted_profiles(&cfg)
                .into_iter()
                .map(|(name, profile)| NamedProfile {
                    name,
                    is_default: Some(name.as_str()) == default,
                    profile,
                })
                .collect();

            let out = output::render_list(
                &global.output,
                &profiles,
                |p| ProfileRow {
                    name: p.name.to_owned(),
                    host: p.profile.host.clone(),
                    port: p.profile.port,
                    default: if p.is_default { "*".into() } else { String::new() },
                },
                |p| p.name.to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                let available = sorted_profiles(&cfg)
                    .into_iter()
                    .map(|(n, _)| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(CliError::ProfileNotFound { name, available });
            }
            cfg.default_profile = Some(name);
            save(&cfg, global.quiet)
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}
