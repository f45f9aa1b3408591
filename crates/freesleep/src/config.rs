//! CLI-side configuration: profile selection and flag overrides on top of
//! `freesleep_config`.
//!
//! Core never sees these types -- it receives a pre-built
//! `CoordinatorConfig`.

use std::time::Duration;

use freesleep_config::{Config, Profile, profile_to_coordinator_config};
use freesleep_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use freesleep_config::{config_path, load_config, save_config};

/// Profile named by `--profile`, else the config's default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.profile_name(global.profile.as_deref()).to_owned()
}

/// Build a `CoordinatorConfig` from the config file, profile, and CLI
/// overrides. `--host` alone is enough when no profile exists.
pub fn resolve_coordinator_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<CoordinatorConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = match (cfg.profiles.get(&profile_name), &global.host) {
        (Some(profile), _) => profile.clone(),
        (None, Some(host)) => Profile::for_host(host.clone()),
        (None, None) if global.profile.is_some() => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let mut config = profile_to_coordinator_config(&profile, &cfg.defaults)?;
    if let Some(ref host) = global.host {
        config.host.clone_from(host);
    }
    if let Some(port) = global.port {
        config.port = port;
    }
    if let Some(timeout) = global.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    config.validate()?;
    Ok(config)
}
