//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use freesleep_config::ConfigError;
use freesleep_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to pod at {url}")]
    #[diagnostic(
        code(freesleep::connection_failed),
        help(
            "Check that the pod is powered and on the same network.\n\
             URL: {url}\n\
             Try: freesleep status --host <pod-ip>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(freesleep::timeout),
        help("Increase timeout with --timeout or check that the pod is responsive.")
    )]
    Timeout { seconds: u64 },

    // ── Pod ──────────────────────────────────────────────────────────
    #[error("Pod error ({code}): {message}")]
    #[diagnostic(code(freesleep::pod_error))]
    PodError { code: String, message: String },

    #[error("Pod state could not be loaded")]
    #[diagnostic(
        code(freesleep::not_ready),
        help("The pod did not answer the initial poll. Run: freesleep status -v")
    )]
    NotReady,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(freesleep::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(freesleep::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: freesleep config init --host <pod-ip> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No pod configured")]
    #[diagnostic(
        code(freesleep::no_config),
        help(
            "Create a profile with: freesleep config init --host <pod-ip>\n\
             Or pass --host / set FREESLEEP_HOST.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(freesleep::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to write config: {0}")]
    #[diagnostic(code(freesleep::config_write))]
    ConfigWrite(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NotReady => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionRefused { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::MalformedResponse { message } => CliError::PodError {
                code: "malformed_response".into(),
                message,
            },

            CoreError::HttpError { status, message } => CliError::PodError {
                code: format!("http_{status}"),
                message,
            },

            CoreError::InvalidValue { field, reason } => CliError::Validation { field, reason },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::NotReady => CliError::NotReady,

            err @ (CoreError::ReconciliationTimeout { .. }
            | CoreError::Stopped
            | CoreError::Internal(_)) => CliError::PodError {
                code: "internal".into(),
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::ConfigWrite(e.to_string()),
        }
    }
}
