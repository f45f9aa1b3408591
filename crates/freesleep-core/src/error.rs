// ── Core error types ──
//
// User-facing errors from freesleep-core. Transport failures from
// `freesleep-api` are folded into the four poll failure kinds (timeout,
// refused, malformed, HTTP status) by the `From` impl below. The type is
// `Clone` so one poll result can be handed to every coalesced caller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Pod communication ────────────────────────────────────────────
    #[error("Pod request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Cannot connect to pod at {url}: {reason}")]
    ConnectionRefused { url: String, reason: String },

    #[error("Malformed response from pod: {message}")]
    MalformedResponse { message: String },

    #[error("Pod answered HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Write to {path} was not confirmed by the pod; assuming it applied")]
    ReconciliationTimeout { path: String },

    #[error("No pod state available yet")]
    NotReady,

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Coordinator has been shut down")]
    Stopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures of the pod round-trip itself, as opposed
    /// to rejected input or lifecycle errors.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused { .. }
                | Self::MalformedResponse { .. }
                | Self::HttpError { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("state serialization failed: {err}"))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<freesleep_api::Error> for CoreError {
    fn from(err: freesleep_api::Error) -> Self {
        match err {
            freesleep_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            freesleep_api::Error::ConnectionRefused { url, reason } => {
                CoreError::ConnectionRefused { url, reason }
            }
            freesleep_api::Error::Http {
                status,
                path,
                message,
            } => CoreError::HttpError {
                status,
                message: if message.is_empty() {
                    path
                } else {
                    format!("{path}: {message}")
                },
            },
            freesleep_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
            freesleep_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if let Some(status) = e.status() {
                    CoreError::HttpError {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    // Connect errors and bodies cut off mid-read both mean
                    // the pod could not be talked to.
                    CoreError::ConnectionRefused {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            freesleep_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid pod URL: {e}"),
            },
            freesleep_api::Error::ClientBuild(message) => CoreError::Config { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_poll_failure_kinds() {
        let timeout: CoreError = freesleep_api::Error::Timeout { timeout_secs: 10 }.into();
        assert_eq!(timeout, CoreError::Timeout { timeout_secs: 10 });

        let http: CoreError = freesleep_api::Error::Http {
            status: 503,
            path: "/api/deviceStatus".into(),
            message: String::new(),
        }
        .into();
        assert!(matches!(http, CoreError::HttpError { status: 503, .. }));

        let malformed: CoreError = freesleep_api::Error::Deserialization {
            message: "missing field `isOn`".into(),
            body: "{}".into(),
        }
        .into();
        assert!(matches!(malformed, CoreError::MalformedResponse { .. }));
        assert!(malformed.is_communication());
    }

    #[test]
    fn validation_errors_are_not_communication_failures() {
        assert!(!CoreError::invalid("left.target_temperature_f", "too hot").is_communication());
        assert!(!CoreError::Stopped.is_communication());
    }
}
