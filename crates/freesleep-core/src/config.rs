// ── Runtime coordinator configuration ──
//
// Describes which pod to talk to and how often. Never touches disk: the
// CLI (or any embedding host) builds a `CoordinatorConfig` and hands it in.

use std::time::Duration;

use freesleep_api::FreeSleepClient;
use url::Url;

/// Default free-sleep server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Connection and polling parameters for one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Pod host name or IP address.
    pub host: String,
    pub port: u16,
    /// Time between scheduled polls.
    pub poll_interval: Duration,
    /// Consecutive failed polls before the pod is reported unavailable.
    pub failure_threshold: u32,
    /// Bound on every HTTP request.
    pub request_timeout: Duration,
    /// How far back vitals and sleep records are queried, and how old the
    /// newest sample may be for vitals to count as available.
    pub vitals_window: Duration,
    /// Acknowledged polls a write may stay unconfirmed before it is
    /// force-confirmed.
    pub confirm_polls: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            poll_interval: Duration::from_secs(30),
            failure_threshold: 3,
            request_timeout: Duration::from_secs(10),
            vitals_window: Duration::from_secs(12 * 60 * 60),
            confirm_polls: 2,
        }
    }
}

impl CoordinatorConfig {
    /// Config for `host` with every other setting at its default.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// `http://{host}:{port}/`
    pub fn base_url(&self) -> Result<Url, crate::CoreError> {
        FreeSleepClient::base_url_for(&self.host, self.port).map_err(|e| {
            crate::CoreError::Config {
                message: format!("invalid pod address {}:{}: {e}", self.host, self.port),
            }
        })
    }

    /// Deadline for a pending write: two poll intervals after it was issued.
    pub fn confirmation_window(&self) -> Duration {
        self.poll_interval.saturating_mul(2)
    }

    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<(), crate::CoreError> {
        let fail = |message: &str| {
            Err(crate::CoreError::Config {
                message: message.to_owned(),
            })
        };
        if self.host.trim().is_empty() {
            return fail("pod host must not be empty");
        }
        if self.poll_interval.is_zero() {
            return fail("poll interval must be greater than zero");
        }
        if self.request_timeout.is_zero() {
            return fail("request timeout must be greater than zero");
        }
        if self.failure_threshold == 0 {
            return fail("failure threshold must be at least 1");
        }
        if self.confirm_polls == 0 {
            return fail("confirm polls must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pod_server() {
        let cfg = CoordinatorConfig::for_host("192.168.1.50");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.failure_threshold, 3);
        assert_eq!(cfg.confirmation_window(), Duration::from_secs(60));
        assert_eq!(
            cfg.base_url().expect("url").as_str(),
            "http://192.168.1.50:3000/"
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn ipv6_host_gets_brackets() {
        let cfg = CoordinatorConfig::for_host("fd00::50");
        assert_eq!(
            cfg.base_url().expect("url").as_str(),
            "http://[fd00::50]:3000/"
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = CoordinatorConfig {
            poll_interval: Duration::ZERO,
            ..CoordinatorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(crate::CoreError::Config { .. })));
    }
}
