// ── Pod client seam ──
//
// The coordinator talks to the pod only through `PodClient`, so tests
// (and alternative transports) can stand in for the HTTP client. The
// production implementation fans one poll out over the server's REST
// endpoints and assembles a `PodSnapshot`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use futures_util::future::BoxFuture;
use tracing::debug;

use freesleep_api::models::{AlarmTrigger, Job};
use freesleep_api::{FreeSleepClient, TransportConfig};

use crate::clock::{Clock, SystemClock};
use crate::command::{PodAction, PodWrite};
use crate::config::CoordinatorConfig;
use crate::convert::{BiometricReadings, PodReadings};
use crate::error::CoreError;
use crate::model::{PodSnapshot, Side};

/// Reads and writes against one pod. Implementations perform exactly one
/// attempt per call, bounded by their own timeout, and never retry.
pub trait PodClient: Send + Sync {
    /// Read the full pod state.
    fn fetch_snapshot(&self) -> BoxFuture<'_, Result<PodSnapshot, CoreError>>;

    /// Post one partial-merge write. `Ok` means the pod acknowledged it,
    /// not that it has taken effect.
    fn send_command<'a>(&'a self, write: &'a PodWrite) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Start a fire-and-forget operation.
    fn run_action<'a>(&'a self, action: &'a PodAction) -> BoxFuture<'a, Result<(), CoreError>>;
}

// ── HTTP implementation ─────────────────────────────────────────────

/// [`PodClient`] backed by the free-sleep REST API.
#[derive(Clone)]
pub struct HttpPodClient {
    api: FreeSleepClient,
    vitals_window: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for HttpPodClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPodClient")
            .field("api", &self.api)
            .field("vitals_window", &self.vitals_window)
            .finish_non_exhaustive()
    }
}

impl HttpPodClient {
    pub fn new(api: FreeSleepClient, vitals_window: Duration) -> Self {
        Self {
            api,
            vitals_window: TimeDelta::from_std(vitals_window).unwrap_or(TimeDelta::hours(12)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Anchor the vitals look-back window on `clock` instead of the
    /// system time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the HTTP client described by `config`.
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::with_timeout(config.request_timeout);
        let api = FreeSleepClient::new(config.base_url()?, &transport)?;
        Ok(Self::new(api, config.vitals_window))
    }

    pub fn api(&self) -> &FreeSleepClient {
        &self.api
    }

    async fn fetch(&self) -> Result<PodSnapshot, CoreError> {
        let (device, settings, presence, schedules, services) = tokio::try_join!(
            self.api.get_device_status(),
            self.api.get_settings(),
            self.api.get_presence(),
            self.api.get_schedules(),
            self.api.get_services(),
        )?;

        let (left_biometrics, right_biometrics, server_status) = tokio::join!(
            self.biometrics(Side::Left),
            self.biometrics(Side::Right),
            async {
                self.api
                    .get_server_status()
                    .await
                    .inspect_err(|e| debug!(error = %e, "server status unavailable"))
                    .ok()
            },
        );

        PodSnapshot::try_from(PodReadings {
            device,
            settings,
            presence,
            schedules,
            services,
            left_biometrics,
            right_biometrics,
            server_status,
        })
    }

    /// Vitals summary and sleep records over the look-back window. Either
    /// request may fail without failing the poll.
    async fn biometrics(&self, side: Side) -> BiometricReadings {
        let end = self.clock.now().with_timezone(&Utc);
        let start = end - self.vitals_window;
        let (summary, sleep) = tokio::join!(
            self.api.get_vitals_summary(side.as_str(), start, end),
            self.api.get_sleep_records(side.as_str(), start, end),
        );
        BiometricReadings {
            summary: summary
                .inspect_err(|e| debug!(%side, error = %e, "vitals summary unavailable"))
                .ok(),
            sleep: sleep
                .inspect_err(|e| debug!(%side, error = %e, "sleep records unavailable"))
                .ok(),
        }
    }

    async fn act(&self, action: &PodAction) -> Result<(), CoreError> {
        match action {
            PodAction::Reboot => self.api.run_jobs(&[Job::Reboot]).await?,
            PodAction::Update => self.api.run_jobs(&[Job::Update]).await?,
            PodAction::TriggerAlarm {
                side,
                vibration_intensity,
                vibration_pattern,
                duration_secs,
            } => {
                self.api
                    .trigger_alarm(&AlarmTrigger {
                        side: side.as_str().to_owned(),
                        vibration_intensity: *vibration_intensity,
                        vibration_pattern: (*vibration_pattern).into(),
                        duration: *duration_secs,
                        force: false,
                    })
                    .await?;
            }
        }
        Ok(())
    }
}

impl PodClient for HttpPodClient {
    fn fetch_snapshot(&self) -> BoxFuture<'_, Result<PodSnapshot, CoreError>> {
        Box::pin(self.fetch())
    }

    fn send_command<'a>(&'a self, write: &'a PodWrite) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            self.api.patch(write.target, &write.body).await?;
            Ok(())
        })
    }

    fn run_action<'a>(&'a self, action: &'a PodAction) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.act(action))
    }
}
