// System endpoints
//
// Server health, background jobs (reboot, software update) and the
// immediate alarm trigger.

use tracing::debug;

use crate::client::FreeSleepClient;
use crate::error::Error;
use crate::models::{AlarmTrigger, Job, ServerStatus};

impl FreeSleepClient {
    /// Health of the server's internal services.
    ///
    /// `GET /api/serverStatus`
    pub async fn get_server_status(&self) -> Result<ServerStatus, Error> {
        let url = self.api_url("serverStatus")?;
        debug!("fetching server status");
        self.get(url).await
    }

    /// Queue background jobs.
    ///
    /// `POST /api/jobs` with e.g. `["reboot"]`
    pub async fn run_jobs(&self, jobs: &[Job]) -> Result<(), Error> {
        let url = self.api_url("jobs")?;
        debug!(?jobs, "running jobs");
        self.post(url, &jobs).await
    }

    /// Vibrate the alarm on one side right now.
    ///
    /// `POST /api/alarm`
    pub async fn trigger_alarm(&self, trigger: &AlarmTrigger) -> Result<(), Error> {
        let url = self.api_url("alarm")?;
        debug!(side = %trigger.side, "triggering alarm");
        self.post(url, trigger).await
    }
}
