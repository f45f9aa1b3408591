// Metrics endpoints
//
// Bed presence, aggregated vitals and sleep records. Vitals and sleep
// queries take a side and an ISO-8601 time window.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;
use url::Url;

use crate::client::FreeSleepClient;
use crate::error::Error;
use crate::models::{Presence, SleepRecord, VitalsSummary};

impl FreeSleepClient {
    /// `GET /api/metrics/presence`
    pub async fn get_presence(&self) -> Result<Presence, Error> {
        let url = self.api_url("metrics/presence")?;
        debug!("fetching presence");
        self.get(url).await
    }

    /// Aggregated vitals for one side over `[start, end]`.
    ///
    /// `GET /api/metrics/vitals/summary?side=..&startTime=..&endTime=..`
    pub async fn get_vitals_summary(
        &self,
        side: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<VitalsSummary, Error> {
        let url = self.window_url("metrics/vitals/summary", side, start, end)?;
        debug!(side, "fetching vitals summary");
        self.get(url).await
    }

    /// Sleep records for one side over `[start, end]`, oldest first.
    ///
    /// `GET /api/metrics/sleep?side=..&startTime=..&endTime=..`
    pub async fn get_sleep_records(
        &self,
        side: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SleepRecord>, Error> {
        let url = self.window_url("metrics/sleep", side, start, end)?;
        debug!(side, "fetching sleep records");
        self.get(url).await
    }

    fn window_url(
        &self,
        path: &str,
        side: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.query_pairs_mut()
            .append_pair("side", side)
            .append_pair("startTime", &start.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("endTime", &end.to_rfc3339_opts(SecondsFormat::Secs, true));
        Ok(url)
    }
}
