// Settings, schedule and service endpoints
//
// User configuration stored by the server. All POSTs are partial merges,
// except the per-day alarm object which the server replaces wholesale.

use tracing::debug;

use crate::client::FreeSleepClient;
use crate::error::Error;
use crate::models::{PatchTarget, Schedules, Services, Settings};

impl FreeSleepClient {
    /// `GET /api/settings`
    pub async fn get_settings(&self) -> Result<Settings, Error> {
        let url = self.api_url("settings")?;
        debug!("fetching settings");
        self.get(url).await
    }

    /// `POST /api/settings` (partial merge)
    pub async fn update_settings(&self, patch: &serde_json::Value) -> Result<(), Error> {
        self.patch(PatchTarget::Settings, patch).await
    }

    /// `GET /api/schedules`
    pub async fn get_schedules(&self) -> Result<Schedules, Error> {
        let url = self.api_url("schedules")?;
        debug!("fetching schedules");
        self.get(url).await
    }

    /// `POST /api/schedules` (partial merge down to the alarm object)
    pub async fn update_schedules(&self, patch: &serde_json::Value) -> Result<(), Error> {
        self.patch(PatchTarget::Schedules, patch).await
    }

    /// Biometrics and other optional services.
    ///
    /// `GET /api/services`
    pub async fn get_services(&self) -> Result<Services, Error> {
        let url = self.api_url("services")?;
        debug!("fetching services");
        self.get(url).await
    }

    /// `POST /api/services`
    pub async fn update_services(&self, patch: &serde_json::Value) -> Result<(), Error> {
        self.patch(PatchTarget::Services, patch).await
    }
}
