// Device status endpoints
//
// Live pod state: per-side temperatures and power, water level, priming,
// LED brightness and firmware versions.

use tracing::debug;

use crate::client::FreeSleepClient;
use crate::error::Error;
use crate::models::{DeviceStatus, PatchTarget};

impl FreeSleepClient {
    /// Fetch the current device state.
    ///
    /// `GET /api/deviceStatus`
    pub async fn get_device_status(&self) -> Result<DeviceStatus, Error> {
        let url = self.api_url("deviceStatus")?;
        debug!("fetching device status");
        self.get(url).await
    }

    /// Partially update the device state, e.g.
    /// `{"left": {"targetTemperatureF": 72}}`.
    ///
    /// `POST /api/deviceStatus`
    pub async fn update_device_status(&self, patch: &serde_json::Value) -> Result<(), Error> {
        self.patch(PatchTarget::DeviceStatus, patch).await
    }

    /// Post a partial-merge body to one of the writable resources.
    pub async fn patch(&self, target: PatchTarget, body: &serde_json::Value) -> Result<(), Error> {
        let url = self.api_url(target.path())?;
        debug!(target = target.path(), "posting partial update");
        self.post(url, body).await
    }
}
