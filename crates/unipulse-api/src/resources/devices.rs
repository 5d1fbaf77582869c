// Device endpoints
//
// Device reads via stat/device. MAC lookups go through the same
// validation as client filters.

use serde_json::json;
use tracing::debug;

use crate::client::Controller;
use crate::error::Error;
use crate::filter::normalize_mac;
use crate::models::Device;

impl Controller {
    /// List all devices with full statistics.
    ///
    /// `GET /api/s/{site}/stat/device`
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.site_url("stat/device");
        debug!("listing devices");
        self.get(url).await
    }

    /// Get a single device by MAC address.
    ///
    /// Filters the device list by MAC. Returns `None` if no device matches.
    pub async fn get_device(&self, mac: &str) -> Result<Option<Device>, Error> {
        let mac = normalize_mac(mac)?;
        let url = self.site_url("stat/device");
        debug!(mac, "fetching device");
        let devices: Vec<Device> = self.post(url, json!({ "macs": [mac] })).await?;
        Ok(devices.into_iter().next())
    }
}
