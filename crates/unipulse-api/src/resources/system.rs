// Controller-level system endpoints: sysinfo, health dashboard, routing.

use tracing::debug;

use crate::client::Controller;
use crate::error::Error;

impl Controller {
    /// Get controller system information.
    ///
    /// `GET /api/s/{site}/stat/sysinfo`
    ///
    /// Returns loosely-typed JSON because the field set varies by
    /// controller version.
    pub async fn get_sysinfo(&self) -> Result<serde_json::Value, Error> {
        let url = self.site_url("stat/sysinfo");
        debug!("fetching sysinfo");
        let mut data: Vec<serde_json::Value> = self.get(url).await?;
        // sysinfo typically returns a single-element array
        Ok(data.pop().unwrap_or(serde_json::Value::Null))
    }

    /// Get site health dashboard metrics.
    ///
    /// `GET /api/s/{site}/stat/health`
    ///
    /// Returns subsystem health entries (wan, lan, wlan, vpn, etc.).
    pub async fn get_health(&self) -> Result<Vec<serde_json::Value>, Error> {
        let url = self.site_url("stat/health");
        debug!("fetching site health");
        self.get(url).await
    }

    /// List the site's routing table entries.
    ///
    /// `GET /api/s/{site}/stat/routing`
    pub async fn list_routes(&self) -> Result<Vec<serde_json::Value>, Error> {
        let url = self.site_url("stat/routing");
        debug!("listing routes");
        self.get(url).await
    }
}
