// Client (station) endpoints
//
// Reads via stat/sta, commands via cmd/stamgr. MAC filters are validated
// before any network call is made.

use serde_json::json;
use tracing::debug;

use crate::client::Controller;
use crate::error::Error;
use crate::filter::normalize_mac;
use crate::models::ClientEntry;

impl Controller {
    /// List all currently connected clients (stations).
    ///
    /// `GET /api/s/{site}/stat/sta`
    pub async fn list_clients(&self) -> Result<Vec<ClientEntry>, Error> {
        let url = self.site_url("stat/sta");
        debug!("listing connected clients");
        self.get(url).await
    }

    /// List connected clients filtered to the given MAC addresses.
    ///
    /// `POST /api/s/{site}/stat/sta` with `{"macs": [...]}`. Every entry
    /// is validated and normalized first.
    pub async fn list_clients_by_mac(&self, macs: &[String]) -> Result<Vec<ClientEntry>, Error> {
        let macs = macs
            .iter()
            .map(|mac| normalize_mac(mac))
            .collect::<Result<Vec<_>, _>>()?;

        let url = self.site_url("stat/sta");
        debug!(count = macs.len(), "listing clients by MAC");
        self.post(url, json!({ "macs": macs })).await
    }

    /// Block a client by MAC address.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "block-sta", "mac": "..."}`
    pub async fn block_client(&self, mac: &str) -> Result<(), Error> {
        let mac = normalize_mac(mac)?;
        let url = self.site_url("cmd/stamgr");
        debug!(mac, "blocking client");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                json!({
                    "cmd": "block-sta",
                    "mac": mac,
                }),
            )
            .await?;
        Ok(())
    }

    /// Unblock a client by MAC address.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "unblock-sta", "mac": "..."}`
    pub async fn unblock_client(&self, mac: &str) -> Result<(), Error> {
        let mac = normalize_mac(mac)?;
        let url = self.site_url("cmd/stamgr");
        debug!(mac, "unblocking client");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                json!({
                    "cmd": "unblock-sta",
                    "mac": mac,
                }),
            )
            .await?;
        Ok(())
    }

    /// Disconnect (kick) a client; it may immediately reconnect.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "kick-sta", "mac": "..."}`
    pub async fn kick_client(&self, mac: &str) -> Result<(), Error> {
        let mac = normalize_mac(mac)?;
        let url = self.site_url("cmd/stamgr");
        debug!(mac, "kicking client");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                json!({
                    "cmd": "kick-sta",
                    "mac": mac,
                }),
            )
            .await?;
        Ok(())
    }
}
