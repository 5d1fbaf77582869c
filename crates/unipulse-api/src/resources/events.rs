// Event, alarm, and rogue-AP endpoints
//
// Historical events (stat/event) and alarms (stat/alarm) with filter
// support, rogue-AP sightings (stat/rogueap), and alarm archiving via
// cmd/evtmgr.

use serde_json::json;
use tracing::debug;

use crate::client::Controller;
use crate::error::Error;
use crate::filter::{AlarmFilter, DEFAULT_WITHIN_HOURS, EventFilter};
use crate::models::{Alarm, Event};

impl Controller {
    /// List recent events.
    ///
    /// `GET /api/s/{site}/stat/event?_start=..&_limit=..&within=..`
    pub async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, Error> {
        let url = self.site_url(&format!("stat/event?{}", filter.query()));
        debug!(?filter, "listing events");
        self.get(url).await
    }

    /// List alarms.
    ///
    /// `GET /api/s/{site}/stat/alarm?archived=..`
    pub async fn list_alarms(&self, filter: AlarmFilter) -> Result<Vec<Alarm>, Error> {
        let url = self.site_url(&format!("stat/alarm?{}", filter.query()));
        debug!(?filter, "listing alarms");
        self.get(url).await
    }

    /// List rogue access points seen within the given look-back window.
    ///
    /// `GET /api/s/{site}/stat/rogueap?within=..` -- `None` uses the
    /// default window of 1 hour.
    pub async fn list_rogue_aps(
        &self,
        within_hours: Option<u32>,
    ) -> Result<Vec<serde_json::Value>, Error> {
        let within = within_hours.unwrap_or(DEFAULT_WITHIN_HOURS);
        let url = self.site_url(&format!("stat/rogueap?within={within}"));
        debug!(within, "listing rogue APs");
        self.get(url).await
    }

    /// Archive (acknowledge) a specific alarm by its ID.
    ///
    /// `POST /api/s/{site}/cmd/evtmgr` with `{"cmd": "archive-alarm", "_id": "..."}`
    pub async fn archive_alarm(&self, id: &str) -> Result<(), Error> {
        let url = self.site_url("cmd/evtmgr");
        debug!(id, "archiving alarm");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                json!({
                    "cmd": "archive-alarm",
                    "_id": id,
                }),
            )
            .await?;
        Ok(())
    }
}
