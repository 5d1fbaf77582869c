// Query filters and input validation for the resource endpoints.
//
// Defaults follow the controller's documented behavior: start=0,
// limit=100, archived=false, within=1 hour. Validation failures are
// raised before any network call is made.

use crate::error::Error;

pub(crate) const DEFAULT_LIMIT: u32 = 100;
pub(crate) const DEFAULT_WITHIN_HOURS: u32 = 1;

/// Paging and look-back filter for event listings.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    start: u32,
    limit: u32,
    within_hours: u32,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            start: 0,
            limit: DEFAULT_LIMIT,
            within_hours: DEFAULT_WITHIN_HOURS,
        }
    }
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the first record to return.
    pub fn start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    /// Maximum number of records to return.
    ///
    /// Non-positive values are rejected in favor of the default (100).
    pub fn limit(mut self, limit: i64) -> Self {
        match u32::try_from(limit) {
            Ok(limit) if limit > 0 => self.limit = limit,
            _ => self.limit = DEFAULT_LIMIT,
        }
        self
    }

    /// Look-back window in hours. Zero keeps the default (1).
    pub fn within_hours(mut self, hours: u32) -> Self {
        if hours > 0 {
            self.within_hours = hours;
        }
        self
    }

    pub(crate) fn query(&self) -> String {
        format!(
            "_start={}&_limit={}&within={}",
            self.start, self.limit, self.within_hours
        )
    }
}

/// Archive filter for alarm listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmFilter {
    archived: bool,
}

impl AlarmFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include archived alarms instead of active ones. Default: false.
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub(crate) fn query(&self) -> String {
        format!("archived={}", self.archived)
    }
}

/// Validate and normalize a client/device MAC address.
///
/// Accepts six hex octets separated by `:` or `-`; returns the
/// lower-cased, colon-separated form the controller expects.
pub(crate) fn normalize_mac(mac: &str) -> Result<String, Error> {
    let octets: Vec<&str> = mac.split([':', '-']).collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    if well_formed {
        Ok(octets.join(":").to_lowercase())
    } else {
        Err(Error::Validation {
            field: "mac",
            reason: format!("'{mac}' is not a MAC address"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_filter_defaults() {
        let filter = EventFilter::new();
        assert_eq!(filter.query(), "_start=0&_limit=100&within=1");
    }

    #[test]
    fn non_positive_limit_falls_back_to_default() {
        assert_eq!(
            EventFilter::new().limit(-5).query(),
            "_start=0&_limit=100&within=1"
        );
        assert_eq!(
            EventFilter::new().limit(0).query(),
            "_start=0&_limit=100&within=1"
        );
    }

    #[test]
    fn explicit_filter_values() {
        let filter = EventFilter::new().start(200).limit(50).within_hours(24);
        assert_eq!(filter.query(), "_start=200&_limit=50&within=24");
    }

    #[test]
    fn alarm_filter_defaults_to_active() {
        assert_eq!(AlarmFilter::new().query(), "archived=false");
        assert_eq!(AlarmFilter::new().archived(true).query(), "archived=true");
    }

    #[test]
    fn mac_normalization() {
        assert_eq!(
            normalize_mac("AA:BB:CC:DD:EE:FF").unwrap(),
            "aa:bb:cc:dd:ee:ff"
        );
        assert_eq!(
            normalize_mac("aa-bb-cc-dd-ee-ff").unwrap(),
            "aa:bb:cc:dd:ee:ff"
        );
    }

    #[test]
    fn malformed_mac_is_rejected() {
        assert!(normalize_mac("ZZ:ZZ:ZZ:ZZ:ZZ:ZZ").is_err());
        assert!(normalize_mac("aa:bb:cc:dd:ee").is_err());
        assert!(normalize_mac("aabbccddeeff").is_err());
        assert!(normalize_mac("").is_err());
    }
}
