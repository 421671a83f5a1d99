use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Response of `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// `[earliest, latest]` service days encoded as `YYYYMMDD`.
    pub service_date_range: [u32; 2],
    pub default_location: Location,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl ServiceInfo {
    pub fn has_active_service(&self, today: NaiveDate) -> bool {
        let [earliest, latest] = self.service_date_range;
        let today = encode_service_date(today);
        earliest <= today && today <= latest
    }

    pub fn default_center(&self) -> LatLng {
        LatLng::new(self.default_location.lat, self.default_location.lon)
    }
}

pub fn encode_service_date(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub stop_id: String,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub stop_desc: Option<String>,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

impl StopRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.stop_lat, self.stop_lon)
    }

    /// Stop code, falling back to the id when the feed has none.
    pub fn short_name(&self) -> String {
        non_empty(self.stop_code.as_deref())
            .map_or_else(|| format!("Stop ID: {}", self.stop_id), str::to_string)
    }

    /// Stop name, falling back to the id when the feed has none.
    pub fn full_name(&self) -> String {
        non_empty(self.stop_name.as_deref())
            .map_or_else(|| format!("Stop ID: {}", self.stop_id), str::to_string)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
}

/// One row of `GET /api/stop_times/{stop_id}/schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub arrival_time: String,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
    #[serde(default)]
    pub trip_headsign: String,
}

impl ScheduleEntry {
    pub fn route_name(&self) -> String {
        format!("{} - {}", self.route_short_name, self.route_long_name)
    }
}
