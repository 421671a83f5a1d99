//! Stops and routes as the viewer tracks them: fetched records plus the
//! marker and layer state derived from user interaction.

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, LatLng, geojson_bounds};
use crate::types::{RouteRecord, StopRecord};

/// Route colors, assigned cyclically in load order.
pub const ROUTE_COLORS: [&str; 10] = [
    "red",
    "forestgreen",
    "blue",
    "orange",
    "blueviolet",
    "magenta",
    "coral",
    "darkcyan",
    "deeppink",
    "slategray",
];

pub const NEARBY_STOP_COLOR: &str = "black";

pub fn route_color(index: usize) -> &'static str {
    ROUTE_COLORS[index % ROUTE_COLORS.len()]
}

/// Where a stop came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopOrigin {
    Nearby,
    Route(String),
}

/// Identifies one marker on the map. The same `stop_id` can have a marker
/// per origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId {
    pub origin: StopOrigin,
    pub stop_id: String,
}

#[derive(Debug, Clone)]
pub struct Stop {
    record: StopRecord,
    origin: StopOrigin,
    color: &'static str,
    shown: bool,
    inactive: bool,
    popup_open: bool,
    hovered: bool,
}

impl Stop {
    pub fn new(record: StopRecord, origin: StopOrigin, color: &'static str) -> Self {
        Self {
            record,
            origin,
            color,
            shown: false,
            inactive: false,
            popup_open: false,
            hovered: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.stop_id
    }

    pub fn code(&self) -> Option<&str> {
        self.record.stop_code.as_deref()
    }

    pub fn short_name(&self) -> String {
        self.record.short_name()
    }

    pub fn display_name(&self) -> String {
        self.record.full_name()
    }

    pub fn position(&self) -> LatLng {
        self.record.position()
    }

    pub fn record(&self) -> &StopRecord {
        &self.record
    }

    pub fn origin(&self) -> &StopOrigin {
        &self.origin
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn marker_id(&self) -> MarkerId {
        MarkerId {
            origin: self.origin.clone(),
            stop_id: self.record.stop_id.clone(),
        }
    }

    /// Whether the marker is attached to the map.
    pub fn is_visible(&self) -> bool {
        self.shown
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    pub fn is_highlighted(&self) -> bool {
        self.hovered || self.popup_open
    }

    /// `filter` must already be lowercase. An empty filter matches everything.
    pub fn matches_filter(&self, filter: &str) -> bool {
        filter.is_empty() || self.display_name().to_lowercase().contains(filter)
    }

    /// Returns true when the state changed.
    pub(crate) fn set_shown(&mut self, shown: bool) -> bool {
        std::mem::replace(&mut self.shown, shown) != shown
    }

    pub(crate) fn set_inactive(&mut self, inactive: bool) -> bool {
        std::mem::replace(&mut self.inactive, inactive) != inactive
    }

    pub(crate) fn set_hovered(&mut self, hovered: bool) -> bool {
        let before = self.is_highlighted();
        self.hovered = hovered;
        before != self.is_highlighted()
    }

    pub(crate) fn set_popup_open(&mut self, open: bool) -> bool {
        let before = self.is_highlighted();
        self.popup_open = open;
        before != self.is_highlighted()
    }
}

/// `Unloaded → Loading → Hidden ⇄ Shown`. Loaded data is never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteState {
    Unloaded,
    Loading,
    Hidden,
    Shown,
}

#[derive(Debug, Clone)]
pub struct RouteGeometry {
    pub geojson: GeoJson,
    pub bounds: Option<Bounds>,
}

impl RouteGeometry {
    pub fn new(geojson: GeoJson) -> Self {
        let bounds = geojson_bounds(&geojson);
        Self { geojson, bounds }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    record: RouteRecord,
    color: &'static str,
    stops: Vec<Stop>,
    geometry: Option<RouteGeometry>,
    state: RouteState,
    checked: bool,
}

impl Route {
    pub fn new(record: RouteRecord, color: &'static str) -> Self {
        Self {
            record,
            color,
            stops: Vec::new(),
            geometry: None,
            state: RouteState::Unloaded,
            checked: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.route_id
    }

    pub fn record(&self) -> &RouteRecord {
        &self.record
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} - {} - {}",
            self.record.route_short_name, self.record.route_long_name, self.record.route_id
        )
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub(crate) fn stops_mut(&mut self) -> &mut [Stop] {
        &mut self.stops
    }

    pub fn geometry(&self) -> Option<&RouteGeometry> {
        self.geometry.as_ref()
    }

    /// Extent of the route: its geometry, or its stops when the geometry is missing.
    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry
            .as_ref()
            .and_then(|g| g.bounds)
            .or_else(|| Bounds::from_points(self.stops.iter().map(Stop::position)))
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, RouteState::Hidden | RouteState::Shown)
    }

    /// Whether the route layer is on the map.
    pub fn is_shown(&self) -> bool {
        self.state == RouteState::Shown
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub(crate) fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub(crate) fn set_state(&mut self, state: RouteState) {
        self.state = state;
    }

    pub(crate) fn populate(&mut self, stops: Vec<StopRecord>, geometry: Option<GeoJson>) {
        let origin = StopOrigin::Route(self.record.route_id.clone());
        self.stops = stops
            .into_iter()
            .map(|record| Stop::new(record, origin.clone(), self.color))
            .collect();
        self.geometry = geometry.map(RouteGeometry::new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: Option<&str>) -> StopRecord {
        StopRecord {
            stop_id: id.to_string(),
            stop_code: None,
            stop_name: name.map(str::to_string),
            stop_desc: None,
            stop_lat: 49.0,
            stop_lon: -123.0,
        }
    }

    #[test]
    fn test_route_colors_cycle() {
        assert_eq!(route_color(0), "red");
        assert_eq!(route_color(9), "slategray");
        assert_eq!(route_color(10), "red");
        assert_eq!(route_color(12), "blue");
    }

    #[test]
    fn test_matches_filter_case_insensitive() {
        let stop = Stop::new(
            record("1", Some("Granville St @ W Broadway")),
            StopOrigin::Nearby,
            NEARBY_STOP_COLOR,
        );
        assert!(stop.matches_filter(""));
        assert!(stop.matches_filter("granville"));
        assert!(stop.matches_filter("w broad"));
        assert!(!stop.matches_filter("main"));
    }

    #[test]
    fn test_matches_filter_uses_fallback_name() {
        let stop = Stop::new(record("777", None), StopOrigin::Nearby, NEARBY_STOP_COLOR);
        assert!(stop.matches_filter("stop id: 777"));
    }

    #[test]
    fn test_highlight_tracks_hover_and_popup() {
        let mut stop = Stop::new(record("1", None), StopOrigin::Nearby, NEARBY_STOP_COLOR);
        assert!(stop.set_hovered(true));
        assert!(!stop.set_popup_open(true));
        assert!(!stop.set_hovered(false));
        assert!(stop.is_highlighted());
        assert!(stop.set_popup_open(false));
        assert!(!stop.is_highlighted());
    }

    #[test]
    fn test_route_full_name() {
        let route = Route::new(
            RouteRecord {
                route_id: "6641".to_string(),
                route_short_name: "099".to_string(),
                route_long_name: "UBC/Commercial-Broadway".to_string(),
            },
            route_color(0),
        );
        assert_eq!(route.full_name(), "099 - UBC/Commercial-Broadway - 6641");
        assert_eq!(route.state(), RouteState::Unloaded);
        assert!(!route.is_loaded());
    }

    #[test]
    fn test_route_bounds_fall_back_to_stops() {
        let mut route = Route::new(
            RouteRecord {
                route_id: "r".to_string(),
                route_short_name: String::new(),
                route_long_name: String::new(),
            },
            route_color(1),
        );
        let mut far = record("2", None);
        far.stop_lat = 49.5;
        far.stop_lon = -122.5;
        route.populate(vec![record("1", None), far], None);

        let bounds = route.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(49.0, -123.0));
        assert_eq!(bounds.north_east, LatLng::new(49.5, -122.5));
        assert!(route.stops().iter().all(|s| s.color() == "forestgreen"));
    }
}
