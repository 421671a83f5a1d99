//! Viewer state for one page load.
//!
//! Network calls never happen here. Each asynchronous step is split into a
//! `begin_*` call that hands out a ticket and a `complete_*` call that
//! applies the response, so callers never hold the session across an
//! `.await`. Marker and layer changes are queued as [`MapCommand`]s for
//! whatever draws the map.

use std::collections::HashSet;

use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entities::{
    MarkerId, NEARBY_STOP_COLOR, Route, RouteState, Stop, StopOrigin, route_color,
};
use crate::geo::{Bounds, Viewport};
use crate::reconcile::{SidebarInput, SidebarView, Toggles, compute_sidebar};
use crate::types::{RouteRecord, StopRecord};

/// Instruction for the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapCommand {
    ShowMarker(MarkerId),
    HideMarker(MarkerId),
    SetInactive { marker: MarkerId, inactive: bool },
    Highlight { marker: MarkerId, on: bool },
    OpenStopPopup(MarkerId),
    ShowRoute(String),
    HideRoute(String),
    OpenRoutePopup(String),
    FlyToBounds(Bounds),
}

/// Monotonic request counter; only the newest ticket is current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    pub(crate) fn advance(&mut self) -> Generation {
        self.0 += 1;
        *self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyTicket {
    generation: Generation,
    pub bounds: Bounds,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLoadTicket {
    pub index: usize,
    pub route_id: String,
    show_stops: bool,
}

/// Result of checking or unchecking a route in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteToggle {
    /// First expansion: fetch stops, then geometry, then complete the ticket.
    Load(RouteLoadTicket),
    Shown,
    Hidden,
    /// The sidebar is disabled by a load in progress.
    Busy,
    Unchanged,
}

/// One row of the routes sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteListItem {
    pub index: usize,
    pub route_id: String,
    pub name: String,
    pub color: String,
    pub checked: bool,
}

#[derive(Debug)]
pub struct Session {
    routes: Vec<Route>,
    nearby: Vec<Stop>,
    toggles: Toggles,
    filter: String,
    viewport: Viewport,
    nearby_min_zoom: u8,
    max_page_size: u32,
    nearby_generation: Generation,
    busy: bool,
    sidebar: SidebarView,
    commands: Vec<MapCommand>,
}

impl Session {
    pub fn new(viewport: Viewport, nearby_min_zoom: u8, max_page_size: u32) -> Self {
        Self {
            routes: Vec::new(),
            nearby: Vec::new(),
            toggles: Toggles::default(),
            filter: String::new(),
            viewport,
            nearby_min_zoom,
            max_page_size,
            nearby_generation: Generation::default(),
            busy: false,
            sidebar: SidebarView::default(),
            commands: Vec::new(),
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id() == route_id)
    }

    pub fn nearby_stops(&self) -> &[Stop] {
        &self.nearby
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// True while a route load has the sidebar disabled.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The view produced by the last [`Session::reconcile`].
    pub fn sidebar(&self) -> &SidebarView {
        &self.sidebar
    }

    pub fn find_stop(&self, marker: &MarkerId) -> Option<&Stop> {
        match &marker.origin {
            StopOrigin::Nearby => self.nearby.iter().find(|s| s.id() == marker.stop_id),
            StopOrigin::Route(route_id) => self
                .route(route_id)?
                .stops()
                .iter()
                .find(|s| s.id() == marker.stop_id),
        }
    }

    fn find_stop_mut(&mut self, marker: &MarkerId) -> Option<&mut Stop> {
        match &marker.origin {
            StopOrigin::Nearby => self.nearby.iter_mut().find(|s| s.id() == marker.stop_id),
            StopOrigin::Route(route_id) => self
                .routes
                .iter_mut()
                .find(|r| r.id() == route_id)?
                .stops_mut()
                .iter_mut()
                .find(|s| s.id() == marker.stop_id),
        }
    }

    /// Takes the queued map commands in the order they were issued.
    pub fn drain_commands(&mut self) -> Vec<MapCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Replaces the route list. Colors follow load order.
    pub fn set_routes(&mut self, records: Vec<RouteRecord>) {
        self.routes = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| Route::new(record, route_color(idx)))
            .collect();
        debug!("Loaded {} routes", self.routes.len());
    }

    pub fn route_list(&self) -> Vec<RouteListItem> {
        self.routes
            .iter()
            .enumerate()
            .map(|(index, r)| RouteListItem {
                index,
                route_id: r.id().to_string(),
                name: r.full_name(),
                color: r.color().to_string(),
                checked: r.is_checked(),
            })
            .collect()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn set_show_nearby_stops(&mut self, on: bool) {
        self.toggles.show_nearby_stops = on;
        if !on {
            for stop in &mut self.nearby {
                if stop.set_shown(false) {
                    self.commands.push(MapCommand::HideMarker(stop.marker_id()));
                }
            }
        }
    }

    pub fn set_show_route_stops(&mut self, on: bool) {
        self.toggles.show_route_stops = on;
        for route in &mut self.routes {
            let show = on && route.is_shown();
            set_stops_shown(route.stops_mut(), show, &mut self.commands);
        }
    }

    pub fn should_fetch_nearby(&self) -> bool {
        self.toggles.show_nearby_stops && self.viewport.zoom >= self.nearby_min_zoom
    }

    /// Starts a nearby-stop refresh for the current viewport, or `None` when
    /// zoomed out too far or the nearby toggle is off.
    pub fn begin_nearby_refresh(&mut self) -> Option<NearbyTicket> {
        if !self.should_fetch_nearby() {
            return None;
        }
        Some(NearbyTicket {
            generation: self.nearby_generation.advance(),
            bounds: self.viewport.bounds,
            count: self.max_page_size,
        })
    }

    /// Merges a nearby-stop response. Returns false when a newer refresh has
    /// started since `ticket` was issued; the response is then dropped.
    pub fn complete_nearby_refresh(&mut self, ticket: &NearbyTicket, records: Vec<StopRecord>) -> bool {
        if ticket.generation != self.nearby_generation {
            debug!("Dropping stale nearby-stop response");
            return false;
        }

        let mut added = 0;
        for record in records {
            if self.is_active(&record.stop_id) {
                continue;
            }
            self.nearby
                .push(Stop::new(record, StopOrigin::Nearby, NEARBY_STOP_COLOR));
            added += 1;
        }
        debug!("Added {} nearby stops ({} total)", added, self.nearby.len());

        let bounds = self.viewport.bounds;
        let enabled = self.toggles.show_nearby_stops;
        for stop in &mut self.nearby {
            let show = enabled && bounds.contains(stop.position());
            if stop.set_shown(show) {
                self.commands.push(if show {
                    MapCommand::ShowMarker(stop.marker_id())
                } else {
                    MapCommand::HideMarker(stop.marker_id())
                });
            }
        }
        true
    }

    fn is_active(&self, stop_id: &str) -> bool {
        self.nearby.iter().any(|s| s.id() == stop_id)
            || self
                .routes
                .iter()
                .any(|r| r.stops().iter().any(|s| s.id() == stop_id))
    }

    /// Handles a route checkbox.
    pub fn toggle_route(&mut self, index: usize, checked: bool) -> RouteToggle {
        if self.busy {
            return RouteToggle::Busy;
        }
        let show_stops = self.toggles.show_route_stops;
        let Some(route) = self.routes.get_mut(index) else {
            warn!("No route at index {}", index);
            return RouteToggle::Unchanged;
        };

        match (route.state(), checked) {
            (RouteState::Unloaded, true) => {
                route.set_checked(true);
                route.set_state(RouteState::Loading);
                self.busy = true;
                RouteToggle::Load(RouteLoadTicket {
                    index,
                    route_id: route.id().to_string(),
                    show_stops,
                })
            }
            (RouteState::Hidden, true) => {
                route.set_checked(true);
                self.open_route(index, show_stops);
                RouteToggle::Shown
            }
            (RouteState::Shown, false) => {
                route.set_checked(false);
                self.hide_route(index);
                RouteToggle::Hidden
            }
            (RouteState::Loading, _) => RouteToggle::Busy,
            _ => {
                route.set_checked(checked);
                RouteToggle::Unchanged
            }
        }
    }

    /// Finishes a route load and shows the route. A missing geometry only
    /// means the route has no layer; its stops are still used.
    pub fn complete_route_load(
        &mut self,
        ticket: &RouteLoadTicket,
        stops: Vec<StopRecord>,
        geometry: crate::error::Result<GeoJson>,
    ) {
        self.busy = false;
        let Some(route) = self.routes.get_mut(ticket.index) else {
            return;
        };

        let geometry = match geometry {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("No geometry for route {}: {}", ticket.route_id, e);
                None
            }
        };
        route.populate(stops, geometry);
        route.set_state(RouteState::Hidden);
        debug!(
            "Route {} loaded with {} stops",
            ticket.route_id,
            route.stops().len()
        );

        // Unchecked while loading: keep the data, leave it off the map.
        if route.is_checked() {
            self.open_route(ticket.index, ticket.show_stops);
        }
    }

    /// Abandons a route load whose stop fetch failed; the next check retries.
    pub fn fail_route_load(&mut self, ticket: &RouteLoadTicket) {
        self.busy = false;
        if let Some(route) = self.routes.get_mut(ticket.index) {
            route.set_state(RouteState::Unloaded);
            route.set_checked(false);
        }
    }

    fn open_route(&mut self, index: usize, show_stops: bool) {
        let route = &mut self.routes[index];
        route.set_state(RouteState::Shown);
        let route_id = route.id().to_string();

        if route.geometry().is_some() {
            self.commands.push(MapCommand::ShowRoute(route_id.clone()));
            self.commands.push(MapCommand::OpenRoutePopup(route_id));
        }
        if let Some(bounds) = route.bounds() {
            self.commands.push(MapCommand::FlyToBounds(bounds));
        }
        if show_stops {
            set_stops_shown(route.stops_mut(), true, &mut self.commands);
        }
    }

    fn hide_route(&mut self, index: usize) {
        let route = &mut self.routes[index];
        if !route.is_shown() {
            return;
        }
        route.set_state(RouteState::Hidden);
        if route.geometry().is_some() {
            self.commands.push(MapCommand::HideRoute(route.id().to_string()));
        }
        set_stops_shown(route.stops_mut(), false, &mut self.commands);
    }

    /// Hides every route and unchecks it. Loaded data stays cached.
    pub fn clear_routes(&mut self) {
        for index in 0..self.routes.len() {
            self.hide_route(index);
            self.routes[index].set_checked(false);
        }
    }

    pub fn hover_stop(&mut self, marker: &MarkerId, on: bool) {
        let changed = self
            .find_stop_mut(marker)
            .is_some_and(|s| s.set_hovered(on));
        if changed {
            self.commands.push(MapCommand::Highlight {
                marker: marker.clone(),
                on,
            });
        }
    }

    /// Asks the map to open a stop's popup, as when it is clicked in the
    /// sidebar.
    pub fn open_stop(&mut self, marker: &MarkerId) {
        if self.find_stop(marker).is_none() {
            return;
        }
        self.commands.push(MapCommand::OpenStopPopup(marker.clone()));
        self.set_stop_popup(marker, true);
    }

    /// Records a stop popup opening or closing. A stop stays highlighted
    /// while its popup is open.
    pub fn set_stop_popup(&mut self, marker: &MarkerId, open: bool) {
        let changed = self
            .find_stop_mut(marker)
            .is_some_and(|s| s.set_popup_open(open));
        if changed {
            self.commands.push(MapCommand::Highlight {
                marker: marker.clone(),
                on: open,
            });
        }
    }

    /// Recomputes the sidebar and updates the inactive marking of markers.
    pub fn reconcile(&mut self) -> &SidebarView {
        let view = compute_sidebar(&SidebarInput {
            nearby: &self.nearby,
            routes: &self.routes,
            toggles: self.toggles,
            filter: &self.filter,
            zoom: self.viewport.zoom,
            nearby_min_zoom: self.nearby_min_zoom,
        });

        let inactive: HashSet<&MarkerId> = view.inactive.iter().collect();
        let stops = self
            .nearby
            .iter_mut()
            .chain(self.routes.iter_mut().flat_map(|r| r.stops_mut().iter_mut()));
        for stop in stops.filter(|s| s.is_visible()) {
            let marker = stop.marker_id();
            let flag = inactive.contains(&marker);
            if stop.set_inactive(flag) {
                self.commands.push(MapCommand::SetInactive {
                    marker,
                    inactive: flag,
                });
            }
        }

        self.sidebar = view;
        &self.sidebar
    }
}

fn set_stops_shown(stops: &mut [Stop], shown: bool, commands: &mut Vec<MapCommand>) {
    for stop in stops {
        if stop.set_shown(shown) {
            commands.push(if shown {
                MapCommand::ShowMarker(stop.marker_id())
            } else {
                MapCommand::HideMarker(stop.marker_id())
            });
        }
    }
}
