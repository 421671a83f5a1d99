//! Decides which stops the sidebar lists and what the status line says.
//!
//! Everything here is pure: [`compute_sidebar`] reads the loaded stops and
//! the UI toggles and returns a [`SidebarView`]. Applying the view to the
//! markers is done by [`crate::session::Session::reconcile`].

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entities::{MarkerId, Route, Stop};

pub const ZOOM_IN_MESSAGE: &str = "Zoom-In to locate nearby stops";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub show_nearby_stops: bool,
    pub show_route_stops: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            show_nearby_stops: true,
            show_route_stops: true,
        }
    }
}

pub struct SidebarInput<'a> {
    pub nearby: &'a [Stop],
    pub routes: &'a [Route],
    pub toggles: Toggles,
    pub filter: &'a str,
    pub zoom: u8,
    pub nearby_min_zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarEntry {
    pub marker: MarkerId,
    pub code: Option<String>,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidebarView {
    /// Stops passing the filter, sorted by stop code.
    pub entries: Vec<SidebarEntry>,
    /// Markers of visible stops failing the filter, one per origin; they
    /// are greyed out.
    pub inactive: Vec<MarkerId>,
    pub visible_count: usize,
    pub status: String,
}

/// Every stop the toggles allow on the map, duplicates included. Nearby
/// stops come first, then the stops of every route on the map.
fn eligible_stops<'a>(input: &SidebarInput<'a>) -> Vec<&'a Stop> {
    let nearby = input
        .nearby
        .iter()
        .filter(|_| input.toggles.show_nearby_stops);

    let route_stops = input
        .routes
        .iter()
        .filter(|r| input.toggles.show_route_stops && r.is_shown())
        .flat_map(Route::stops);

    nearby.chain(route_stops).collect()
}

/// Stops eligible for the sidebar, one per `stop_id`.
///
/// When the same id appears more than once, the first visible occurrence
/// wins.
pub fn candidate_stops<'a>(input: &SidebarInput<'a>) -> Vec<&'a Stop> {
    let mut candidates: Vec<&Stop> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for stop in eligible_stops(input) {
        match seen.get(stop.id()) {
            Some(&idx) => {
                if !candidates[idx].is_visible() && stop.is_visible() {
                    candidates[idx] = stop;
                }
            }
            None => {
                seen.insert(stop.id(), candidates.len());
                candidates.push(stop);
            }
        }
    }

    candidates
}

pub fn compute_sidebar(input: &SidebarInput<'_>) -> SidebarView {
    let visible: Vec<&Stop> = candidate_stops(input)
        .into_iter()
        .filter(|s| s.is_visible())
        .collect();

    let filter = input.filter.to_lowercase();
    let (mut passing, failing): (Vec<&Stop>, Vec<&Stop>) =
        visible.iter().copied().partition(|s| s.matches_filter(&filter));

    passing.sort_by(|a, b| compare_stop_codes(a.code(), b.code()));

    // Duplicates of a failing stop are greyed out too.
    let failing_ids: HashSet<&str> = failing.iter().map(|s| s.id()).collect();
    let inactive = eligible_stops(input)
        .into_iter()
        .filter(|s| s.is_visible() && failing_ids.contains(s.id()))
        .map(Stop::marker_id)
        .collect();

    let zoom_too_low = input.toggles.show_nearby_stops && input.zoom < input.nearby_min_zoom;

    SidebarView {
        status: status_message(zoom_too_low, passing.len(), visible.len()),
        entries: passing
            .iter()
            .map(|s| SidebarEntry {
                marker: s.marker_id(),
                code: s.code().map(str::to_string),
                name: s.display_name(),
                color: s.color().to_string(),
            })
            .collect(),
        inactive,
        visible_count: visible.len(),
    }
}

pub fn status_message(zoom_too_low: bool, passing: usize, visible: usize) -> String {
    if zoom_too_low {
        ZOOM_IN_MESSAGE.to_string()
    } else if passing < visible {
        format!("Showing {passing}/{visible} Stops")
    } else {
        format!("Showing {visible} Stops")
    }
}

/// Orders stop codes numerically when both parse as integers.
///
/// Numeric codes sort before other codes, which compare as strings; stops
/// without a code go last.
pub fn compare_stop_codes(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            }
        }
    }
}
