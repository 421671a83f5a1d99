//! Presentation logic extracted from Leptos components for testability.
//!
//! Popups and marker icons are handed to the map library as HTML strings,
//! so they are built here rather than with `view!`.

use crate::entities::{Route, Stop};
use crate::schedule::{ScheduleQuery, ScheduleRow, UPCOMING_TITLE};
use crate::types::StopRecord;

// === HTML Helpers ===

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

// === Stop Popup ===

/// Link to the arrivals page of a stop, for today.
pub fn schedule_href(stop_id: &str) -> String {
    format!(
        "schedule?{}",
        ScheduleQuery::new(stop_id, None).to_query_string()
    )
}

/// `(label, value)` rows of the stop popup table.
pub fn stop_popup_rows(stop: &StopRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Code", or_na(stop.stop_code.as_deref())),
        ("Name", or_na(stop.stop_name.as_deref())),
        ("Desc", or_na(stop.stop_desc.as_deref())),
        ("Location", format!("{}, {}", stop.stop_lon, stop.stop_lat)),
    ]
}

pub fn stop_popup_html(stop: &StopRecord) -> String {
    let rows: String = stop_popup_rows(stop)
        .iter()
        .map(|(label, value)| format!("<tr><th>{label}</th><td>{}</td></tr>", escape_html(value)))
        .collect();

    format!(
        r#"<p><h2>{}</h2><table>{rows}</table><a class="view-schedule" target="_blank" href="{}">View Schedule</a></p>"#,
        escape_html(&stop.full_name()),
        escape_html(&schedule_href(&stop.stop_id)),
    )
}

// === Route Popup ===

pub fn route_popup_html(route: &Route) -> String {
    let record = route.record();
    format!(
        r#"<p><h2>{}</h2><div>Short Name: {}</div><div>Long Name: {}</div><div>Route ID: {}</div><div class="bold">{} stops</div></p>"#,
        escape_html(&route.full_name()),
        escape_html(&record.route_short_name),
        escape_html(&record.route_long_name),
        escape_html(&record.route_id),
        route.stops().len(),
    )
}

// === Marker Icons ===

/// Class of the Leaflet `divIcon` wrapper.
pub fn marker_outer_class(highlighted: bool) -> &'static str {
    if highlighted {
        "div-icon div-icon-hover"
    } else {
        "div-icon"
    }
}

pub fn marker_inner_class(inactive: bool, highlighted: bool) -> String {
    let mut class = String::from("div-icon-inner");
    if inactive {
        class.push_str(" div-icon-inner-inactive");
    }
    if highlighted {
        class.push_str(" div-icon-inner-hover");
    }
    class
}

/// Inner HTML of a stop marker: its short name in a box of the stop's color.
pub fn marker_html(stop: &Stop) -> String {
    format!(
        r#"<div class="{}" style="border-color: {color}; color: {color};" title="ID: {}">{}</div>"#,
        marker_inner_class(stop.is_inactive(), stop.is_highlighted()),
        escape_html(stop.id()),
        escape_html(&stop.short_name()),
        color = stop.color(),
    )
}

// === Sidebar ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarTab {
    Stops,
    Routes,
}

/// Clicking the open tab closes it; clicking another tab switches to it.
pub fn toggle_tab(current: Option<SidebarTab>, clicked: SidebarTab) -> Option<SidebarTab> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked)
    }
}

pub fn color_indicator_style(color: &str) -> String {
    format!("background-color: {color};")
}

pub fn tab_class(active: bool) -> &'static str {
    if active { "toolbar-button toggled" } else { "toolbar-button" }
}

pub fn sidebar_class(busy: bool) -> &'static str {
    if busy { "sidebar loading" } else { "sidebar" }
}

// === Schedule Table ===

pub fn schedule_row_class(row: &ScheduleRow) -> &'static str {
    if row.upcoming { "highlight bold" } else { "" }
}

pub fn schedule_row_title(row: &ScheduleRow) -> Option<&'static str> {
    row.upcoming.then_some(UPCOMING_TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NEARBY_STOP_COLOR, StopOrigin, route_color};
    use crate::types::RouteRecord;

    fn record() -> StopRecord {
        StopRecord {
            stop_id: "8 & 9".to_string(),
            stop_code: Some("50001".to_string()),
            stop_name: Some("Main St <North>".to_string()),
            stop_desc: None,
            stop_lat: 49.25,
            stop_lon: -123.1,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_stop_popup_rows_use_na() {
        let rows = stop_popup_rows(&record());
        assert_eq!(rows[0], ("Code", "50001".to_string()));
        assert_eq!(rows[2], ("Desc", "N/A".to_string()));
        assert_eq!(rows[3], ("Location", "-123.1, 49.25".to_string()));
    }

    #[test]
    fn test_stop_popup_html() {
        let html = stop_popup_html(&record());
        assert!(html.contains("<h2>Main St &lt;North&gt;</h2>"));
        assert!(html.contains(r#"href="schedule?stop=8+%26+9""#));
        assert!(html.contains("View Schedule"));
    }

    #[test]
    fn test_schedule_href() {
        assert_eq!(schedule_href("61"), "schedule?stop=61");
    }

    #[test]
    fn test_route_popup_counts_stops() {
        let mut route = Route::new(
            RouteRecord {
                route_id: "6641".to_string(),
                route_short_name: "099".to_string(),
                route_long_name: "B-Line".to_string(),
            },
            route_color(0),
        );
        route.populate(vec![record(), record()], None);

        let html = route_popup_html(&route);
        assert!(html.contains("<h2>099 - B-Line - 6641</h2>"));
        assert!(html.contains("Route ID: 6641"));
        assert!(html.contains(r#"<div class="bold">2 stops</div>"#));
    }

    #[test]
    fn test_marker_classes() {
        assert_eq!(marker_inner_class(false, false), "div-icon-inner");
        assert_eq!(
            marker_inner_class(true, true),
            "div-icon-inner div-icon-inner-inactive div-icon-inner-hover"
        );
        assert_eq!(marker_outer_class(true), "div-icon div-icon-hover");
    }

    #[test]
    fn test_marker_html() {
        let stop = Stop::new(record(), StopOrigin::Nearby, NEARBY_STOP_COLOR);
        let html = marker_html(&stop);
        assert!(html.starts_with(r#"<div class="div-icon-inner" style="border-color: black; color: black;""#));
        assert!(html.contains(r#"title="ID: 8 &amp; 9""#));
        assert!(html.ends_with(">50001</div>"));
    }

    #[test]
    fn test_toggle_tab() {
        assert_eq!(toggle_tab(None, SidebarTab::Stops), Some(SidebarTab::Stops));
        assert_eq!(toggle_tab(Some(SidebarTab::Stops), SidebarTab::Stops), None);
        assert_eq!(
            toggle_tab(Some(SidebarTab::Stops), SidebarTab::Routes),
            Some(SidebarTab::Routes)
        );
        assert_eq!(sidebar_class(true), "sidebar loading");
        assert_eq!(tab_class(false), "toolbar-button");
    }

    #[test]
    fn test_schedule_row_marking() {
        let row = ScheduleRow {
            number: 2,
            time: "09:30:00".to_string(),
            route: "99 - B-Line".to_string(),
            headsign: "UBC".to_string(),
            upcoming: true,
        };
        assert_eq!(schedule_row_class(&row), "highlight bold");
        assert_eq!(schedule_row_title(&row), Some("Upcoming arrival"));

        let later = ScheduleRow { upcoming: false, ..row };
        assert_eq!(schedule_row_title(&later), None);
    }
}
