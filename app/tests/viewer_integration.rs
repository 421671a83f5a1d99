//! Integration tests for the viewer against a mocked transit API

use app::client::TransitClient;
use app::config::Config;
use app::entities::RouteState;
use app::error::ViewerError;
use app::geo::{LatLng, Viewport};
use app::reconcile::ZOOM_IN_MESSAGE;
use app::schedule::{ScheduleQuery, load_schedule};
use app::session::{MapCommand, RouteToggle};
use app::viewer::Viewer;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CENTER: LatLng = LatLng::new(49.2827, -123.1207);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn config(server: &MockServer) -> Config {
    Config {
        api_server: server.uri(),
        ..Config::default()
    }
}

async fn mount_info(server: &MockServer, range: [u32; 2]) {
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service_date_range": range,
            "default_location": {"lat": CENTER.lat, "lon": CENTER.lng},
            "max_page_size": 100
        })))
        .mount(server)
        .await;
}

async fn mount_routes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/routes/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"route_id": "6641", "route_short_name": "099", "route_long_name": "B-Line"},
            {"route_id": "6642", "route_short_name": "014", "route_long_name": "Hastings"}
        ])))
        .mount(server)
        .await;
}

async fn start(server: &MockServer) -> Viewer<TransitClient> {
    let config = config(server);
    let client = TransitClient::new(&config).unwrap();
    Viewer::start(client, &config, today()).await.unwrap()
}

fn nearby_stops_body() -> serde_json::Value {
    json!([
        {"stop_id": "10", "stop_code": "50010", "stop_name": "Granville St @ Robson St",
         "stop_lat": CENTER.lat, "stop_lon": CENTER.lng},
        {"stop_id": "2", "stop_code": "50002", "stop_name": "Howe St @ Robson St",
         "stop_lat": CENTER.lat + 0.0005, "stop_lon": CENTER.lng}
    ])
}

#[tokio::test]
async fn test_start_at_default_zoom_skips_nearby_fetch() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/stops/locate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let viewer = start(&server).await;

    assert!(viewer.has_active_service());
    assert_eq!(viewer.session().routes().len(), 2);
    assert_eq!(viewer.session().viewport().zoom, 12);
    assert_eq!(viewer.sidebar().status, ZOOM_IN_MESSAGE);
}

#[tokio::test]
async fn test_inactive_service_still_starts() {
    let server = MockServer::start().await;
    mount_info(&server, [20250101, 20251231]).await;
    mount_routes(&server).await;

    let viewer = start(&server).await;
    assert!(!viewer.has_active_service());
}

#[tokio::test]
async fn test_start_fails_without_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config(&server);
    let client = TransitClient::new(&config).unwrap();
    let result = Viewer::start(client, &config, today()).await;
    assert!(matches!(result, Err(ViewerError::ServiceUnavailable)));
}

#[tokio::test]
async fn test_zoom_gating() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/stops/locate"))
        .and(query_param("count", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_stops_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = start(&server).await;

    let status = viewer
        .pan_to(Viewport::centered(CENTER, 15))
        .await
        .unwrap()
        .status
        .clone();
    assert_eq!(status, ZOOM_IN_MESSAGE);

    let sidebar = viewer.pan_to(Viewport::centered(CENTER, 16)).await.unwrap();
    assert_eq!(sidebar.status, "Showing 2 Stops");
    let codes: Vec<_> = sidebar
        .entries
        .iter()
        .map(|e| e.code.clone().unwrap_or_default())
        .collect();
    assert_eq!(codes, vec!["50002", "50010"]);
}

#[tokio::test]
async fn test_filter_marks_stops_inactive() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/stops/locate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_stops_body()))
        .mount(&server)
        .await;

    let mut viewer = start(&server).await;
    viewer.pan_to(Viewport::centered(CENTER, 17)).await.unwrap();
    viewer.drain_commands();

    let sidebar = viewer.set_filter("granville");
    assert_eq!(sidebar.status, "Showing 1/2 Stops");
    assert_eq!(sidebar.entries[0].name, "Granville St @ Robson St");

    let commands = viewer.drain_commands();
    assert!(commands.iter().any(|c| matches!(
        c,
        MapCommand::SetInactive { marker, inactive: true } if marker.stop_id == "2"
    )));
}

#[tokio::test]
async fn test_nearby_toggle_off_hides_stops() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/stops/locate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_stops_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = start(&server).await;
    viewer.pan_to(Viewport::centered(CENTER, 16)).await.unwrap();

    let sidebar = viewer.set_show_nearby_stops(false).await.unwrap();
    assert_eq!(sidebar.status, "Showing 0 Stops");
    assert!(
        viewer
            .session()
            .nearby_stops()
            .iter()
            .all(|s| !s.is_visible())
    );
}

async fn mount_route_6641(server: &MockServer, geometry: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/stops/list"))
        .and(query_param("route_id", "6641"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"stop_id": "61", "stop_code": "61", "stop_name": "Commercial-Broadway Station",
             "stop_lat": 49.262, "stop_lon": -123.069},
            {"stop_id": "62", "stop_code": "62", "stop_name": "UBC Exchange",
             "stop_lat": 49.267, "stop_lon": -123.247}
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/route/6641/geojson"))
        .respond_with(geometry)
        .expect(1)
        .mount(server)
        .await;
}

fn line_geometry() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "type": "LineString",
        "coordinates": [[-123.069, 49.262], [-123.247, 49.267]]
    }))
}

#[tokio::test]
async fn test_route_loaded_once() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;
    mount_route_6641(&server, line_geometry()).await;

    let mut viewer = start(&server).await;

    assert!(matches!(
        viewer.toggle_route(0, true).await.unwrap(),
        RouteToggle::Load(_)
    ));
    assert_eq!(viewer.sidebar().entries.len(), 2);
    assert_eq!(viewer.sidebar().status, ZOOM_IN_MESSAGE);
    let commands = viewer.drain_commands();
    assert!(commands.contains(&MapCommand::ShowRoute("6641".to_string())));
    assert!(commands.iter().any(|c| matches!(c, MapCommand::FlyToBounds(_))));

    assert_eq!(viewer.toggle_route(0, false).await.unwrap(), RouteToggle::Hidden);
    assert!(viewer.sidebar().entries.is_empty());
    assert_eq!(viewer.toggle_route(0, true).await.unwrap(), RouteToggle::Shown);
    assert_eq!(viewer.sidebar().entries.len(), 2);

    let sidebar = viewer.clear_routes();
    assert_eq!(sidebar.visible_count, 0);
    assert_eq!(viewer.session().routes()[0].state(), RouteState::Hidden);
    assert!(viewer.show_route("6641").await.unwrap());
    assert!(!viewer.show_route("nope").await.unwrap());
}

#[tokio::test]
async fn test_route_without_geometry_still_shows_stops() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;
    mount_route_6641(&server, ResponseTemplate::new(404)).await;

    let mut viewer = start(&server).await;
    viewer.toggle_route(0, true).await.unwrap();

    let route = &viewer.session().routes()[0];
    assert!(route.is_shown());
    assert!(route.geometry().is_none());
    assert_eq!(viewer.sidebar().entries.len(), 2);
    assert!(
        !viewer
            .drain_commands()
            .iter()
            .any(|c| matches!(c, MapCommand::ShowRoute(_)))
    );
}

#[tokio::test]
async fn test_route_stop_failure_allows_retry() {
    let server = MockServer::start().await;
    mount_info(&server, [20260101, 20261231]).await;
    mount_routes(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/stops/list"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut viewer = start(&server).await;

    assert!(viewer.toggle_route(1, true).await.is_err());
    assert!(!viewer.session().is_busy());
    assert_eq!(viewer.session().routes()[1].state(), RouteState::Unloaded);
    assert!(viewer.toggle_route(1, true).await.is_err());
}

#[tokio::test]
async fn test_load_schedule_marks_nothing_on_other_days() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stops/id/61"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"stop_id": "61", "stop_name": "Commercial-Broadway Station",
             "stop_lat": 49.262, "stop_lon": -123.069}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/stop_times/61/schedule"))
        .and(query_param("date", "2026-10-18"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"arrival_time": "08:00:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"},
            {"arrival_time": "09:30:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"}
        ])))
        .mount(&server)
        .await;

    let client = TransitClient::new(&config(&server)).unwrap();
    let query = ScheduleQuery::new("61", NaiveDate::from_ymd_opt(2026, 10, 18));
    let now = today().and_hms_opt(9, 0, 0).unwrap();

    let table = load_schedule(&client, &query, now).await.unwrap();
    assert_eq!(table.title, "Arrivals - Commercial-Broadway Station - 2026-10-18");
    assert_eq!(table.rows.len(), 2);
    assert!(table.upcoming().is_none());
}

#[tokio::test]
async fn test_load_schedule_today_marks_next_arrival() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stops/id/61"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"stop_id": "61", "stop_lat": 49.262, "stop_lon": -123.069}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/stop_times/61/schedule"))
        .and(query_param("date", "2026-10-17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"arrival_time": "08:00:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"},
            {"arrival_time": "09:30:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"},
            {"arrival_time": "11:00:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"}
        ])))
        .mount(&server)
        .await;

    let client = TransitClient::new(&config(&server)).unwrap();
    let query = ScheduleQuery::new("61", None);
    let now = today().and_hms_opt(9, 0, 0).unwrap();

    let table = load_schedule(&client, &query, now).await.unwrap();
    assert_eq!(table.title, "Arrivals - Stop ID: 61 - 2026-10-17");
    assert_eq!(table.upcoming().map(|r| r.number), Some(2));
}
