//! Integration tests for client.rs using wiremock
//!
//! Tests HTTP interactions with a mocked transit API

use app::client::{TransitApi, TransitClient};
use app::config::Config;
use app::error::ViewerError;
use app::geo::{Bounds, LatLng};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TransitClient {
    let config = Config {
        api_server: server.uri(),
        ..Config::default()
    };
    TransitClient::new(&config).unwrap()
}

// === fetch_info TESTS ===

#[tokio::test]
async fn test_fetch_info_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service_date_range": [20260101, 20261231],
            "default_location": {"lat": 49.2827, "lon": -123.1207},
            "max_page_size": 250
        })))
        .mount(&mock_server)
        .await;

    let info = client_for(&mock_server).fetch_info().await.unwrap();

    assert_eq!(info.service_date_range, [20260101, 20261231]);
    assert_eq!(info.max_page_size, 250);
    assert_eq!(info.default_center(), LatLng::new(49.2827, -123.1207));
}

#[tokio::test]
async fn test_fetch_info_service_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).fetch_info().await;
    assert!(matches!(result, Err(ViewerError::ServiceUnavailable)));
}

#[tokio::test]
async fn test_fetch_info_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    match client_for(&mock_server).fetch_info().await {
        Err(ViewerError::InvalidResponse(msg)) => assert!(msg.starts_with("HTTP 500")),
        other => panic!("Expected InvalidResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_info_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).fetch_info().await;
    assert!(matches!(result, Err(ViewerError::Decode(_))));
}

// === nearby stops TESTS ===

#[tokio::test]
async fn test_fetch_nearby_stops_sends_bounds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stops/locate"))
        .and(query_param("high_lat", "49.3"))
        .and(query_param("high_lon", "-123.1"))
        .and(query_param("low_lat", "49.2"))
        .and(query_param("low_lon", "-123.2"))
        .and(query_param("count", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"stop_id": "1", "stop_code": "50001", "stop_name": "Main St", "stop_lat": 49.25, "stop_lon": -123.15},
            {"stop_id": "2", "stop_lat": 49.26, "stop_lon": -123.16}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bounds = Bounds::new(LatLng::new(49.2, -123.2), LatLng::new(49.3, -123.1));
    let stops = client_for(&mock_server)
        .fetch_nearby_stops(&bounds, 50)
        .await
        .unwrap();

    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0].stop_code.as_deref(), Some("50001"));
    assert_eq!(stops[1].short_name(), "Stop ID: 2");
}

// === routes TESTS ===

#[tokio::test]
async fn test_fetch_all_routes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"route_id": "6641", "route_short_name": "099", "route_long_name": "B-Line"},
            {"route_id": "6642", "route_short_name": "014", "route_long_name": "Hastings"}
        ])))
        .mount(&mock_server)
        .await;

    let routes = client_for(&mock_server).fetch_all_routes().await.unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[1].route_long_name, "Hastings");
}

#[tokio::test]
async fn test_fetch_route_stops_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stops/list"))
        .and(query_param("route_id", "6641"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"stop_id": "1", "stop_lat": 49.25, "stop_lon": -123.15}
        ])))
        .mount(&mock_server)
        .await;

    let stops = client_for(&mock_server)
        .fetch_route_stops("6641")
        .await
        .unwrap();
    assert_eq!(stops[0].stop_id, "1");
}

#[tokio::test]
async fn test_fetch_route_geometry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/route/6641/geojson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "LineString", "coordinates": [[-123.2, 49.2], [-123.1, 49.3]]}
        })))
        .mount(&mock_server)
        .await;

    let geojson = client_for(&mock_server)
        .fetch_route_geometry("6641")
        .await
        .unwrap();
    let bounds = app::geo::geojson_bounds(&geojson).unwrap();
    assert_eq!(bounds.south_west, LatLng::new(49.2, -123.2));
}

#[tokio::test]
async fn test_fetch_route_geometry_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/route/6641/geojson"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"type": "Nonsense"}"#))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).fetch_route_geometry("6641").await;
    assert!(matches!(result, Err(ViewerError::Decode(_))));
}

// === schedule TESTS ===

#[tokio::test]
async fn test_fetch_schedule_sends_date() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stop_times/61/schedule"))
        .and(query_param("date", "2026-10-17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"arrival_time": "08:00:00", "route_short_name": "99", "route_long_name": "B-Line", "trip_headsign": "UBC"}
        ])))
        .mount(&mock_server)
        .await;

    let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let entries = client_for(&mock_server)
        .fetch_schedule("61", date)
        .await
        .unwrap();
    assert_eq!(entries[0].route_name(), "99 - B-Line");
}

#[tokio::test]
async fn test_fetch_stop_empty_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stops/id/404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).fetch_stop("404").await;
    assert!(matches!(result, Err(ViewerError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_endpoint_is_not_found() {
    let mock_server = MockServer::start().await;

    let result = client_for(&mock_server).fetch_stop("61").await;
    assert!(matches!(result, Err(ViewerError::NotFound(_))));
}
