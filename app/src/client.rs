use crate::config::Config;
use crate::error::{Result, ViewerError};
use crate::geo::Bounds;
use crate::types::{RouteRecord, ScheduleEntry, ServiceInfo, StopRecord};
use chrono::NaiveDate;
use geojson::GeoJson;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

/// Read-only access to the transit API.
///
/// [`TransitClient`] talks HTTP; tests substitute their own implementation.
#[allow(async_fn_in_trait)]
pub trait TransitApi {
    async fn fetch_info(&self) -> Result<ServiceInfo>;

    /// Stops inside `bounds`, at most `count` of them.
    async fn fetch_nearby_stops(&self, bounds: &Bounds, count: u32) -> Result<Vec<StopRecord>>;

    async fn fetch_all_routes(&self) -> Result<Vec<RouteRecord>>;

    async fn fetch_route_stops(&self, route_id: &str) -> Result<Vec<StopRecord>>;

    async fn fetch_route_geometry(&self, route_id: &str) -> Result<GeoJson>;

    async fn fetch_schedule(&self, stop_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>>;

    async fn fetch_stop(&self, stop_id: &str) -> Result<StopRecord>;
}

#[derive(Debug, Clone)]
pub struct TransitClient {
    client: Client,
    base_url: Url,
}

impl TransitClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_server).map_err(|e| {
            ViewerError::Config(format!("Invalid API_SERVER '{}': {e}", config.api_server))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ViewerError::Config(format!(
                "API_SERVER '{}' cannot be used as a base URL",
                config.api_server
            )));
        }

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        let client = builder.build().map_err(ViewerError::Http)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ViewerError::Config("API server cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).query(query).send().await?;

        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::SERVICE_UNAVAILABLE => Err(ViewerError::ServiceUnavailable),
            StatusCode::NOT_FOUND => Err(ViewerError::NotFound(url.path().to_string())),
            s => Err(ViewerError::InvalidResponse(format!("HTTP {s} for url={url}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.get(url, query).await?;
        Ok(response.json::<T>().await?)
    }
}

impl TransitApi for TransitClient {
    async fn fetch_info(&self) -> Result<ServiceInfo> {
        self.get_json(&["api", "info"], &[]).await
    }

    async fn fetch_nearby_stops(&self, bounds: &Bounds, count: u32) -> Result<Vec<StopRecord>> {
        let ne = bounds.north_east;
        let sw = bounds.south_west;
        let query = [
            ("high_lat", ne.lat.to_string()),
            ("high_lon", ne.lng.to_string()),
            ("low_lat", sw.lat.to_string()),
            ("low_lon", sw.lng.to_string()),
            ("count", count.to_string()),
        ];

        let stops: Vec<StopRecord> = self.get_json(&["api", "stops", "locate"], &query).await?;
        debug!("Located {} stops", stops.len());
        Ok(stops)
    }

    async fn fetch_all_routes(&self) -> Result<Vec<RouteRecord>> {
        self.get_json(&["api", "routes", "list"], &[]).await
    }

    async fn fetch_route_stops(&self, route_id: &str) -> Result<Vec<StopRecord>> {
        self.get_json(
            &["api", "stops", "list"],
            &[("route_id", route_id.to_string())],
        )
        .await
    }

    async fn fetch_route_geometry(&self, route_id: &str) -> Result<GeoJson> {
        let url = self.endpoint(&["api", "route", route_id, "geojson"])?;
        let body = self.get(url, &[]).await?.text().await?;
        body.parse::<GeoJson>()
            .map_err(|e| ViewerError::Decode(format!("route {route_id} geometry: {e}")))
    }

    async fn fetch_schedule(&self, stop_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>> {
        self.get_json(
            &["api", "stop_times", stop_id, "schedule"],
            &[("date", date.format("%Y-%m-%d").to_string())],
        )
        .await
    }

    async fn fetch_stop(&self, stop_id: &str) -> Result<StopRecord> {
        let stops: Vec<StopRecord> = self.get_json(&["api", "stops", "id", stop_id], &[]).await?;
        stops
            .into_iter()
            .next()
            .ok_or_else(|| ViewerError::NotFound(format!("stop {stop_id}")))
    }
}
