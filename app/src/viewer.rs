//! Drives a [`Session`] against a [`TransitApi`].
//!
//! The browser frontend interleaves the same `begin_*`/`complete_*` calls
//! with its own event handlers; `Viewer` runs them in sequence for the CLI
//! and for tests.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::client::TransitApi;
use crate::config::Config;
use crate::error::Result;
use crate::geo::Viewport;
use crate::reconcile::SidebarView;
use crate::session::{MapCommand, RouteToggle, Session};
use crate::types::ServiceInfo;

pub const SERVICE_WARNING: &str =
    "WARNING: Current date outside service range, schedules will be unavailable";

pub const LOAD_ERROR: &str = "Unable to load transit data, please try again later";

/// Session opened at the service's default location.
pub fn new_session(info: &ServiceInfo, config: &Config) -> Session {
    let viewport = Viewport::centered(info.default_center(), config.default_zoom);
    Session::new(viewport, config.nearby_min_zoom, info.max_page_size)
}

/// Refreshes nearby stops if the viewport allows it, then reconciles.
pub async fn refresh<A: TransitApi>(api: &A, session: &mut Session) -> Result<()> {
    if let Some(ticket) = session.begin_nearby_refresh() {
        let stops = api.fetch_nearby_stops(&ticket.bounds, ticket.count).await?;
        session.complete_nearby_refresh(&ticket, stops);
    }
    session.reconcile();
    Ok(())
}

pub struct Viewer<A> {
    api: A,
    info: ServiceInfo,
    session: Session,
    service_active: bool,
}

impl<A: TransitApi> Viewer<A> {
    /// Fetches service info and the route list, then runs the first update.
    pub async fn start(api: A, config: &Config, today: NaiveDate) -> Result<Self> {
        let info = api.fetch_info().await?;
        let service_active = info.has_active_service(today);
        if !service_active {
            warn!("{}", SERVICE_WARNING);
        }

        let mut session = new_session(&info, config);
        session.set_routes(api.fetch_all_routes().await?);
        info!(
            "Viewer ready at {} with {} routes",
            session.viewport().describe(),
            session.routes().len()
        );

        let mut viewer = Self {
            api,
            info,
            session,
            service_active,
        };
        viewer.update().await?;
        Ok(viewer)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn has_active_service(&self) -> bool {
        self.service_active
    }

    pub fn sidebar(&self) -> &SidebarView {
        self.session.sidebar()
    }

    pub async fn update(&mut self) -> Result<&SidebarView> {
        refresh(&self.api, &mut self.session).await?;
        Ok(self.session.sidebar())
    }

    pub async fn pan_to(&mut self, viewport: Viewport) -> Result<&SidebarView> {
        debug!("Viewport moved to {}", viewport.describe());
        self.session.set_viewport(viewport);
        self.update().await
    }

    pub fn set_filter(&mut self, filter: &str) -> &SidebarView {
        self.session.set_filter(filter);
        self.session.reconcile()
    }

    pub async fn set_show_nearby_stops(&mut self, on: bool) -> Result<&SidebarView> {
        self.session.set_show_nearby_stops(on);
        self.update().await
    }

    pub fn set_show_route_stops(&mut self, on: bool) -> &SidebarView {
        self.session.set_show_route_stops(on);
        self.session.reconcile()
    }

    /// Checks or unchecks a route, loading its stops and geometry the first
    /// time it is shown.
    pub async fn toggle_route(&mut self, index: usize, checked: bool) -> Result<RouteToggle> {
        let toggle = self.session.toggle_route(index, checked);

        if let RouteToggle::Load(ticket) = &toggle {
            let stops = match self.api.fetch_route_stops(&ticket.route_id).await {
                Ok(stops) => stops,
                Err(e) => {
                    self.session.fail_route_load(ticket);
                    return Err(e);
                }
            };
            let geometry = self.api.fetch_route_geometry(&ticket.route_id).await;
            self.session.complete_route_load(ticket, stops, geometry);
        }

        self.session.reconcile();
        Ok(toggle)
    }

    /// Shows a route by id; returns false when there is no such route.
    pub async fn show_route(&mut self, route_id: &str) -> Result<bool> {
        let Some(index) = self.session.routes().iter().position(|r| r.id() == route_id) else {
            return Ok(false);
        };
        self.toggle_route(index, true).await?;
        Ok(true)
    }

    pub fn clear_routes(&mut self) -> &SidebarView {
        self.session.clear_routes();
        self.session.reconcile()
    }

    pub fn drain_commands(&mut self) -> Vec<MapCommand> {
        self.session.drain_commands()
    }
}
