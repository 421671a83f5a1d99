use app::client::{TransitApi, TransitClient};
use app::components::Toolbar;
use app::components::routes::RoutesSidebar;
use app::components::stops::StopsSidebar;
use app::components_impl::SidebarTab;
use app::config::Config;
use app::entities::MarkerId;
use app::reconcile::{SidebarView, Toggles};
use app::session::{RouteListItem, RouteLoadTicket, RouteToggle, Session};
use app::viewer::{LOAD_ERROR, SERVICE_WARNING, new_session};
use chrono::Local;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, warn};

use crate::leaflet::LeafletSurface;

const MAP_CONTAINER: &str = "map";

/// Handles shared by the map page's event handlers. The session and the
/// map exist once initialization has succeeded.
#[derive(Clone, Copy)]
struct MapContext {
    session: StoredValue<Option<Session>, LocalStorage>,
    surface: StoredValue<Option<LeafletSurface>, LocalStorage>,
    client: StoredValue<Option<TransitClient>, LocalStorage>,
    sidebar: RwSignal<SidebarView>,
    routes: RwSignal<Vec<RouteListItem>>,
    toggles: RwSignal<Toggles>,
    busy: RwSignal<bool>,
    location: RwSignal<String>,
    error: RwSignal<Option<String>>,
}

impl MapContext {
    fn new() -> Self {
        Self {
            session: StoredValue::new_local(None),
            surface: StoredValue::new_local(None),
            client: StoredValue::new_local(None),
            sidebar: RwSignal::new(SidebarView::default()),
            routes: RwSignal::new(Vec::new()),
            toggles: RwSignal::new(Toggles::default()),
            busy: RwSignal::new(false),
            location: RwSignal::new(String::new()),
            error: RwSignal::new(None),
        }
    }

    fn with_session<T>(self, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        self.session
            .try_update_value(|session| session.as_mut().map(f))
            .flatten()
    }

    fn client(self) -> Option<TransitClient> {
        self.client.get_value()
    }

    /// Reconciles, hands pending commands to the map and publishes the
    /// result to the UI.
    fn sync(self) {
        self.session.update_value(|session| {
            let Some(session) = session else {
                return;
            };
            session.reconcile();
            let commands = session.drain_commands();
            self.surface.update_value(|surface| {
                if let Some(surface) = surface {
                    surface.apply(session, commands);
                }
            });

            self.sidebar.set(session.sidebar().clone());
            self.routes.set(session.route_list());
            self.toggles.set(session.toggles());
            self.busy.set(session.is_busy());
            self.location.set(session.viewport().describe());
        });
    }

    fn fail(self, message: &str) {
        self.error.set(Some(message.to_string()));
    }
}

async fn init(ctx: MapContext, config: Config) {
    let client = match TransitClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("{e}");
            ctx.fail(LOAD_ERROR);
            return;
        }
    };

    let info = match client.fetch_info().await {
        Ok(info) => info,
        Err(e) => {
            error!("Failed to load service info: {e}");
            ctx.fail(LOAD_ERROR);
            return;
        }
    };

    if !info.has_active_service(Local::now().date_naive()) {
        warn!("{SERVICE_WARNING}");
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(SERVICE_WARNING);
        }
    }

    let session = new_session(&info, &config);
    let viewport = session.viewport();

    let on_popup = move |marker: MarkerId, open: bool| {
        spawn_local(async move {
            ctx.with_session(|s| s.set_stop_popup(&marker, open));
            ctx.sync();
        });
    };
    let mut surface = match LeafletSurface::new(
        MAP_CONTAINER,
        &config,
        viewport.center(),
        viewport.zoom,
        on_popup,
    ) {
        Ok(surface) => surface,
        Err(e) => {
            error!("Failed to create map: {e:?}");
            ctx.fail(LOAD_ERROR);
            return;
        }
    };
    surface.on_move_end(move || spawn_local(refresh(ctx)));

    let routes = match client.fetch_all_routes().await {
        Ok(routes) => routes,
        Err(e) => {
            error!("Failed to load routes: {e}");
            ctx.fail(LOAD_ERROR);
            return;
        }
    };

    ctx.session.set_value(Some(session));
    ctx.surface.set_value(Some(surface));
    ctx.client.set_value(Some(client));
    ctx.with_session(|s| s.set_routes(routes));

    refresh(ctx).await;
}

/// Reads the viewport from the map, fetches nearby stops when allowed and
/// syncs the UI.
async fn refresh(ctx: MapContext) {
    let viewport = ctx
        .surface
        .with_value(|surface| surface.as_ref().map(LeafletSurface::viewport));
    let ticket = ctx
        .with_session(|s| {
            if let Some(viewport) = viewport {
                s.set_viewport(viewport);
            }
            s.begin_nearby_refresh()
        })
        .flatten();
    ctx.sync();

    let (Some(ticket), Some(client)) = (ticket, ctx.client()) else {
        return;
    };
    match client.fetch_nearby_stops(&ticket.bounds, ticket.count).await {
        Ok(stops) => {
            ctx.with_session(|s| s.complete_nearby_refresh(&ticket, stops));
            ctx.sync();
        }
        Err(e) => error!("Failed to locate nearby stops: {e}"),
    }
}

async fn load_route(ctx: MapContext, ticket: RouteLoadTicket) {
    let Some(client) = ctx.client() else {
        return;
    };

    match client.fetch_route_stops(&ticket.route_id).await {
        Ok(stops) => {
            let geometry = client.fetch_route_geometry(&ticket.route_id).await;
            ctx.with_session(|s| s.complete_route_load(&ticket, stops, geometry));
            refresh(ctx).await;
        }
        Err(e) => {
            error!("Failed to load route {}: {e}", ticket.route_id);
            ctx.with_session(|s| s.fail_route_load(&ticket));
            ctx.sync();
        }
    }
}

#[component]
pub fn MapPage() -> impl IntoView {
    let config = use_context::<Config>().unwrap_or_default();
    let ctx = MapContext::new();
    let tab = RwSignal::new(Some(SidebarTab::Stops));

    Effect::new(move |_| {
        let config = config.clone();
        spawn_local(init(ctx, config));
    });

    let on_filter = move |filter: String| {
        ctx.with_session(|s| s.set_filter(filter));
        ctx.sync();
    };
    let on_show_nearby = move |on: bool| {
        ctx.with_session(|s| s.set_show_nearby_stops(on));
        spawn_local(refresh(ctx));
    };
    let on_show_route = move |on: bool| {
        ctx.with_session(|s| s.set_show_route_stops(on));
        ctx.sync();
    };
    let on_open = move |marker: MarkerId| {
        ctx.with_session(|s| s.open_stop(&marker));
        ctx.sync();
    };
    let on_hover = move |marker: MarkerId, on: bool| {
        ctx.with_session(|s| s.hover_stop(&marker, on));
        ctx.sync();
    };
    let on_toggle = move |index: usize, checked: bool| {
        let toggle = ctx.with_session(|s| s.toggle_route(index, checked));
        ctx.sync();
        if let Some(RouteToggle::Load(ticket)) = toggle {
            spawn_local(load_route(ctx, ticket));
        }
    };
    let on_clear = move || {
        ctx.with_session(Session::clear_routes);
        ctx.sync();
    };

    view! {
        <div id=MAP_CONTAINER tabindex="0"></div>
        <StopsSidebar
            open=Signal::derive(move || tab.get() == Some(SidebarTab::Stops))
            sidebar=ctx.sidebar
            toggles=ctx.toggles
            busy=ctx.busy
            on_filter=on_filter
            on_show_nearby=on_show_nearby
            on_show_route=on_show_route
            on_open=on_open
            on_hover=on_hover
        />
        <RoutesSidebar
            open=Signal::derive(move || tab.get() == Some(SidebarTab::Routes))
            routes=ctx.routes
            busy=ctx.busy
            on_toggle=on_toggle
            on_clear=on_clear
        />
        <Toolbar tab=tab location=ctx.location error=ctx.error/>
    }
}
