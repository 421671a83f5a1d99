//! Leaflet bindings and the map surface that applies [`MapCommand`]s.

use std::collections::HashMap;
use std::rc::Rc;

use app::components_impl::{marker_html, marker_outer_class, route_popup_html, stop_popup_html};
use app::config::Config;
use app::entities::{MarkerId, Route, Stop};
use app::geo::{Bounds, LatLng, Viewport};
use app::session::{MapCommand, Session};
use serde_json::{Value, json};
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;

#[wasm_bindgen]
extern "C" {
    pub type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn leaflet_map(container: &str, options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &Map, center: &JsValue, zoom: u8) -> Map;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &Map) -> LatLngBounds;

    #[wasm_bindgen(method, js_name = flyToBounds)]
    fn fly_to_bounds(this: &Map, bounds: &JsValue);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &Map, layer: &Layer);

    #[wasm_bindgen(method, js_name = on)]
    fn on_map(this: &Map, event: &str, handler: &Closure<dyn FnMut()>);

    type LatLngBounds;

    #[wasm_bindgen(method, js_name = getSouth)]
    fn get_south(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getWest)]
    fn get_west(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getNorth)]
    fn get_north(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(method, js_name = getEast)]
    fn get_east(this: &LatLngBounds) -> f64;

    #[derive(Clone)]
    pub type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn leaflet_marker(latlng: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = L, js_name = geoJSON)]
    fn geo_json(data: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url_template: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map) -> Layer;

    #[wasm_bindgen(method)]
    fn remove(this: &Layer);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &Layer);

    #[wasm_bindgen(method, js_name = setIcon)]
    fn set_icon(this: &Layer, icon: &JsValue);

    #[wasm_bindgen(method, js_name = on)]
    fn on_layer(this: &Layer, event: &str, handler: &Closure<dyn FnMut()>);

    #[wasm_bindgen(catch, js_namespace = JSON, js_name = parse)]
    fn json_parse(text: &str) -> Result<JsValue, JsValue>;
}

fn js(value: &Value) -> JsValue {
    json_parse(&value.to_string()).unwrap_or(JsValue::UNDEFINED)
}

fn latlng(p: LatLng) -> JsValue {
    js(&json!([p.lat, p.lng]))
}

fn icon(stop: &Stop) -> JsValue {
    div_icon(&js(&json!({
        "className": marker_outer_class(stop.is_highlighted()),
        "html": marker_html(stop),
    })))
}

type PopupHandler = Rc<dyn Fn(MarkerId, bool)>;

/// The Leaflet map plus every layer created for it. Layers are created on
/// first show and kept for later.
pub struct LeafletSurface {
    map: Map,
    markers: HashMap<MarkerId, Layer>,
    routes: HashMap<String, Layer>,
    on_popup: PopupHandler,
    handlers: Vec<Closure<dyn FnMut()>>,
}

impl LeafletSurface {
    /// `on_popup` is told when a stop popup opens or closes on the map.
    pub fn new(
        container: &str,
        config: &Config,
        center: LatLng,
        zoom: u8,
        on_popup: impl Fn(MarkerId, bool) + 'static,
    ) -> Result<Self, JsValue> {
        let options = json!({
            "closeOnClick": true,
            "fadeAnimation": false,
            "markerZoomAnimation": false,
        });
        let map = leaflet_map(container, &js(&options))?;
        map.set_view(&latlng(center), zoom);

        tile_layer(
            &config.tiles.servers,
            &js(&json!({
                "maxZoom": 19,
                "attribution": config.tile_attribution(),
            })),
        )
        .add_to(&map);

        Ok(Self {
            map,
            markers: HashMap::new(),
            routes: HashMap::new(),
            on_popup: Rc::new(on_popup),
            handlers: Vec::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        let b = self.map.get_bounds();
        Viewport::new(
            Bounds::new(
                LatLng::new(b.get_south(), b.get_west()),
                LatLng::new(b.get_north(), b.get_east()),
            ),
            self.map.get_zoom().round().clamp(0.0, 30.0) as u8,
        )
    }

    /// Runs `f` after every pan or zoom.
    pub fn on_move_end(&mut self, f: impl FnMut() + 'static) {
        let handler = Closure::<dyn FnMut()>::new(f);
        self.map.on_map("moveend", &handler);
        self.handlers.push(handler);
    }

    pub fn apply(&mut self, session: &Session, commands: Vec<MapCommand>) {
        for command in commands {
            match command {
                MapCommand::ShowMarker(marker) => {
                    if let Some(layer) = self.marker(session, &marker) {
                        self.map.add_layer(&layer);
                    }
                }
                MapCommand::HideMarker(marker) => {
                    if let Some(layer) = self.markers.get(&marker) {
                        layer.remove();
                    }
                }
                MapCommand::SetInactive { marker, .. } | MapCommand::Highlight { marker, .. } => {
                    if let (Some(layer), Some(stop)) =
                        (self.markers.get(&marker), session.find_stop(&marker))
                    {
                        layer.set_icon(&icon(stop));
                    }
                }
                MapCommand::OpenStopPopup(marker) => {
                    if let Some(layer) = self.markers.get(&marker) {
                        layer.open_popup();
                    }
                }
                MapCommand::ShowRoute(route_id) => {
                    if let Some(layer) = self.route(session, &route_id) {
                        self.map.add_layer(&layer);
                    }
                }
                MapCommand::HideRoute(route_id) => {
                    if let Some(layer) = self.routes.get(&route_id) {
                        layer.remove();
                    }
                }
                MapCommand::OpenRoutePopup(route_id) => {
                    if let Some(layer) = self.routes.get(&route_id) {
                        layer.open_popup();
                    }
                }
                MapCommand::FlyToBounds(b) => {
                    let sw = b.south_west;
                    let ne = b.north_east;
                    self.map
                        .fly_to_bounds(&js(&json!([[sw.lat, sw.lng], [ne.lat, ne.lng]])));
                }
            }
        }
    }

    fn marker(&mut self, session: &Session, marker: &MarkerId) -> Option<Layer> {
        if !self.markers.contains_key(marker) {
            let stop = session.find_stop(marker)?;
            let layer = self.create_marker(stop);
            self.markers.insert(marker.clone(), layer);
        }
        self.markers.get(marker).cloned()
    }

    fn create_marker(&mut self, stop: &Stop) -> Layer {
        let layer = leaflet_marker(&latlng(stop.position()));
        layer.set_icon(&icon(stop));
        layer.bind_popup(&stop_popup_html(stop.record()), &js(&json!({ "autoPan": true })));

        for (event, open) in [("popupopen", true), ("popupclose", false)] {
            let id = stop.marker_id();
            let on_popup = Rc::clone(&self.on_popup);
            let handler = Closure::<dyn FnMut()>::new(move || on_popup(id.clone(), open));
            layer.on_layer(event, &handler);
            self.handlers.push(handler);
        }
        layer
    }

    fn route(&mut self, session: &Session, route_id: &str) -> Option<Layer> {
        if !self.routes.contains_key(route_id) {
            let route = session.route(route_id)?;
            let layer = create_route_layer(route)?;
            self.routes.insert(route_id.to_string(), layer);
        }
        self.routes.get(route_id).cloned()
    }
}

fn create_route_layer(route: &Route) -> Option<Layer> {
    let geometry = route.geometry()?;
    let data = json_parse(&geometry.geojson.to_string()).ok()?;
    let options = json!({ "style": { "color": route.color(), "weight": 6 } });
    let layer = geo_json(&data, &js(&options));
    layer.bind_popup(&route_popup_html(route), &JsValue::UNDEFINED);
    Some(layer)
}
