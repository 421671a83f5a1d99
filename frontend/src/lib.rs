#![recursion_limit = "256"]

mod leaflet;
mod map_page;

use app::components::schedule::SchedulePage;
use app::config::Config;
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};
use wasm_bindgen::prelude::wasm_bindgen;

use crate::map_page::MapPage;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_context(Config::default());

    view! {
        <Title text="Transit Viewer"/>

        <Router>
            <Routes fallback=|| "Page not found.">
                <Route path=StaticSegment("") view=MapPage/>
                <Route path=StaticSegment("schedule") view=SchedulePage/>
            </Routes>
        </Router>
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    #[allow(clippy::expect_used)]
    console_log::init_with_level(log::Level::Debug).expect("error initializing logger");

    mount_to_body(App);
}
