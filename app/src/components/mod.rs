use leptos::prelude::*;

use crate::components_impl::{SidebarTab, tab_class, toggle_tab};

pub mod routes;
pub mod schedule;
pub mod stops;

/// Bottom toolbar: sidebar tabs, the error line and the map location.
#[component]
pub fn Toolbar(
    tab: RwSignal<Option<SidebarTab>>,
    #[prop(into)] location: Signal<String>,
    #[prop(into)] error: Signal<Option<String>>,
) -> impl IntoView {
    let is_open = move |t: SidebarTab| tab.get() == Some(t);

    view! {
        <div id="toolbar">
            <button
                id="toggle-stops"
                class=move || tab_class(is_open(SidebarTab::Stops))
                on:click=move |_| tab.update(|t| *t = toggle_tab(*t, SidebarTab::Stops))
            >
                "Stops"
            </button>
            <button
                id="toggle-routes"
                class=move || tab_class(is_open(SidebarTab::Routes))
                on:click=move |_| tab.update(|t| *t = toggle_tab(*t, SidebarTab::Routes))
            >
                "Routes"
            </button>
            <span id="error">{move || error.get().unwrap_or_default()}</span>
            <span id="status-lat-lon-zoom">{move || location.get()}</span>
        </div>
    }
}
