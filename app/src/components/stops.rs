use leptos::prelude::*;

use crate::components_impl::{color_indicator_style, sidebar_class};
use crate::entities::MarkerId;
use crate::reconcile::{SidebarEntry, SidebarView, Toggles};

#[component]
pub fn StopsSidebar(
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] sidebar: Signal<SidebarView>,
    #[prop(into)] toggles: Signal<Toggles>,
    #[prop(into)] busy: Signal<bool>,
    on_filter: impl Fn(String) + 'static + Copy,
    on_show_nearby: impl Fn(bool) + 'static + Copy,
    on_show_route: impl Fn(bool) + 'static + Copy,
    on_open: impl Fn(MarkerId) + 'static + Copy + Send + Sync,
    on_hover: impl Fn(MarkerId, bool) + 'static + Copy + Send + Sync,
) -> impl IntoView {
    view! {
        <div id="stops-sidebar" class=move || sidebar_class(busy.get()) class:hidden=move || !open.get()>
            <input
                id="filter-stops"
                type="text"
                placeholder="Filter stops"
                prop:disabled=move || busy.get()
                on:input=move |ev| on_filter(event_target_value(&ev))
            />
            <label>
                <input
                    id="show-nearby-stops"
                    type="checkbox"
                    prop:checked=move || toggles.get().show_nearby_stops
                    prop:disabled=move || busy.get()
                    on:input=move |ev| on_show_nearby(event_target_checked(&ev))
                />
                "Show nearby stops"
            </label>
            <label>
                <input
                    id="show-route-stops"
                    type="checkbox"
                    prop:checked=move || toggles.get().show_route_stops
                    prop:disabled=move || busy.get()
                    on:input=move |ev| on_show_route(event_target_checked(&ev))
                />
                "Show route stops"
            </label>
            <div id="stops-message">{move || sidebar.get().status}</div>
            <ul id="stops-list">
                {move || {
                    sidebar
                        .get()
                        .entries
                        .into_iter()
                        .map(|entry| view! { <StopItem entry=entry on_open=on_open on_hover=on_hover/> })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}

#[component]
fn StopItem(
    entry: SidebarEntry,
    on_open: impl Fn(MarkerId) + 'static + Copy + Send + Sync,
    on_hover: impl Fn(MarkerId, bool) + 'static + Copy + Send + Sync,
) -> impl IntoView {
    let marker = StoredValue::new(entry.marker);
    let style = color_indicator_style(&entry.color);

    view! {
        <li
            title="Click to View"
            on:click=move |_| on_open(marker.get_value())
            on:mouseenter=move |_| on_hover(marker.get_value(), true)
            on:mouseleave=move |_| on_hover(marker.get_value(), false)
        >
            <div class="color-indicator" style=style></div>
            {entry.name}
        </li>
    }
}
