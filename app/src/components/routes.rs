use leptos::prelude::*;

use crate::components_impl::{color_indicator_style, sidebar_class};
use crate::session::RouteListItem;

/// Route checkboxes. Inputs are disabled while a route is loading.
#[component]
pub fn RoutesSidebar(
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] routes: Signal<Vec<RouteListItem>>,
    #[prop(into)] busy: Signal<bool>,
    on_toggle: impl Fn(usize, bool) + 'static + Copy + Send + Sync,
    on_clear: impl Fn() + 'static + Copy,
) -> impl IntoView {
    view! {
        <div id="routes-sidebar" class=move || sidebar_class(busy.get()) class:hidden=move || !open.get()>
            <button id="clear-routes" prop:disabled=move || busy.get() on:click=move |_| on_clear()>
                "Clear Routes"
            </button>
            <ul id="routes-list">
                {move || {
                    routes
                        .get()
                        .into_iter()
                        .map(|item| {
                            let index = item.index;
                            let style = color_indicator_style(&item.color);
                            view! {
                                <li>
                                    <label title="Click to View">
                                        <input
                                            type="checkbox"
                                            prop:checked=item.checked
                                            prop:disabled=move || busy.get()
                                            on:input=move |ev| on_toggle(index, event_target_checked(&ev))
                                        />
                                        <div class="color-indicator" style=style></div>
                                        {item.name}
                                    </label>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}
