use chrono::Local;
use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::client::TransitClient;
use crate::components_impl::{schedule_row_class, schedule_row_title};
use crate::config::Config;
use crate::schedule::{
    ScheduleQuery, ScheduleRequests, ScheduleTable, format_date, load_schedule, parse_date,
};

/// Arrivals for one stop and day, driven by `?stop=&date=`.
#[component]
pub fn SchedulePage() -> impl IntoView {
    let config = use_context::<Config>().unwrap_or_default();
    let params = use_query_map();
    let navigate = use_navigate();

    let query = Memo::new(move |_| {
        let params = params.get();
        ScheduleQuery::from_pairs([
            ("stop", params.get("stop").unwrap_or_default()),
            ("date", params.get("date").unwrap_or_default()),
        ])
        .map_err(|e| e.to_string())
    });

    let requests = StoredValue::new(ScheduleRequests::default());
    let loading = RwSignal::new(false);

    let schedule = LocalResource::new(move || {
        let query = query.get();
        let config = config.clone();
        async move {
            let query = query?;
            let ticket = requests.try_update_value(ScheduleRequests::begin);
            loading.set(true);

            let now = Local::now().naive_local();
            let result = match TransitClient::new(&config) {
                Ok(client) => load_schedule(&client, &query, now).await,
                Err(e) => Err(e),
            };

            let current = ticket
                .and_then(|t| requests.try_update_value(|r| r.finish(t)))
                .unwrap_or(false);
            if current {
                loading.set(false);
            }
            result.map_err(|e| e.to_string())
        }
    });

    let go = move |days: Option<i64>, date: Option<String>| {
        let Ok(current) = query.get_untracked() else {
            return;
        };
        let today = Local::now().date_naive();
        let next = match (days, date) {
            (Some(days), _) => current.shifted(today, days),
            (None, Some(date)) => match parse_date(&date) {
                Ok(date) => current.with_date(date),
                Err(_) => return,
            },
            (None, None) => return,
        };
        navigate(&format!("/schedule?{}", next.to_query_string()), Default::default());
    };
    let go = StoredValue::new_local(go);

    let title = move || {
        schedule
            .get()
            .and_then(Result::ok)
            .map_or_else(|| "Arrivals".to_string(), |table| table.title)
    };
    let date_value = move || {
        let today = Local::now().date_naive();
        query
            .get()
            .map(|q| format_date(q.resolved_date(today)))
            .unwrap_or_default()
    };

    view! {
        <Title text=title/>
        <div id="schedule">
            <h1 id="schedule-title">
                {move || schedule.get().and_then(Result::ok).map(|t| t.stop.full_name())}
            </h1>
            <div id="schedule-controls">
                <button
                    id="schedule-prev"
                    prop:disabled=move || loading.get()
                    on:click=move |_| go.with_value(|go| go(Some(-1), None))
                >
                    "Previous Day"
                </button>
                <input
                    id="schedule-date"
                    type="date"
                    prop:value=date_value
                    prop:disabled=move || loading.get()
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        go.with_value(|go| go(None, Some(value)));
                    }
                />
                <button
                    id="schedule-next"
                    prop:disabled=move || loading.get()
                    on:click=move |_| go.with_value(|go| go(Some(1), None))
                >
                    "Next Day"
                </button>
            </div>
            <Suspense fallback=|| view! { <p class="loading">"Loading schedule..."</p> }>
                {move || {
                    schedule
                        .get()
                        .map(|result| match result {
                            Ok(table) => view! { <ScheduleTableView table=table/> }.into_any(),
                            Err(e) => view! { <p class="error">"Error: " {e}</p> }.into_any(),
                        })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn ScheduleTableView(table: ScheduleTable) -> impl IntoView {
    view! {
        <table id="schedule-table">
            <tr>
                <th>"No."</th>
                <th>"Time"</th>
                <th>"Route"</th>
                <th>"Headsign"</th>
            </tr>
            {table
                .rows
                .into_iter()
                .map(|row| {
                    let class = schedule_row_class(&row);
                    let title = schedule_row_title(&row);
                    view! {
                        <tr class=class title=title>
                            <td>{row.number}</td>
                            <td>{row.time}</td>
                            <td>{row.route}</td>
                            <td>{row.headsign}</td>
                        </tr>
                    }
                })
                .collect_view()}
        </table>
    }
}
