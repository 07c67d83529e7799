use std::future::Future;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use traffic_shared::{City, Incident, SeverityTier};

use crate::chat::{ChatTurn, Role};
use crate::config::ClientConfig;
use crate::dashboard::Dashboard;
use crate::http::HttpTrafficApi;
use crate::incidents::TrafficStats;
use crate::leaflet::LeafletMap;
use crate::ports::{Field, Presentation};
use crate::refresh;
use crate::route::RouteSummary;
use crate::session::SessionToken;
use crate::viewport::BaseLayer;

type WebDashboard = Dashboard<HttpTrafficApi, LeafletMap, SignalPresentation>;

/// The dashboard, once the map container has mounted.
#[derive(Clone, Copy)]
struct DashboardStore(StoredValue<Option<WebDashboard>, LocalStorage>);

impl DashboardStore {
    /// Run a synchronous operation if the dashboard exists.
    fn with(self, op: impl FnOnce(&WebDashboard)) {
        self.0.with_value(|dashboard| {
            if let Some(dashboard) = dashboard {
                op(dashboard);
            }
        });
    }

    /// Spawn an async operation if the dashboard exists.
    fn spawn<F, Fut>(self, op: F)
    where
        F: FnOnce(WebDashboard) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        if let Some(dashboard) = self.0.get_value() {
            spawn_local(op(dashboard));
        }
    }
}

/// [`Presentation`] over reactive signals. The view below renders them.
#[derive(Clone, Copy)]
pub struct SignalPresentation {
    start: RwSignal<String>,
    end: RwSignal<String>,
    city: RwSignal<String>,
    search: RwSignal<String>,
    chat_input: RwSignal<String>,
    avoid_traffic: RwSignal<bool>,
    turns: RwSignal<Vec<ChatTurn>>,
    typing: RwSignal<bool>,
    stats: RwSignal<Option<TrafficStats>>,
    incidents: RwSignal<Vec<Incident>>,
    route_summary: RwSignal<Option<RouteSummary>>,
    cities: RwSignal<Vec<City>>,
}

impl SignalPresentation {
    fn new() -> Self {
        Self {
            start: RwSignal::new(String::new()),
            end: RwSignal::new(String::new()),
            city: RwSignal::new(String::new()),
            search: RwSignal::new(String::new()),
            chat_input: RwSignal::new(String::new()),
            avoid_traffic: RwSignal::new(false),
            turns: RwSignal::new(Vec::new()),
            typing: RwSignal::new(false),
            stats: RwSignal::new(None),
            incidents: RwSignal::new(Vec::new()),
            route_summary: RwSignal::new(None),
            cities: RwSignal::new(Vec::new()),
        }
    }

    fn text(&self, field: Field) -> RwSignal<String> {
        match field {
            Field::StartLocation => self.start,
            Field::EndLocation => self.end,
            Field::CitySelect => self.city,
            Field::SearchQuery => self.search,
            Field::ChatInput => self.chat_input,
        }
    }
}

impl Presentation for SignalPresentation {
    fn field(&self, field: Field) -> String {
        self.text(field).get_untracked()
    }

    fn set_field(&self, field: Field, value: &str) {
        self.text(field).set(value.to_string());
    }

    fn avoid_traffic(&self) -> bool {
        self.avoid_traffic.get_untracked()
    }

    fn notify(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn append_turn(&self, turn: &ChatTurn) {
        self.turns.update(|turns| turns.push(turn.clone()));
    }

    fn set_typing(&self, visible: bool) {
        self.typing.set(visible);
    }

    fn show_stats(&self, stats: &TrafficStats) {
        self.stats.set(Some(stats.clone()));
    }

    fn show_incidents(&self, incidents: &[Incident]) {
        self.incidents.set(incidents.to_vec());
    }

    fn show_route_summary(&self, summary: Option<&RouteSummary>) {
        self.route_summary.set(summary.cloned());
    }

    fn set_cities(&self, cities: &[City]) {
        self.cities.set(cities.to_vec());
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = ClientConfig::from_location();
    let ui = SignalPresentation::new();
    let store = DashboardStore(StoredValue::new_local(None));
    provide_context(ui);
    provide_context(store);

    let map_ref = NodeRef::<leptos::html::Div>::new();

    // Build the controller once the map container exists.
    Effect::new(move || {
        let Some(container) = map_ref.get() else {
            return;
        };
        if store.0.with_value(Option::is_some) {
            return;
        }
        let map = match LeafletMap::new(&container) {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(error = %e, "map unavailable");
                return;
            }
        };
        map.on_click(move |position| {
            store.with(|dashboard| {
                dashboard.map_click(position);
            });
        });

        let dashboard = Dashboard::new(
            HttpTrafficApi::new(config.api_base.clone()),
            map,
            ui,
            SessionToken::generate(),
        );
        dashboard.start();
        refresh::start(dashboard.clone(), config.refresh_interval_ms);
        let loader = dashboard.clone();
        spawn_local(async move { loader.load_cities().await });
        store.0.set_value(Some(dashboard));
    });

    view! {
        <div class="dashboard" style="display: flex; height: 100vh; font-family: system-ui, sans-serif;">
            <aside style="width: 360px; overflow-y: auto; padding: 16px; box-sizing: border-box; border-right: 1px solid #ddd;">
                <h1 style="font-size: 1.3rem; margin: 0 0 12px;">"Live Traffic"</h1>
                <CityPicker />
                <LayerPicker />
                <LocationSearch />
                <RoutePanel />
                <StatsPanel />
                <IncidentList />
            </aside>
            <main style="flex: 1; position: relative;">
                <div node_ref=map_ref id="map" style="position: absolute; inset: 0;"></div>
            </main>
            <ChatPanel />
        </div>
    }
}

#[component]
fn CityPicker() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();
    let store = expect_context::<DashboardStore>();

    let on_change = move |ev: leptos::ev::Event| {
        let name = event_target_value(&ev);
        ui.city.set(name.clone());
        store.spawn(|dashboard| async move { dashboard.change_city(&name).await });
    };

    view! {
        <label class="field">
            "City"
            <select prop:value=move || ui.city.get() on:change=on_change>
                <option value="">"Select a city..."</option>
                {move || {
                    ui.cities
                        .get()
                        .into_iter()
                        .map(|city| {
                            let label = city.name.clone();
                            view! { <option value=city.name>{label}</option> }
                        })
                        .collect_view()
                }}
            </select>
        </label>
    }
}

#[component]
fn LayerPicker() -> impl IntoView {
    let store = expect_context::<DashboardStore>();

    let on_change = move |ev: leptos::ev::Event| {
        if let Some(base) = BaseLayer::from_key(&event_target_value(&ev)) {
            store.with(|dashboard| dashboard.switch_base_layer(base));
        }
    };

    view! {
        <label class="field">
            "Map style"
            <select on:change=on_change>
                {BaseLayer::ALL
                    .into_iter()
                    .map(|base| view! { <option value=base.key()>{base.label()}</option> })
                    .collect_view()}
            </select>
        </label>
    }
}

#[component]
fn LocationSearch() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();
    let store = expect_context::<DashboardStore>();

    let search = move || store.spawn(|dashboard| async move { dashboard.search_location().await });
    let set_start = move |_: leptos::ev::MouseEvent| {
        store.with(|dashboard| {
            if let Some(position) = dashboard.search_hit_position() {
                dashboard.set_as_start(position);
            }
        })
    };
    let set_end = move |_: leptos::ev::MouseEvent| {
        store.with(|dashboard| {
            if let Some(position) = dashboard.search_hit_position() {
                dashboard.set_as_end(position);
            }
        })
    };

    view! {
        <section class="panel">
            <h2>"Search"</h2>
            <input
                type="text"
                placeholder="Search for a place..."
                prop:value=move || ui.search.get()
                on:input=move |ev| ui.search.set(event_target_value(&ev))
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    if ev.key() == "Enter" {
                        search();
                    }
                }
            />
            <button on:click=move |_| search()>"Search"</button>
            <div class="row">
                <button on:click=set_start>"Set as Start"</button>
                <button on:click=set_end>"Set as End"</button>
            </div>
        </section>
    }
}

#[component]
fn RoutePanel() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();
    let store = expect_context::<DashboardStore>();

    let calculate = move |_: leptos::ev::MouseEvent| {
        store.spawn(|dashboard| async move { dashboard.calculate_route().await })
    };
    let clear = move |_: leptos::ev::MouseEvent| store.with(|dashboard| dashboard.clear_route());

    view! {
        <section class="panel">
            <h2>"Route"</h2>
            <input
                type="text"
                placeholder="Start (lat, lon) or click the map"
                prop:value=move || ui.start.get()
                on:input=move |ev| ui.start.set(event_target_value(&ev))
            />
            <input
                type="text"
                placeholder="End (lat, lon) or click the map"
                prop:value=move || ui.end.get()
                on:input=move |ev| ui.end.set(event_target_value(&ev))
            />
            <label>
                <input
                    type="checkbox"
                    prop:checked=move || ui.avoid_traffic.get()
                    on:change=move |ev| ui.avoid_traffic.set(event_target_checked(&ev))
                />
                " Avoid traffic"
            </label>
            <div class="row">
                <button on:click=calculate>"Calculate Route"</button>
                <button on:click=clear>"Clear"</button>
            </div>
            {move || {
                ui.route_summary
                    .get()
                    .map(|summary| {
                        view! {
                            <div class="route-info">
                                <div>"Distance: " {summary.distance_label()}</div>
                                <div>"Duration: " {summary.duration_label()}</div>
                                {summary
                                    .traffic_label()
                                    .map(|traffic| view! { <div>"Traffic: " {traffic}</div> })}
                                {summary
                                    .banner_text()
                                    .map(|banner| view! { <div class="route-banner">{banner}</div> })}
                            </div>
                        }
                    })
            }}
        </section>
    }
}

#[component]
fn StatsPanel() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();

    view! {
        <section class="panel stats">
            {move || {
                let stats = ui.stats.get().unwrap_or_else(|| TrafficStats::from_incidents(&[]));
                view! {
                    <div>"Incidents: " {stats.incident_count}</div>
                    <div>"Avg speed: " {stats.speed_label()}</div>
                    <div>"Congestion: " {stats.condition.label()}</div>
                }
            }}
        </section>
    }
}

#[component]
fn IncidentList() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();

    view! {
        <section class="panel">
            <h2>"Incidents"</h2>
            {move || {
                let incidents = ui.incidents.get();
                if incidents.is_empty() {
                    return view! { <p class="muted">"No incidents reported"</p> }.into_any();
                }
                incidents
                    .into_iter()
                    .map(|incident| {
                        let severity = incident.display_severity();
                        let color = SeverityTier::from_severity(severity).color();
                        view! {
                            <div
                                class="incident"
                                style=format!("border-left: 4px solid {color}; padding-left: 8px; margin-bottom: 8px;")
                            >
                                <strong>{incident.description.clone()}</strong>
                                <div class="muted">
                                    {incident.road_name.clone().unwrap_or_else(|| "Unknown Road".into())}
                                </div>
                                <div class="muted">
                                    {format!("Delay: {} min · Severity {severity}/4", incident.delay_minutes)}
                                </div>
                            </div>
                        }
                    })
                    .collect_view()
                    .into_any()
            }}
        </section>
    }
}

#[component]
fn ChatPanel() -> impl IntoView {
    let ui = expect_context::<SignalPresentation>();
    let store = expect_context::<DashboardStore>();

    let send = move || store.spawn(|dashboard| async move { dashboard.send_chat().await });

    view! {
        <aside style="width: 340px; display: flex; flex-direction: column; border-left: 1px solid #ddd;">
            <h2 style="margin: 12px;">"Traffic Assistant"</h2>
            <div class="chat-messages" style="flex: 1; overflow-y: auto; padding: 0 12px;">
                {move || {
                    ui.turns
                        .get()
                        .into_iter()
                        .map(|turn| {
                            let class = match turn.role {
                                Role::User => "chat-message user",
                                Role::Assistant => "chat-message ai",
                            };
                            view! {
                                <div class=class>
                                    <div class="chat-bubble" style="white-space: pre-line;">{turn.text}</div>
                                </div>
                            }
                        })
                        .collect_view()
                }}
                <Show when=move || ui.typing.get()>
                    <div class="chat-message ai">
                        <div class="chat-bubble pulse">"Typing..."</div>
                    </div>
                </Show>
            </div>
            <div class="row" style="padding: 12px;">
                <input
                    type="text"
                    placeholder="Ask about traffic..."
                    prop:value=move || ui.chat_input.get()
                    on:input=move |ev| ui.chat_input.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            send();
                        }
                    }
                />
                <button on:click=move |_| send()>"Send"</button>
            </div>
        </aside>
    }
}
