//! Recording fakes of the three ports, plus small fixtures.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};

use futures::channel::oneshot;
use traffic_shared::{
    ChatReply, ChatRequest, City, GeocodeResult, Incident, LatLon, Route, RouteQuery, TrafficFlow,
};

use crate::chat::ChatTurn;
use crate::error::ApiError;
use crate::incidents::TrafficStats;
use crate::ports::{
    Field, MapSurface, Overlay, OverlayHandle, Presentation, TileLayer, TrafficApi,
};
use crate::route::RouteSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Cities,
    Incidents(String),
    Geocode { query: String, city: String },
    Route(RouteQuery),
    Chat(ChatRequest),
}

type Script<T> = RefCell<VecDeque<Result<T, ApiError>>>;

/// Answers each endpoint from a queue of scripted responses. An endpoint
/// with nothing queued fails with a network error.
#[derive(Default)]
pub struct FakeApi {
    calls: RefCell<Vec<ApiCall>>,
    cities: Script<Vec<City>>,
    incidents: Script<Vec<Incident>>,
    geocode: Script<GeocodeResult>,
    route: Script<Route>,
    chat: Script<ChatReply>,
    chat_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.borrow().clone()
    }

    pub fn push_cities(&self, response: Result<Vec<City>, ApiError>) {
        self.cities.borrow_mut().push_back(response);
    }

    pub fn push_incidents(&self, response: Result<Vec<Incident>, ApiError>) {
        self.incidents.borrow_mut().push_back(response);
    }

    pub fn push_geocode(&self, response: Result<GeocodeResult, ApiError>) {
        self.geocode.borrow_mut().push_back(response);
    }

    pub fn push_route(&self, response: Result<Route, ApiError>) {
        self.route.borrow_mut().push_back(response);
    }

    pub fn push_chat(&self, response: Result<ChatReply, ApiError>) {
        self.chat.borrow_mut().push_back(response);
    }

    /// Hold the next chat request open until the returned sender fires.
    /// Gates are consumed in request order.
    pub fn hold_chat(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.chat_gates.borrow_mut().push_back(gate);
        release
    }

    fn record(&self, call: ApiCall) {
        self.calls.borrow_mut().push(call);
    }
}

fn next<T>(script: &Script<T>) -> Result<T, ApiError> {
    script
        .borrow_mut()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
}

impl TrafficApi for FakeApi {
    async fn cities(&self) -> Result<Vec<City>, ApiError> {
        self.record(ApiCall::Cities);
        next(&self.cities)
    }

    async fn incidents(&self, bbox: &str) -> Result<Vec<Incident>, ApiError> {
        self.record(ApiCall::Incidents(bbox.to_string()));
        next(&self.incidents)
    }

    async fn geocode(&self, query: &str, city_context: &str) -> Result<GeocodeResult, ApiError> {
        self.record(ApiCall::Geocode {
            query: query.to_string(),
            city: city_context.to_string(),
        });
        next(&self.geocode)
    }

    async fn route(&self, query: &RouteQuery) -> Result<Route, ApiError> {
        self.record(ApiCall::Route(*query));
        next(&self.route)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.record(ApiCall::Chat(request.clone()));
        let gate = self.chat_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        next(&self.chat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    SetView(LatLon, u8),
    FitBounds(usize),
    AddTile(TileLayer),
    RemoveTile(TileLayer),
    Add(OverlayHandle),
    Remove(OverlayHandle),
    OpenPopup(OverlayHandle),
}

/// Keeps the set of live overlays and tile layers, and a log of every call.
#[derive(Default)]
pub struct FakeMap {
    ops: RefCell<Vec<MapOp>>,
    live: RefCell<BTreeMap<OverlayHandle, Overlay>>,
    tiles: RefCell<Vec<TileLayer>>,
    next_id: Cell<u64>,
}

impl FakeMap {
    pub fn ops(&self) -> Vec<MapOp> {
        self.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn live_overlay(&self, handle: OverlayHandle) -> Option<Overlay> {
        self.live.borrow().get(&handle).cloned()
    }

    pub fn live_overlays(&self) -> Vec<Overlay> {
        self.live.borrow().values().cloned().collect()
    }

    pub fn tiles(&self) -> Vec<TileLayer> {
        self.tiles.borrow().clone()
    }
}

impl MapSurface for FakeMap {
    fn set_view(&self, center: LatLon, zoom: u8) {
        self.ops.borrow_mut().push(MapOp::SetView(center, zoom));
    }

    fn fit_bounds(&self, points: &[LatLon], _padding_px: f64) {
        self.ops.borrow_mut().push(MapOp::FitBounds(points.len()));
    }

    fn add_tile_layer(&self, layer: TileLayer) {
        self.ops.borrow_mut().push(MapOp::AddTile(layer));
        let mut tiles = self.tiles.borrow_mut();
        if !tiles.contains(&layer) {
            tiles.push(layer);
        }
    }

    fn remove_tile_layer(&self, layer: TileLayer) {
        self.ops.borrow_mut().push(MapOp::RemoveTile(layer));
        self.tiles.borrow_mut().retain(|active| *active != layer);
    }

    fn add_overlay(&self, overlay: &Overlay) -> OverlayHandle {
        let handle = OverlayHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.live.borrow_mut().insert(handle, overlay.clone());
        self.ops.borrow_mut().push(MapOp::Add(handle));
        handle
    }

    fn remove_overlay(&self, handle: OverlayHandle) {
        self.live.borrow_mut().remove(&handle);
        self.ops.borrow_mut().push(MapOp::Remove(handle));
    }

    fn open_popup(&self, handle: OverlayHandle) {
        self.ops.borrow_mut().push(MapOp::OpenPopup(handle));
    }
}

#[derive(Default)]
pub struct FakePresentation {
    fields: RefCell<HashMap<Field, String>>,
    avoid_traffic: Cell<bool>,
    notices: RefCell<Vec<String>>,
    turns: RefCell<Vec<ChatTurn>>,
    typing: Cell<bool>,
    typing_shown: Cell<u32>,
    stats: RefCell<Option<TrafficStats>>,
    incidents: RefCell<Vec<Incident>>,
    route_summary: RefCell<Option<RouteSummary>>,
    cities: RefCell<Vec<City>>,
}

impl FakePresentation {
    pub fn set_avoid_traffic(&self, avoid: bool) {
        self.avoid_traffic.set(avoid);
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }

    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.borrow().clone()
    }

    pub fn typing(&self) -> bool {
        self.typing.get()
    }

    pub fn typing_shown(&self) -> u32 {
        self.typing_shown.get()
    }

    pub fn stats(&self) -> Option<TrafficStats> {
        self.stats.borrow().clone()
    }

    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.borrow().clone()
    }

    pub fn route_summary(&self) -> Option<RouteSummary> {
        self.route_summary.borrow().clone()
    }

    pub fn cities(&self) -> Vec<City> {
        self.cities.borrow().clone()
    }
}

impl Presentation for FakePresentation {
    fn field(&self, field: Field) -> String {
        self.fields.borrow().get(&field).cloned().unwrap_or_default()
    }

    fn set_field(&self, field: Field, value: &str) {
        self.fields.borrow_mut().insert(field, value.to_string());
    }

    fn avoid_traffic(&self) -> bool {
        self.avoid_traffic.get()
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }

    fn append_turn(&self, turn: &ChatTurn) {
        self.turns.borrow_mut().push(turn.clone());
    }

    fn set_typing(&self, visible: bool) {
        if visible && !self.typing.get() {
            self.typing_shown.set(self.typing_shown.get() + 1);
        }
        self.typing.set(visible);
    }

    fn show_stats(&self, stats: &TrafficStats) {
        *self.stats.borrow_mut() = Some(stats.clone());
    }

    fn show_incidents(&self, incidents: &[Incident]) {
        *self.incidents.borrow_mut() = incidents.to_vec();
    }

    fn show_route_summary(&self, summary: Option<&RouteSummary>) {
        *self.route_summary.borrow_mut() = summary.cloned();
    }

    fn set_cities(&self, cities: &[City]) {
        *self.cities.borrow_mut() = cities.to_vec();
    }
}

pub fn city(name: &str, bbox: &str) -> City {
    City {
        name: name.to_string(),
        latitude: 48.8566,
        longitude: 2.3522,
        bbox: bbox.to_string(),
    }
}

pub fn incident(severity: u8, delay_minutes: f64) -> Incident {
    Incident {
        latitude: 48.86,
        longitude: 2.35,
        severity,
        description: format!("Severity {severity} incident"),
        kind: None,
        road_name: Some("Rue de Rivoli".into()),
        start_time: Some("08:00".into()),
        end_time: None,
        delay_minutes,
        length_meters: 400.0,
    }
}

pub fn flow(congestion_percent: f64) -> TrafficFlow {
    TrafficFlow {
        latitude: 48.87,
        longitude: 2.33,
        current_speed: 30.0,
        free_flow_speed: Some(50.0),
        confidence: Some(0.8),
        congestion_percent,
        road_name: None,
    }
}

pub fn route(points: usize) -> Route {
    Route {
        coordinates: (0..points)
            .map(|i| LatLon::new(48.85 + i as f64 * 0.01, 2.35))
            .collect(),
        distance_meters: 12_345.0,
        duration_seconds: 1_530.0,
        ..Route::default()
    }
}
