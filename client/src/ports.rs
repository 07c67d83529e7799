//! Seams between the controller and the world: the traffic API, the map
//! surface and the presentation layer. Browser implementations live in
//! `http`, `leaflet` and `app`; tests use the recording fakes in `testing`.

use traffic_shared::{ChatReply, ChatRequest, City, GeocodeResult, Incident, LatLon, Route, RouteQuery};

use crate::chat::ChatTurn;
use crate::error::ApiError;
use crate::incidents::TrafficStats;
use crate::route::RouteSummary;

/// Remote traffic service. Futures run on the page's single thread.
#[allow(async_fn_in_trait)]
pub trait TrafficApi {
    async fn cities(&self) -> Result<Vec<City>, ApiError>;
    async fn incidents(&self, bbox: &str) -> Result<Vec<Incident>, ApiError>;
    async fn geocode(&self, query: &str, city_context: &str) -> Result<GeocodeResult, ApiError>;
    async fn route(&self, query: &RouteQuery) -> Result<Route, ApiError>;
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;
}

/// Opaque reference to an overlay installed on a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(pub u64);

/// Every tile layer the viewport can put on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayer {
    Streets,
    Satellite,
    Hybrid,
    /// Semi-transparent street labels drawn over the hybrid imagery.
    HybridLabels,
}

impl TileLayer {
    pub const ALL: [TileLayer; 4] = [
        TileLayer::Streets,
        TileLayer::Satellite,
        TileLayer::Hybrid,
        TileLayer::HybridLabels,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinIcon {
    Start,
    End,
    Search,
}

/// Drawing instructions for one overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Pin {
        position: LatLon,
        icon: PinIcon,
        popup: Option<String>,
    },
    Circle {
        position: LatLon,
        radius: f64,
        fill_color: &'static str,
        fill_opacity: f64,
        popup: Option<String>,
    },
    Polyline {
        points: Vec<LatLon>,
        color: &'static str,
        weight: f64,
        opacity: f64,
        popup: Option<String>,
    },
}

/// The rendering library, reduced to what the controller needs.
pub trait MapSurface {
    fn set_view(&self, center: LatLon, zoom: u8);
    fn fit_bounds(&self, points: &[LatLon], padding_px: f64);
    fn add_tile_layer(&self, layer: TileLayer);
    fn remove_tile_layer(&self, layer: TileLayer);
    fn add_overlay(&self, overlay: &Overlay) -> OverlayHandle;
    fn remove_overlay(&self, handle: OverlayHandle);
    fn open_popup(&self, handle: OverlayHandle);
}

/// Named text fields the controller reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StartLocation,
    EndLocation,
    CitySelect,
    SearchQuery,
    ChatInput,
}

/// Widgets and panels. The controller never looks past these calls.
pub trait Presentation {
    fn field(&self, field: Field) -> String;
    fn set_field(&self, field: Field, value: &str);
    fn avoid_traffic(&self) -> bool;
    /// Blocking notice (an alert in the browser).
    fn notify(&self, message: &str);
    /// Append to the message log.
    fn append_turn(&self, turn: &ChatTurn);
    fn set_typing(&self, visible: bool);
    fn show_stats(&self, stats: &TrafficStats);
    fn show_incidents(&self, incidents: &[Incident]);
    /// `None` resets the route panel.
    fn show_route_summary(&self, summary: Option<&RouteSummary>);
    fn set_cities(&self, cities: &[City]);
}
