use traffic_shared::{City, TrafficFlow};

use crate::chat::ChatSession;
use crate::incidents::IncidentOverlay;
use crate::picker::LocationPicker;
use crate::route::RouteOverlay;
use crate::session::SessionToken;
use crate::viewport::MapViewport;

/// Everything the dashboard mutates, in one place.
#[derive(Debug)]
pub struct AppState {
    pub session: SessionToken,
    pub viewport: MapViewport,
    pub cities: Vec<City>,
    pub current_city: Option<City>,
    pub picker: LocationPicker,
    pub incidents: IncidentOverlay,
    pub route: RouteOverlay,
    pub chat: ChatSession,
    /// Flow samples sent to the assistant as context. Nothing fills this yet.
    pub flows: Vec<TrafficFlow>,
}

impl AppState {
    pub fn new(session: SessionToken) -> Self {
        Self {
            session,
            viewport: MapViewport::default(),
            cities: Vec::new(),
            current_city: None,
            picker: LocationPicker::default(),
            incidents: IncidentOverlay::default(),
            route: RouteOverlay::default(),
            chat: ChatSession::default(),
            flows: Vec::new(),
        }
    }

    pub fn city_name(&self) -> Option<&str> {
        self.current_city.as_ref().map(|city| city.name.as_str())
    }
}
