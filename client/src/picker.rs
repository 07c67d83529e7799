use traffic_shared::{GeocodeResult, LatLon};

use crate::error::InputError;
use crate::markup::escape_html;
use crate::overlay::OverlaySlot;
use crate::ports::{Field, MapSurface, Overlay, OverlayHandle, PinIcon, Presentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    pub fn field(self) -> Field {
        match self {
            Self::Start => Field::StartLocation,
            Self::End => Field::EndLocation,
        }
    }

    fn icon(self) -> PinIcon {
        match self {
            Self::Start => PinIcon::Start,
            Self::End => PinIcon::End,
        }
    }

    fn popup(self) -> &'static str {
        match self {
            Self::Start => "Start Location",
            Self::End => "End Location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Filled,
}

/// Last geocoding hit, kept so it can be promoted to start or end.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub position: LatLon,
    pub display_name: String,
}

impl From<&GeocodeResult> for SearchHit {
    fn from(result: &GeocodeResult) -> Self {
        Self {
            position: result.position(),
            display_name: result.display_name.clone(),
        }
    }
}

/// Start/end selection. A slot's text lives in its presentation field; only
/// an empty field means the slot is empty, so whitespace counts as filled.
/// Each slot's marker is owned here.
#[derive(Debug, Default)]
pub struct LocationPicker {
    start: OverlaySlot,
    end: OverlaySlot,
    search: OverlaySlot,
    search_hit: Option<SearchHit>,
}

impl LocationPicker {
    pub fn slot_state<P: Presentation + ?Sized>(&self, endpoint: Endpoint, ui: &P) -> SlotState {
        if ui.field(endpoint.field()).is_empty() {
            SlotState::Empty
        } else {
            SlotState::Filled
        }
    }

    /// Fill the first empty slot, start before end. Returns the slot that was
    /// filled, or `None` when both are already taken.
    pub fn on_map_click<M, P>(&mut self, position: LatLon, map: &M, ui: &P) -> Option<Endpoint>
    where
        M: MapSurface + ?Sized,
        P: Presentation + ?Sized,
    {
        let endpoint = [Endpoint::Start, Endpoint::End]
            .into_iter()
            .find(|endpoint| self.slot_state(*endpoint, ui) == SlotState::Empty)?;
        self.assign(endpoint, position, map, ui);
        Some(endpoint)
    }

    /// Set a slot directly, replacing its previous marker.
    pub fn assign<M, P>(&mut self, endpoint: Endpoint, position: LatLon, map: &M, ui: &P)
    where
        M: MapSurface + ?Sized,
        P: Presentation + ?Sized,
    {
        ui.set_field(endpoint.field(), &format_lat_lon(position));
        let overlay = Overlay::Pin {
            position,
            icon: endpoint.icon(),
            popup: Some(endpoint.popup().to_string()),
        };
        self.slot_mut(endpoint).replace(map, &overlay);
    }

    /// Mark a search result on the map and remember it.
    pub fn show_search_hit<M: MapSurface + ?Sized>(&mut self, hit: SearchHit, map: &M) -> OverlayHandle {
        let overlay = Overlay::Pin {
            position: hit.position,
            icon: PinIcon::Search,
            popup: Some(format!("<strong>{}</strong>", escape_html(&hit.display_name))),
        };
        let handle = self.search.replace(map, &overlay);
        self.search_hit = Some(hit);
        handle
    }

    pub fn search_hit(&self) -> Option<&SearchHit> {
        self.search_hit.as_ref()
    }

    /// Empty both slots and remove their markers. The search marker stays.
    pub fn clear<M, P>(&mut self, map: &M, ui: &P)
    where
        M: MapSurface + ?Sized,
        P: Presentation + ?Sized,
    {
        for endpoint in [Endpoint::Start, Endpoint::End] {
            self.slot_mut(endpoint).clear(map);
            ui.set_field(endpoint.field(), "");
        }
    }

    #[cfg(test)]
    pub fn marker(&self, endpoint: Endpoint) -> Option<OverlayHandle> {
        match endpoint {
            Endpoint::Start => self.start.handle(),
            Endpoint::End => self.end.handle(),
        }
    }

    fn slot_mut(&mut self, endpoint: Endpoint) -> &mut OverlaySlot {
        match endpoint {
            Endpoint::Start => &mut self.start,
            Endpoint::End => &mut self.end,
        }
    }
}

/// `"lat, lon"` with five decimals.
pub fn format_lat_lon(position: LatLon) -> String {
    format!("{:.5}, {:.5}", position.lat, position.lon)
}

/// Parse `"lat, lon"` text. Both parts must be finite numbers.
pub fn parse_lat_lon(text: &str) -> Result<LatLon, InputError> {
    let mut parts = text.split(',');
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(InputError::InvalidCoordinates);
    };
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(InputError::InvalidCoordinates)
    };
    Ok(LatLon::new(parse(lat)?, parse(lon)?))
}
