use traffic_shared::LatLon;

use crate::config::{CITY_ZOOM, DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::ports::{MapSurface, TileLayer};

/// Base map style. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseLayer {
    #[default]
    Streets,
    Satellite,
    Hybrid,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Streets, BaseLayer::Satellite, BaseLayer::Hybrid];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "streets" => Some(Self::Streets),
            "satellite" => Some(Self::Satellite),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Streets => "streets",
            Self::Satellite => "satellite",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Streets => "Streets",
            Self::Satellite => "Satellite",
            Self::Hybrid => "Hybrid",
        }
    }

    /// Tile layers that make up this style, bottom first.
    fn tile_layers(self) -> &'static [TileLayer] {
        match self {
            Self::Streets => &[TileLayer::Streets],
            Self::Satellite => &[TileLayer::Satellite],
            Self::Hybrid => &[TileLayer::Hybrid, TileLayer::HybridLabels],
        }
    }
}

/// Current center, zoom and base style of the map.
#[derive(Debug, Clone)]
pub struct MapViewport {
    pub center: LatLon,
    pub zoom: u8,
    pub base: BaseLayer,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            base: BaseLayer::default(),
        }
    }
}

impl MapViewport {
    /// Push the initial view and base style to a freshly created map.
    pub fn attach<M: MapSurface + ?Sized>(&self, map: &M) {
        map.set_view(self.center, self.zoom);
        for layer in self.base.tile_layers() {
            map.add_tile_layer(*layer);
        }
    }

    /// Remove every base layer and the label overlay, then add `base`.
    pub fn switch_base_layer<M: MapSurface + ?Sized>(&mut self, base: BaseLayer, map: &M) {
        for layer in TileLayer::ALL {
            map.remove_tile_layer(layer);
        }
        for layer in base.tile_layers() {
            map.add_tile_layer(*layer);
        }
        self.base = base;
    }

    pub fn focus<M: MapSurface + ?Sized>(&mut self, center: LatLon, zoom: u8, map: &M) {
        self.center = center;
        self.zoom = zoom;
        map.set_view(center, zoom);
    }

    pub fn focus_city<M: MapSurface + ?Sized>(&mut self, center: LatLon, map: &M) {
        self.focus(center, CITY_ZOOM, map);
    }
}
