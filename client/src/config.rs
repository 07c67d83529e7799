use traffic_shared::LatLon;

pub const API_BASE: &str = "/api/traffic";
pub const REFRESH_INTERVAL_MS: u32 = 120_000; // 2 minutes
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const DEFAULT_CENTER: LatLon = LatLon::new(40.7128, -74.0060);
pub const DEFAULT_ZOOM: u8 = 12;
pub const CITY_ZOOM: u8 = 12;
pub const SEARCH_ZOOM: u8 = 20;
pub const MAX_TILE_ZOOM: u8 = 19;

pub const STREETS_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const STREETS_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const IMAGERY_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const IMAGERY_ATTRIBUTION: &str = "© Esri";
pub const LABEL_LAYER_OPACITY: f64 = 0.5;

pub const ROUTE_FIT_PADDING_PX: f64 = 50.0;

/// Runtime settings, overridable from the page's query string
/// (`?api=...&refresh_secs=...&log=...`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub refresh_interval_ms: u32,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            refresh_interval_ms: REFRESH_INTERVAL_MS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Resolve from decoded query parameters. Blank, zero or unparseable
    /// values fall back to the defaults.
    pub fn from_params(param: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            param(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_base = text("api")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let refresh_interval_ms = text("refresh_secs")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .and_then(|secs| secs.checked_mul(1_000))
            .unwrap_or(defaults.refresh_interval_ms);
        let log_filter = text("log").unwrap_or(defaults.log_filter);
        Self {
            api_base,
            refresh_interval_ms,
            log_filter,
        }
    }

    /// Resolve from the current page URL. The browser's `URLSearchParams`
    /// does the percent and `+` decoding.
    pub fn from_location() -> Self {
        let params = web_sys::window()
            .and_then(|window| window.location().search().ok())
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok());
        Self::from_params(|key| params.as_ref().and_then(|params| params.get(key)))
    }
}
