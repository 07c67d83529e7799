use serde::{Deserialize, Deserializer, Serialize};

/// Decode an explicit `null` the same way as a missing field. The traffic
/// service writes out every unset field as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Geographic position in decimal degrees.
///
/// Serialized as a `[lat, lon]` pair, which is how the routing endpoint
/// encodes polyline vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for LatLon {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<LatLon> for [f64; 2] {
    fn from(pos: LatLon) -> Self {
        [pos.lat, pos.lon]
    }
}

/// A city the dashboard can switch to. `bbox` is passed verbatim to the
/// incidents endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bbox: String,
}

impl City {
    pub fn center(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub latitude: f64,
    pub longitude: f64,
    /// 1 (minor) through 4 (critical). Zero means the feed omitted it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", rename = "delay")]
    pub delay_minutes: f64,
    #[serde(default, deserialize_with = "null_as_default", rename = "length")]
    pub length_meters: f64,
}

impl Incident {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Severity used for drawing; a missing severity renders as the lowest tier.
    pub fn display_severity(&self) -> u8 {
        if self.severity == 0 { 1 } else { self.severity }
    }
}

/// Traffic flow sample at a point, also used for the congestion samples
/// attached to a computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficFlow {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_flow_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Percentage drop from free-flow speed.
    #[serde(default, deserialize_with = "null_as_default", rename = "congestion")]
    pub congestion_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
}

impl TrafficFlow {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub found: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GeocodeResult {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}
