use serde::{Deserialize, Serialize};

use crate::traffic::{LatLon, TrafficFlow, null_as_default};

/// A computed route as returned by the routing endpoint. Every field is
/// optional on the wire; an absent or `null` polyline decodes as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default, deserialize_with = "null_as_default")]
    pub coordinates: Vec<LatLon>,
    #[serde(default, deserialize_with = "null_as_default", rename = "distance")]
    pub distance_meters: f64,
    #[serde(default, deserialize_with = "null_as_default", rename = "duration")]
    pub duration_seconds: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_congestion: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default", rename = "routeTrafficPoints")]
    pub traffic_points: Vec<TrafficFlow>,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Parameters for a route request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    pub start: LatLon,
    pub end: LatLon,
    pub avoid_traffic: bool,
}

impl RouteQuery {
    /// Query-string pairs in the order the routing endpoint documents them.
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("startLat", self.start.lat.to_string()),
            ("startLon", self.start.lon.to_string()),
            ("endLat", self.end.lat.to_string()),
            ("endLon", self.end.lon.to_string()),
            ("avoidTraffic", self.avoid_traffic.to_string()),
        ]
    }
}
