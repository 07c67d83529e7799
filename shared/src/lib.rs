pub mod chat;
pub mod route;
pub mod tiers;
pub mod traffic;

pub use chat::{ChatReply, ChatRequest};
pub use route::{Route, RouteQuery};
pub use tiers::{CongestionTier, SeverityTier, TrafficCondition};
pub use traffic::{City, GeocodeResult, Incident, LatLon, TrafficFlow};
