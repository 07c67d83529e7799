use traffic_shared::tiers::is_significant_congestion;
use traffic_shared::{CongestionTier, Route, TrafficFlow};

use crate::config::ROUTE_FIT_PADDING_PX;
use crate::markup::escape_html;
use crate::overlay::{OverlayGroup, OverlaySlot};
use crate::ports::{MapSurface, Overlay};

pub const RECOMMENDED_ROUTE_COLOR: &str = "#4caf50";
pub const DEFAULT_ROUTE_COLOR: &str = "#667eea";

/// Average congestion above which a non-recommended route gets a warning.
const HEAVY_CONGESTION_PERCENT: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteBanner {
    Recommended(Option<String>),
    HeavyTraffic,
}

/// Text summary of the drawn route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: i64,
    pub traffic_level: Option<String>,
    pub average_congestion: Option<f64>,
    pub banner: Option<RouteBanner>,
}

impl RouteSummary {
    pub fn from_route(route: &Route) -> Self {
        let banner = if route.recommended {
            Some(RouteBanner::Recommended(route.recommendation_reason.clone()))
        } else if is_heavy(route) {
            Some(RouteBanner::HeavyTraffic)
        } else {
            None
        };
        Self {
            distance_km: route.distance_meters / 1000.0,
            duration_min: (route.duration_seconds / 60.0).round() as i64,
            traffic_level: route.traffic_level.clone().filter(|level| !level.is_empty()),
            average_congestion: route.average_congestion,
            banner,
        }
    }

    pub fn distance_label(&self) -> String {
        format!("{:.2} km", self.distance_km)
    }

    pub fn duration_label(&self) -> String {
        format!("{} minutes", self.duration_min)
    }

    pub fn traffic_label(&self) -> Option<String> {
        let level = self.traffic_level.as_deref()?;
        Some(match self.average_congestion {
            Some(congestion) => format!("{level} ({congestion}% congestion)"),
            None => level.to_string(),
        })
    }

    pub fn banner_text(&self) -> Option<String> {
        match self.banner.as_ref()? {
            RouteBanner::Recommended(Some(reason)) => Some(format!("✅ {reason}")),
            RouteBanner::Recommended(None) => Some("✅ Recommended route".to_string()),
            RouteBanner::HeavyTraffic => Some(
                "⚠️ Heavy traffic detected on this route. Consider alternative times or routes."
                    .to_string(),
            ),
        }
    }

    fn popup_html(&self) -> String {
        let mut html = format!(
            "<strong>Route Information</strong><br>Distance: {}<br>Duration: {}",
            self.distance_label(),
            self.duration_label()
        );
        if let Some(level) = self.traffic_level.as_deref() {
            html.push_str(&format!("<br>Traffic: {}", escape_html(level)));
        }
        html
    }
}

fn is_heavy(route: &Route) -> bool {
    route
        .average_congestion
        .is_some_and(|congestion| congestion > HEAVY_CONGESTION_PERCENT)
}

/// Assistant message announcing a route, if it deserves one. Recommended
/// routes never also get the heavy-traffic warning.
pub fn route_notice(route: &Route) -> Option<String> {
    if route.recommended {
        Some(match route.recommendation_reason.as_deref() {
            Some(reason) => {
                format!("I found a better route! {reason}. Check the green route on the map.")
            }
            None => "I found a better route! Check the green route on the map.".to_string(),
        })
    } else if let Some(congestion) = route
        .average_congestion
        .filter(|congestion| *congestion > HEAVY_CONGESTION_PERCENT)
    {
        Some(format!(
            "Warning: Heavy traffic detected on this route ({congestion}% congestion). \
             You might want to try a different time or ask me for alternatives."
        ))
    } else {
        None
    }
}

fn congestion_marker(point: &TrafficFlow) -> Overlay {
    let mut popup = format!(
        "<strong>Traffic Point</strong><br>Congestion: {}%<br>Speed: {} km/h",
        point.congestion_percent, point.current_speed
    );
    if let Some(road) = point.road_name.as_deref() {
        popup.push_str(&format!("<br>{}", escape_html(road)));
    }
    Overlay::Circle {
        position: point.position(),
        radius: 6.0,
        fill_color: CongestionTier::from_percent(point.congestion_percent).color(),
        fill_opacity: 0.8,
        popup: Some(popup),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The route had no geometry. The previous route is gone regardless.
    NoRoute,
    Drawn {
        summary: RouteSummary,
        notice: Option<String>,
    },
}

/// The drawn route polyline and its congestion markers.
#[derive(Debug, Default)]
pub struct RouteOverlay {
    line: OverlaySlot,
    congestion: OverlayGroup,
}

impl RouteOverlay {
    /// Tear down the previous route, then draw `route` if it has geometry.
    pub fn show<M: MapSurface + ?Sized>(&mut self, route: &Route, map: &M) -> RouteOutcome {
        self.line.clear(map);
        self.congestion.clear(map);

        if route.is_empty() {
            return RouteOutcome::NoRoute;
        }

        let summary = RouteSummary::from_route(route);
        let color = if route.recommended {
            RECOMMENDED_ROUTE_COLOR
        } else {
            DEFAULT_ROUTE_COLOR
        };
        let line = self.line.replace(
            map,
            &Overlay::Polyline {
                points: route.coordinates.clone(),
                color,
                weight: 6.0,
                opacity: 0.8,
                popup: Some(summary.popup_html()),
            },
        );
        self.congestion.rebuild(
            map,
            route
                .traffic_points
                .iter()
                .filter(|point| is_significant_congestion(point.congestion_percent))
                .map(congestion_marker),
        );

        map.fit_bounds(&route.coordinates, ROUTE_FIT_PADDING_PX);
        map.open_popup(line);

        RouteOutcome::Drawn {
            summary,
            notice: route_notice(route),
        }
    }

    /// Remove the polyline and congestion markers.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, map: &M) {
        self.line.clear(map);
        self.congestion.clear(map);
    }

    #[cfg(test)]
    pub fn congestion_marker_count(&self) -> usize {
        self.congestion.len()
    }

    #[cfg(test)]
    pub fn has_line(&self) -> bool {
        self.line.handle().is_some()
    }
}
