use traffic_shared::{Incident, SeverityTier, TrafficCondition};

use crate::markup::escape_html;
use crate::overlay::OverlayGroup;
use crate::ports::{MapSurface, Overlay, Presentation};

/// Speed shown when nothing is slowing traffic down.
pub const FREE_FLOW_SPEED_KMH: f64 = 60.0;

/// Aggregate view of the current incident set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficStats {
    pub incident_count: usize,
    /// `60 - average delay`, deliberately not clamped to a plausible range.
    pub average_speed_kmh: i64,
    pub condition: TrafficCondition,
}

impl TrafficStats {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        if incidents.is_empty() {
            return Self {
                incident_count: 0,
                average_speed_kmh: FREE_FLOW_SPEED_KMH as i64,
                condition: TrafficCondition::FreeFlow,
            };
        }

        let count = incidents.len() as f64;
        let average_delay = incidents.iter().map(|i| i.delay_minutes).sum::<f64>() / count;
        let average_severity = incidents.iter().map(|i| f64::from(i.severity)).sum::<f64>() / count;

        Self {
            incident_count: incidents.len(),
            average_speed_kmh: round_half_up(FREE_FLOW_SPEED_KMH - average_delay) as i64,
            condition: TrafficCondition::from_average_severity(Some(average_severity)),
        }
    }

    pub fn speed_label(&self) -> String {
        format!("{} km/h", self.average_speed_kmh)
    }
}

/// Halves round toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn marker_radius(severity: u8) -> f64 {
    8.0 + 2.0 * f64::from(severity)
}

fn incident_marker(incident: &Incident) -> Overlay {
    let severity = incident.display_severity();
    Overlay::Circle {
        position: incident.position(),
        radius: marker_radius(severity),
        fill_color: SeverityTier::from_severity(severity).color(),
        fill_opacity: 0.7,
        popup: Some(incident_popup(incident, severity)),
    }
}

fn incident_popup(incident: &Incident, severity: u8) -> String {
    let mut html = format!(
        "<strong>{}</strong><br><strong>Location:</strong> {}<br><strong>Started:</strong> {}<br>",
        escape_html(&incident.description),
        escape_html(incident.road_name.as_deref().unwrap_or("Unknown Road")),
        escape_html(incident.start_time.as_deref().unwrap_or("Unknown")),
    );
    if let Some(end) = incident.end_time.as_deref() {
        html.push_str(&format!("<strong>Expected End:</strong> {}<br>", escape_html(end)));
    }
    html.push_str(&format!(
        "<strong>Delay:</strong> {} minutes<br><strong>Severity:</strong> {severity}/4<br><strong>Length:</strong> {}m",
        incident.delay_minutes, incident.length_meters
    ));
    html
}

/// Incident markers plus the incident set they were drawn from.
#[derive(Debug)]
pub struct IncidentOverlay {
    markers: OverlayGroup,
    current: Vec<Incident>,
    stats: TrafficStats,
}

impl Default for IncidentOverlay {
    fn default() -> Self {
        Self {
            markers: OverlayGroup::default(),
            current: Vec::new(),
            stats: TrafficStats::from_incidents(&[]),
        }
    }
}

impl IncidentOverlay {
    /// Replace everything with `incidents`: markers, stats and list.
    pub fn apply<M, P>(&mut self, incidents: Vec<Incident>, map: &M, ui: &P)
    where
        M: MapSurface + ?Sized,
        P: Presentation + ?Sized,
    {
        self.markers.rebuild(map, incidents.iter().map(incident_marker));
        self.stats = TrafficStats::from_incidents(&incidents);
        ui.show_stats(&self.stats);
        ui.show_incidents(&incidents);
        self.current = incidents;
    }

    /// Remove the markers. The last incident set is kept as assistant context.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, map: &M) {
        self.markers.clear(map);
    }

    pub fn current(&self) -> &[Incident] {
        &self.current
    }

    #[cfg(test)]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}
