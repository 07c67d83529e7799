//! Color and label tiers shared by every view of incidents and congestion.

pub const RED: &str = "#dc3545";
pub const AMBER: &str = "#ffc107";
pub const ORANGE: &str = "#ff9800";
pub const GREEN: &str = "#28a745";
pub const CONGESTION_GREEN: &str = "#4caf50";

/// Congestion at or below this percentage is not worth marking on a route.
pub const CONGESTION_MARKER_THRESHOLD: f64 = 20.0;

/// Incident severity bucket, used for marker fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTier {
    Minor,
    Moderate,
    Major,
}

impl SeverityTier {
    pub fn from_severity(severity: u8) -> Self {
        if severity >= 3 {
            Self::Major
        } else if severity >= 2 {
            Self::Moderate
        } else {
            Self::Minor
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Major => RED,
            Self::Moderate => AMBER,
            Self::Minor => GREEN,
        }
    }
}

/// Congestion bucket for a single traffic sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionTier {
    Low,
    Elevated,
    High,
    Severe,
}

impl CongestionTier {
    pub fn from_percent(congestion: f64) -> Self {
        if congestion >= 70.0 {
            Self::Severe
        } else if congestion >= 50.0 {
            Self::High
        } else if congestion >= 30.0 {
            Self::Elevated
        } else {
            Self::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Severe => RED,
            Self::High => AMBER,
            Self::Elevated => ORANGE,
            Self::Low => CONGESTION_GREEN,
        }
    }
}

/// Whether a traffic sample is congested enough to get its own marker.
pub fn is_significant_congestion(congestion: f64) -> bool {
    congestion > CONGESTION_MARKER_THRESHOLD
}

/// City-wide condition derived from the current incident set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficCondition {
    FreeFlow,
    Light,
    Moderate,
    Heavy,
}

impl TrafficCondition {
    /// `None` means there are no incidents at all.
    pub fn from_average_severity(average: Option<f64>) -> Self {
        match average {
            None => Self::FreeFlow,
            Some(avg) if avg >= 3.0 => Self::Heavy,
            Some(avg) if avg >= 2.0 => Self::Moderate,
            Some(_) => Self::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FreeFlow => "Free Flow",
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
        }
    }
}
