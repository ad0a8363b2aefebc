use super::{Location, RecordedOutcome};
use serde::{Deserialize, Serialize};

/// Coarse classification of a building's alert timeline around "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    /// No alert yesterday, today or in the next three days.
    Green,
    /// An alert is active today.
    Red,
    /// An alert is forecast within D+1..=D+3.
    Yellow,
    /// An alert happened yesterday and nothing is active or upcoming.
    Purple,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Green => "green",
            SiteStatus::Red => "red",
            SiteStatus::Yellow => "yellow",
            SiteStatus::Purple => "purple",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SiteStatus::Green => "Normal",
            SiteStatus::Red => "Alert Today",
            SiteStatus::Yellow => "Future Alert",
            SiteStatus::Purple => "Past Alert",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SiteStatus::Green => "No weather alerts. All conditions normal.",
            SiteStatus::Red => {
                "Weather alert is active for today. Immediate attention may be required."
            }
            SiteStatus::Yellow => {
                "Weather alert is forecasted for the next few days. Monitor conditions."
            }
            SiteStatus::Purple => {
                "Weather alert was active yesterday but is no longer active today."
            }
        }
    }

    /// Hex colour used by the HTML email templates.
    pub fn color(&self) -> &'static str {
        match self {
            SiteStatus::Green => "#2e7d32",
            SiteStatus::Red => "#c62828",
            SiteStatus::Yellow => "#f9a825",
            SiteStatus::Purple => "#6a1b9a",
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, SiteStatus::Green)
    }
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A location together with its current status and most recent reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    pub location: Location,
    pub status: SiteStatus,
    pub latest: Option<RecordedOutcome>,
}
