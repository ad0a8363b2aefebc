use crate::error::{Result, WeatherWatchError};
use serde::{Deserialize, Serialize};

/// Weather metric an alert rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Windspeed,
    Precipitation,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Windspeed => "Windspeed",
            AlertKind::Precipitation => "Precipitation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "windspeed" | "wind" => Some(AlertKind::Windspeed),
            "precipitation" | "precip" => Some(AlertKind::Precipitation),
            _ => None,
        }
    }

    pub fn all() -> &'static [AlertKind] {
        &[AlertKind::Windspeed, AlertKind::Precipitation]
    }

    /// Picks the reading this kind of rule compares against.
    pub fn reading(&self, windspeed: f64, precipitation: f64) -> f64 {
        match self {
            AlertKind::Windspeed => windspeed,
            AlertKind::Precipitation => precipitation,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparison operator of a threshold rule.
///
/// Operators read back from storage that are not recognised are kept as
/// `Unknown` rather than rejected; they never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    Unknown(String),
}

impl Operator {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            ">" => Operator::GreaterThan,
            "<" => Operator::LessThan,
            ">=" => Operator::GreaterOrEqual,
            "<=" => Operator::LessOrEqual,
            "==" => Operator::Equal,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "==",
            Operator::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Option<i64>,
    /// `None` for rules that apply to every building.
    pub building_code: Option<String>,
    pub kind: AlertKind,
    pub operator: Operator,
    pub threshold: f64,
    pub intervention_id: String,
}

impl AlertRule {
    /// Builds a global rule, rejecting unknown operators, negative or
    /// non-finite thresholds and blank intervention ids.
    pub fn new(
        kind: AlertKind,
        operator: &str,
        threshold: f64,
        intervention_id: &str,
    ) -> Result<Self> {
        let operator = Operator::parse(operator);
        if !operator.is_known() {
            return Err(WeatherWatchError::InvalidData(format!(
                "operator must be one of '>', '<', '>=', '<=', '==', got '{}'",
                operator
            )));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(WeatherWatchError::InvalidData(format!(
                "threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        let intervention_id = intervention_id.trim();
        if intervention_id.is_empty() {
            return Err(WeatherWatchError::InvalidData(
                "intervention id must not be empty".into(),
            ));
        }

        Ok(Self {
            id: None,
            building_code: None,
            kind,
            operator,
            threshold,
            intervention_id: intervention_id.to_string(),
        })
    }

    pub fn for_building(mut self, building_code: &str) -> Self {
        self.building_code = Some(building_code.to_string());
        self
    }

    pub fn is_global(&self) -> bool {
        self.building_code.is_none()
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} {} -> {}",
            self.kind, self.operator, self.threshold, self.intervention_id
        )
    }
}
