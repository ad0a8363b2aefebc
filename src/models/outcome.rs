use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intervention id recorded when no rule fired for a sample.
pub const NO_ALERT: &str = "no-alert";

/// True when an intervention reference denotes an actual alert.
pub fn is_alert(intervention_id: Option<&str>) -> bool {
    matches!(intervention_id, Some(id) if !id.is_empty() && id != NO_ALERT)
}

/// Result of evaluating every rule for one forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub building_code: String,
    pub timestamp: DateTime<Utc>,
    pub windspeed: f64,
    pub precipitation: f64,
    pub intervention_id: String,
}

impl Outcome {
    pub fn has_alert(&self) -> bool {
        is_alert(Some(&self.intervention_id))
    }
}

/// An outcome as read back from the log.
///
/// Rows are kept even when their timestamp cannot be parsed; such rows have
/// `timestamp == None` and only `raw_timestamp` to show for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedOutcome {
    pub id: i64,
    pub building_code: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub raw_timestamp: String,
    pub windspeed: f64,
    pub precipitation: f64,
    pub intervention_id: Option<String>,
}

impl RecordedOutcome {
    pub fn has_alert(&self) -> bool {
        is_alert(self.intervention_id.as_deref())
    }
}

/// Parses a stored timestamp: RFC 3339, or a naive date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn alert_detection() {
        assert!(is_alert(Some("wind_alert")));
        assert!(!is_alert(Some(NO_ALERT)));
        assert!(!is_alert(Some("")));
        assert!(!is_alert(None));
    }

    #[test]
    fn parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T13:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00.000"), Some(expected));
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45T99:00:00"), None);
    }
}
