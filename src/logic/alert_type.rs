use super::rules::rule_triggered;
use crate::models::{AlertKind, AlertRule, RecordedOutcome};

/// Works out which metric caused an outcome's alert, for notification copy.
///
/// Looks for a rule carrying the outcome's intervention id whose condition
/// still holds against the stored readings. Windspeed rules are scanned
/// before precipitation rules; within a kind the first match wins.
pub fn determine_alert_type(
    rules: &[AlertRule],
    latest: Option<&RecordedOutcome>,
) -> Option<AlertKind> {
    let latest = latest.filter(|o| o.has_alert())?;
    let intervention_id = latest.intervention_id.as_deref()?;

    AlertKind::all().iter().copied().find(|kind| {
        rules.iter().any(|rule| {
            rule.kind == *kind
                && rule.intervention_id == intervention_id
                && rule_triggered(rule, latest.windspeed, latest.precipitation)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_ALERT;

    fn outcome(wind: f64, precip: f64, intervention: Option<&str>) -> RecordedOutcome {
        RecordedOutcome {
            id: 1,
            building_code: "HQ".into(),
            timestamp: None,
            raw_timestamp: String::new(),
            windspeed: wind,
            precipitation: precip,
            intervention_id: intervention.map(String::from),
        }
    }

    fn rules() -> Vec<AlertRule> {
        vec![
            AlertRule::new(AlertKind::Precipitation, ">", 10.0, "rain_alert").unwrap(),
            AlertRule::new(AlertKind::Windspeed, ">", 15.0, "wind_alert").unwrap(),
        ]
    }

    #[test]
    fn absent_or_no_alert_outcome_has_no_type() {
        assert_eq!(determine_alert_type(&rules(), None), None);
        let quiet = outcome(50.0, 50.0, Some(NO_ALERT));
        assert_eq!(determine_alert_type(&rules(), Some(&quiet)), None);
        let missing = outcome(50.0, 50.0, None);
        assert_eq!(determine_alert_type(&rules(), Some(&missing)), None);
    }

    #[test]
    fn matches_rule_by_intervention_and_condition() {
        let wind = outcome(20.0, 0.0, Some("wind_alert"));
        assert_eq!(
            determine_alert_type(&rules(), Some(&wind)),
            Some(AlertKind::Windspeed)
        );
        let rain = outcome(0.0, 12.0, Some("rain_alert"));
        assert_eq!(
            determine_alert_type(&rules(), Some(&rain)),
            Some(AlertKind::Precipitation)
        );
    }

    #[test]
    fn condition_no_longer_holding_yields_none() {
        // Threshold raised since the outcome was recorded.
        let rules = vec![AlertRule::new(AlertKind::Windspeed, ">", 25.0, "wind_alert").unwrap()];
        let stale = outcome(20.0, 0.0, Some("wind_alert"));
        assert_eq!(determine_alert_type(&rules, Some(&stale)), None);
    }

    #[test]
    fn dangling_intervention_id_yields_none() {
        let orphan = outcome(20.0, 20.0, Some("deleted_rule"));
        assert_eq!(determine_alert_type(&rules(), Some(&orphan)), None);
    }

    #[test]
    fn windspeed_preferred_when_both_kinds_match() {
        let shared = vec![
            AlertRule::new(AlertKind::Precipitation, ">", 1.0, "storm").unwrap(),
            AlertRule::new(AlertKind::Windspeed, ">", 1.0, "storm").unwrap(),
        ];
        let both = outcome(5.0, 5.0, Some("storm"));
        assert_eq!(
            determine_alert_type(&shared, Some(&both)),
            Some(AlertKind::Windspeed)
        );
        let rain_only = outcome(0.5, 5.0, Some("storm"));
        assert_eq!(
            determine_alert_type(&shared, Some(&rain_only)),
            Some(AlertKind::Precipitation)
        );
    }
}
