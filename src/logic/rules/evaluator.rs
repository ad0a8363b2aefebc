use crate::models::{AlertRule, Operator};

/// Absolute tolerance used by `==`; forecast readings are floats and exact
/// equality is never what a rule author means.
pub const EQUALITY_TOLERANCE: f64 = 0.01;

/// Evaluates a single threshold condition.
///
/// Unknown operators never match.
pub fn evaluate(actual: f64, operator: &Operator, threshold: f64) -> bool {
    match operator {
        Operator::GreaterThan => actual > threshold,
        Operator::LessThan => actual < threshold,
        Operator::GreaterOrEqual => actual >= threshold,
        Operator::LessOrEqual => actual <= threshold,
        Operator::Equal => (actual - threshold).abs() < EQUALITY_TOLERANCE,
        Operator::Unknown(_) => false,
    }
}

/// Whether a rule's condition holds for the given readings; the rule's kind
/// selects which reading is compared.
pub fn rule_triggered(rule: &AlertRule, windspeed: f64, precipitation: f64) -> bool {
    evaluate(
        rule.kind.reading(windspeed, precipitation),
        &rule.operator,
        rule.threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertKind;

    fn evaluate_str(actual: f64, operator: &str, threshold: f64) -> bool {
        evaluate(actual, &Operator::parse(operator), threshold)
    }

    #[test]
    fn ordering_operators() {
        assert!(evaluate_str(20.0, ">", 15.0));
        assert!(!evaluate_str(15.0, ">", 15.0));
        assert!(evaluate_str(10.0, "<", 15.0));
        assert!(!evaluate_str(15.0, "<", 15.0));
        assert!(evaluate_str(15.0, ">=", 15.0));
        assert!(!evaluate_str(14.9, ">=", 15.0));
        assert!(evaluate_str(15.0, "<=", 15.0));
        assert!(!evaluate_str(15.1, "<=", 15.0));
    }

    #[test]
    fn equality_uses_tolerance() {
        assert!(evaluate_str(10.0, "==", 9.995));
        assert!(evaluate_str(10.0, "==", 10.0));
        assert!(!evaluate_str(10.0, "==", 9.98));
        assert!(!evaluate_str(10.0, "==", 10.02));
    }

    #[test]
    fn unknown_operator_never_matches() {
        for (actual, threshold) in [(0.0, 0.0), (10.0, 5.0), (5.0, 10.0), (-3.0, 100.0)] {
            assert!(!evaluate_str(actual, "bogus", threshold));
            assert!(!evaluate_str(actual, "", threshold));
            assert!(!evaluate_str(actual, "=>", threshold));
        }
    }

    #[test]
    fn rule_reads_matching_metric() {
        let wind = AlertRule::new(AlertKind::Windspeed, ">", 15.0, "wind_alert").unwrap();
        let rain = AlertRule::new(AlertKind::Precipitation, ">", 10.0, "rain_alert").unwrap();

        assert!(rule_triggered(&wind, 20.0, 0.0));
        assert!(!rule_triggered(&wind, 5.0, 50.0));
        assert!(rule_triggered(&rain, 0.0, 12.0));
        assert!(!rule_triggered(&rain, 30.0, 2.0));
    }
}
