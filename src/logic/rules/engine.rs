use super::evaluator::rule_triggered;
use crate::models::{AlertRule, ForecastSample, Outcome, NO_ALERT};

/// Applies a building's alert rules to forecast samples.
///
/// Pure and deterministic: the caller supplies the rule set (in the order
/// the store returned it) and persists the outcomes.
pub struct ComparisonEngine<'a> {
    rules: &'a [AlertRule],
}

impl<'a> ComparisonEngine<'a> {
    pub fn new(rules: &'a [AlertRule]) -> Self {
        Self { rules }
    }

    /// Rules whose condition holds for the sample, in rule-set order.
    pub fn triggered(&self, sample: &ForecastSample) -> Vec<&'a AlertRule> {
        self.rules
            .iter()
            .filter(|rule| rule_triggered(rule, sample.windspeed, sample.precipitation))
            .collect()
    }

    /// Intervention for one sample: the first triggered rule that maps to a
    /// real intervention, otherwise `no-alert`.
    pub fn resolve(&self, sample: &ForecastSample) -> &'a str {
        if self.rules.is_empty() {
            return NO_ALERT;
        }
        self.triggered(sample)
            .into_iter()
            .map(|rule| rule.intervention_id.as_str())
            .find(|id| *id != NO_ALERT)
            .unwrap_or(NO_ALERT)
    }

    /// One outcome per sample, same order as the input.
    pub fn compare(&self, building_code: &str, samples: &[ForecastSample]) -> Vec<Outcome> {
        samples
            .iter()
            .map(|sample| Outcome {
                building_code: building_code.to_string(),
                timestamp: sample.timestamp,
                windspeed: sample.windspeed,
                precipitation: sample.precipitation,
                intervention_id: self.resolve(sample).to_string(),
            })
            .collect()
    }
}
