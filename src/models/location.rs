use crate::error::{Result, WeatherWatchError};
use serde::{Deserialize, Serialize};

/// A monitored building and the people who hear about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub building_code: String,
    pub owner_emails: Vec<String>,
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub fn new(
        building_code: &str,
        owner_emails: &[String],
        longitude: f64,
        latitude: f64,
    ) -> Result<Self> {
        let building_code = building_code.trim();
        if building_code.is_empty() {
            return Err(WeatherWatchError::InvalidData(
                "building code must not be empty".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherWatchError::InvalidData(format!(
                "latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherWatchError::InvalidData(format!(
                "longitude {} out of range [-180, 180]",
                longitude
            )));
        }

        Ok(Self {
            building_code: building_code.to_string(),
            owner_emails: normalize_emails(owner_emails.iter().map(String::as_str)),
            longitude,
            latitude,
        })
    }

    /// Owner emails as stored: a single comma separated column.
    pub fn joined_emails(&self) -> String {
        self.owner_emails.join(",")
    }
}

/// Splits a comma separated owner list, dropping blanks and repeats while
/// keeping the order given.
pub fn parse_email_list(raw: &str) -> Vec<String> {
    normalize_emails(raw.split(','))
}

fn normalize_emails<'a>(emails: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for email in emails.flat_map(|e| e.split(',')) {
        let email = email.trim();
        if !email.is_empty() && !out.iter().any(|e| e == email) {
            out.push(email.to_string());
        }
    }
    out
}
