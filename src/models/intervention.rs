use crate::error::{Result, WeatherWatchError};
use serde::{Deserialize, Serialize};

/// Human readable guidance attached to a triggered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Intervention {
    pub fn new(id: &str, title: &str, description: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(WeatherWatchError::InvalidData(
                "intervention id must not be empty".into(),
            ));
        }
        if id == super::NO_ALERT {
            return Err(WeatherWatchError::InvalidData(format!(
                "'{}' is reserved and cannot be used as an intervention id",
                super::NO_ALERT
            )));
        }

        Ok(Self {
            id: id.to_string(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        })
    }
}
