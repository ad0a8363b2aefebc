use crate::models::{RecordedOutcome, SiteStatus};
use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};

/// Which day an outcome falls on, relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    Yesterday,
    Today,
    /// D+1 through D+3.
    Upcoming,
}

/// Day boundaries around an instant, in that instant's offset.
///
/// Buckets are half-open: yesterday `[D-1, D)`, today `[D, D+1)`,
/// upcoming `[D+1, D+4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWindow {
    yesterday: DateTime<FixedOffset>,
    today: DateTime<FixedOffset>,
    tomorrow: DateTime<FixedOffset>,
    horizon: DateTime<FixedOffset>,
}

impl StatusWindow {
    pub const UPCOMING_DAYS: i64 = 3;

    pub fn around(now: DateTime<FixedOffset>) -> Self {
        let since_midnight = Duration::seconds(i64::from(now.num_seconds_from_midnight()))
            + Duration::nanoseconds(i64::from(now.nanosecond()));
        let today = now - since_midnight;

        Self {
            yesterday: today - Duration::days(1),
            today,
            tomorrow: today + Duration::days(1),
            horizon: today + Duration::days(1 + Self::UPCOMING_DAYS),
        }
    }

    pub fn bucket(&self, timestamp: DateTime<Utc>) -> Option<DayBucket> {
        if timestamp >= self.today && timestamp < self.tomorrow {
            Some(DayBucket::Today)
        } else if timestamp >= self.yesterday && timestamp < self.today {
            Some(DayBucket::Yesterday)
        } else if timestamp >= self.tomorrow && timestamp < self.horizon {
            Some(DayBucket::Upcoming)
        } else {
            None
        }
    }
}

/// Derives a building's status from its outcome history.
///
/// Red when anything alerts today; purple when only yesterday alerted;
/// yellow when an alert is upcoming; green otherwise. Outcomes outside the
/// window or without a parseable timestamp are ignored.
pub fn classify(outcomes: &[RecordedOutcome], now: DateTime<FixedOffset>) -> SiteStatus {
    let window = StatusWindow::around(now);

    let mut today = false;
    let mut yesterday = false;
    let mut upcoming = false;

    for outcome in outcomes.iter().filter(|o| o.has_alert()) {
        let Some(timestamp) = outcome.timestamp else {
            continue;
        };
        match window.bucket(timestamp) {
            Some(DayBucket::Today) => today = true,
            Some(DayBucket::Yesterday) => yesterday = true,
            Some(DayBucket::Upcoming) => upcoming = true,
            None => {}
        }
    }

    if today {
        SiteStatus::Red
    } else if yesterday && !upcoming {
        SiteStatus::Purple
    } else if upcoming {
        SiteStatus::Yellow
    } else {
        SiteStatus::Green
    }
}

/// The alerting outcome that put a building into `status`: the earliest one
/// in today's bucket for red, upcoming for yellow, yesterday for purple.
/// Green has none.
pub fn driving_outcome(
    outcomes: &[RecordedOutcome],
    status: SiteStatus,
    now: DateTime<FixedOffset>,
) -> Option<&RecordedOutcome> {
    let bucket = match status {
        SiteStatus::Red => DayBucket::Today,
        SiteStatus::Yellow => DayBucket::Upcoming,
        SiteStatus::Purple => DayBucket::Yesterday,
        SiteStatus::Green => return None,
    };
    let window = StatusWindow::around(now);

    outcomes
        .iter()
        .filter(|o| o.has_alert())
        .filter_map(|o| o.timestamp.map(|ts| (ts, o)))
        .filter(|(ts, _)| window.bucket(*ts) == Some(bucket))
        .min_by_key(|(ts, _)| *ts)
        .map(|(_, o)| o)
}
