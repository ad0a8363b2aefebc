use super::alert_type::determine_alert_type;
use super::rules::ComparisonEngine;
use super::status::{classify, driving_outcome};
use crate::config::Config;
use crate::datasources::ForecastSource;
use crate::db::{latest_of, Database};
use crate::error::Result;
use crate::models::{AlertRule, Location, RecordedOutcome, SiteReport, SiteStatus};
use crate::notify::templates::{digest_message, status_change_message, StatusChange};
use crate::notify::{EmailMessage, Notifier};
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::BTreeMap;

/// Scheduling knobs the orchestrator needs from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub alert_hour: u32,
    pub utc_offset: FixedOffset,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            alert_hour: config.schedule.alert_hour,
            utc_offset: config.schedule.utc_offset()?,
        })
    }
}

/// Only a move out of green notifies; non-green to non-green stays silent.
pub fn should_send_status_alert(previous: SiteStatus, current: SiteStatus) -> bool {
    previous == SiteStatus::Green && current != SiteStatus::Green && current != previous
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub locations: usize,
    pub skipped: usize,
    pub outcomes_written: usize,
    pub alerts_sent: usize,
    pub alert_failures: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct Deliveries {
    sent: usize,
    failed: usize,
}

enum LocationCheck {
    Skipped,
    Checked {
        outcomes: usize,
        deliveries: Deliveries,
    },
}

pub struct Monitor {
    db: Database,
    forecast: Box<dyn ForecastSource>,
    notifier: Option<Box<dyn Notifier>>,
    settings: MonitorSettings,
    last_digest: Option<NaiveDate>,
}

impl Monitor {
    pub fn new(
        db: Database,
        forecast: Box<dyn ForecastSource>,
        notifier: Option<Box<dyn Notifier>>,
        settings: MonitorSettings,
    ) -> Self {
        if notifier.is_none() {
            tracing::info!("Email not configured - alerts and digests will only be logged");
        }

        Self {
            db,
            forecast,
            notifier,
            settings,
            last_digest: None,
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.settings.utc_offset)
    }

    pub fn site_status(&self, building_code: &str, now: DateTime<Utc>) -> Result<SiteStatus> {
        let outcomes = self.db.all_outcomes(building_code)?;
        Ok(classify(&outcomes, self.local(now)))
    }

    /// Every location with its current status and latest reading, ordered
    /// by building code.
    pub fn site_statuses(&self, now: DateTime<Utc>) -> Result<Vec<SiteReport>> {
        let local_now = self.local(now);
        self.db
            .all_locations()?
            .into_iter()
            .map(|location| -> Result<SiteReport> {
                let history = self.db.all_outcomes(&location.building_code)?;
                Ok(SiteReport {
                    status: classify(&history, local_now),
                    latest: latest_of(&history).cloned(),
                    location,
                })
            })
            .collect()
    }

    /// Fetches, evaluates and records a forecast for every location, then
    /// notifies owners of buildings that just left green.
    ///
    /// A building whose forecast cannot be fetched or stored is skipped;
    /// the rest of the cycle carries on.
    pub async fn run_weather_check_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let locations = self.db.all_locations()?;
        let mut report = CycleReport {
            locations: locations.len(),
            ..Default::default()
        };

        tracing::info!(locations = locations.len(), "Weather check started");

        for location in &locations {
            match self.check_location(location, now).await {
                Ok(LocationCheck::Checked {
                    outcomes,
                    deliveries,
                }) => {
                    report.outcomes_written += outcomes;
                    report.alerts_sent += deliveries.sent;
                    report.alert_failures += deliveries.failed;
                }
                Ok(LocationCheck::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        building = %location.building_code,
                        error = %e,
                        "Skipping building this cycle"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            locations = report.locations,
            skipped = report.skipped,
            outcomes = report.outcomes_written,
            alerts_sent = report.alerts_sent,
            alert_failures = report.alert_failures,
            "Weather check finished"
        );
        Ok(report)
    }

    async fn check_location(&self, location: &Location, now: DateTime<Utc>) -> Result<LocationCheck> {
        let code = location.building_code.as_str();
        let samples = self
            .forecast
            .fetch_forecast(location.latitude, location.longitude)
            .await?;

        if samples.is_empty() {
            tracing::warn!(building = %code, source = self.forecast.name(), "Empty forecast, skipping");
            return Ok(LocationCheck::Skipped);
        }

        let local_now = self.local(now);
        let previous = self.site_status(code, now)?;

        let rules = self.db.rules_for(code)?;
        let outcomes = ComparisonEngine::new(&rules).compare(code, &samples);
        let written = self.db.append_outcomes(&outcomes)?;

        let history = self.db.all_outcomes(code)?;
        let current = classify(&history, local_now);

        tracing::debug!(
            building = %code,
            samples = samples.len(),
            alerting = outcomes.iter().filter(|o| o.has_alert()).count(),
            previous = %previous,
            current = %current,
            "Building evaluated"
        );

        let deliveries = if should_send_status_alert(previous, current) {
            tracing::info!(building = %code, from = %previous, to = %current, "Status changed");
            let latest = self.db.latest_outcome(code)?;
            let cause = driving_outcome(&history, current, local_now);
            self.send_status_alert(location, previous, current, &rules, latest.as_ref(), cause)
                .await
        } else {
            Deliveries::default()
        };

        Ok(LocationCheck::Checked {
            outcomes: written,
            deliveries,
        })
    }

    async fn send_status_alert(
        &self,
        location: &Location,
        previous: SiteStatus,
        current: SiteStatus,
        rules: &[AlertRule],
        latest: Option<&RecordedOutcome>,
        cause: Option<&RecordedOutcome>,
    ) -> Deliveries {
        let Some(notifier) = self.notifier.as_deref() else {
            tracing::info!(
                building = %location.building_code,
                status = %current,
                "Email not configured, status alert not sent"
            );
            return Deliveries::default();
        };

        // Latest outcome first, then the one that moved the status.
        let alert_kind =
            determine_alert_type(rules, latest).or_else(|| determine_alert_type(rules, cause));
        let intervention_id = cause
            .filter(|o| o.has_alert())
            .and_then(|o| o.intervention_id.as_deref());
        let intervention = match intervention_id {
            Some(id) => self.db.intervention_by_id(id).unwrap_or_else(|e| {
                tracing::warn!(intervention = id, error = %e, "Intervention lookup failed");
                None
            }),
            None => None,
        };

        let change = StatusChange {
            building_code: &location.building_code,
            previous,
            current,
            alert_kind,
            intervention: intervention.as_ref(),
        };

        let mut deliveries = Deliveries::default();
        for email in &location.owner_emails {
            match status_change_message(email, &change) {
                Ok(message) => deliver(notifier, &message, &mut deliveries).await,
                Err(e) => {
                    tracing::warn!(to = %email, error = %e, "Could not render status alert");
                    deliveries.failed += 1;
                }
            }
        }
        deliveries
    }

    /// Sends the digest when the local hour matches `alert_hour`, at most
    /// once per local calendar day. Returns `None` when nothing was due.
    pub async fn run_daily_digest_if_due(&mut self, now: DateTime<Utc>) -> Result<Option<DigestReport>> {
        let local_now = self.local(now);
        if local_now.hour() != self.settings.alert_hour {
            return Ok(None);
        }

        let today = local_now.date_naive();
        if self.last_digest == Some(today) {
            tracing::debug!(%today, "Daily digest already sent");
            return Ok(None);
        }

        let report = self.send_daily_digest(now).await?;
        self.last_digest = Some(today);
        Ok(Some(report))
    }

    /// One message per distinct owner listing all of their buildings.
    pub async fn send_daily_digest(&self, now: DateTime<Utc>) -> Result<DigestReport> {
        let sites = self.site_statuses(now)?;

        let mut by_owner: BTreeMap<&str, Vec<&SiteReport>> = BTreeMap::new();
        for site in &sites {
            for email in &site.location.owner_emails {
                by_owner.entry(email.as_str()).or_default().push(site);
            }
        }

        let mut report = DigestReport {
            recipients: by_owner.len(),
            ..Default::default()
        };

        let Some(notifier) = self.notifier.as_deref() else {
            tracing::info!(recipients = report.recipients, "Email not configured, daily digest not sent");
            return Ok(report);
        };

        let date = self.local(now).date_naive();
        let mut deliveries = Deliveries::default();
        for (email, owned) in &by_owner {
            match digest_message(email, date, owned, self.settings.utc_offset) {
                Ok(message) => deliver(notifier, &message, &mut deliveries).await,
                Err(e) => {
                    tracing::warn!(to = %email, error = %e, "Could not render daily digest");
                    deliveries.failed += 1;
                }
            }
        }

        report.sent = deliveries.sent;
        report.failed = deliveries.failed;
        tracing::info!(
            recipients = report.recipients,
            sent = report.sent,
            failed = report.failed,
            "Daily digest finished"
        );
        Ok(report)
    }
}

async fn deliver(notifier: &dyn Notifier, message: &EmailMessage, deliveries: &mut Deliveries) {
    match notifier.send(message).await {
        Ok(()) => deliveries.sent += 1,
        Err(e) => {
            tracing::warn!(
                channel = notifier.channel_name(),
                to = %message.to,
                error = %e,
                "Email delivery failed"
            );
            deliveries.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherWatchError;
    use crate::models::{AlertKind, ForecastSample, Intervention};
    use crate::notify::NotifyError;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockForecast {
        samples: Arc<Mutex<Vec<ForecastSample>>>,
        fail_latitude: Option<f64>,
    }

    impl MockForecast {
        fn set(&self, samples: Vec<ForecastSample>) {
            *self.samples.lock().unwrap() = samples;
        }
    }

    #[async_trait::async_trait]
    impl ForecastSource for MockForecast {
        async fn fetch_forecast(&self, latitude: f64, _longitude: f64) -> Result<Vec<ForecastSample>> {
            if self.fail_latitude == Some(latitude) {
                return Err(WeatherWatchError::DataSourceUnavailable("mock outage".into()));
            }
            Ok(self.samples.lock().unwrap().clone())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[derive(Clone, Default)]
    struct MockNotifier {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
        fail_for: Vec<String>,
    }

    impl MockNotifier {
        fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, message: &EmailMessage) -> std::result::Result<(), NotifyError> {
            if self.fail_for.contains(&message.to) {
                return Err(NotifyError::Smtp("mailbox unavailable".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "mock"
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            alert_hour: 8,
            utc_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_intervention(
            &Intervention::new("wind_alert", "High wind", "Secure loose items.").unwrap(),
        )
        .unwrap();
        db.set_global_rule(&AlertRule::new(AlertKind::Windspeed, ">", 15.0, "wind_alert").unwrap())
            .unwrap();
        db.upsert_location(&Location::new("HQ", &["owner@example.com".into()], -0.12, 51.5).unwrap())
            .unwrap();
        db
    }

    fn monitor(db: &Database, forecast: &MockForecast, notifier: Option<&MockNotifier>) -> Monitor {
        Monitor::new(
            db.clone(),
            Box::new(forecast.clone()),
            notifier.map(|n| Box::new(n.clone()) as Box<dyn Notifier>),
            settings(),
        )
    }

    fn windy_at(ts: DateTime<Utc>) -> Vec<ForecastSample> {
        vec![ForecastSample::new(ts, 20.0, 0.0)]
    }

    #[test]
    fn alert_fires_only_when_leaving_green() {
        use SiteStatus::*;
        assert!(should_send_status_alert(Green, Red));
        assert!(should_send_status_alert(Green, Yellow));
        assert!(should_send_status_alert(Green, Purple));
        assert!(!should_send_status_alert(Green, Green));
        assert!(!should_send_status_alert(Red, Red));
        assert!(!should_send_status_alert(Yellow, Red));
        assert!(!should_send_status_alert(Red, Yellow));
        assert!(!should_send_status_alert(Red, Green));
    }

    #[tokio::test]
    async fn end_to_end_wind_alert() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now()));
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.outcomes_written, 1);
        assert_eq!(report.alerts_sent, 1);

        let outcomes = db.all_outcomes("HQ").unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].intervention_id.as_deref(), Some("wind_alert"));
        assert_eq!(monitor.site_status("HQ", now()).unwrap(), SiteStatus::Red);

        let rules = db.rules_for("HQ").unwrap();
        assert_eq!(
            determine_alert_type(&rules, db.latest_outcome("HQ").unwrap().as_ref()),
            Some(AlertKind::Windspeed)
        );

        let sent = notifier.sent();
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "Weather Alert: HQ is now Alert Today");
        assert!(sent[0].text_body.contains("Triggered by: Windspeed"));
        assert!(sent[0].text_body.contains("Secure loose items."));
    }

    fn windy_then_calm(start: DateTime<Utc>) -> Vec<ForecastSample> {
        (0..24)
            .map(|i| {
                let wind = if i == 0 { 20.0 } else { 3.0 };
                ForecastSample::new(start + Duration::hours(3 * i), wind, 0.0)
            })
            .collect()
    }

    #[tokio::test]
    async fn alert_copy_uses_the_outcome_that_raised_the_status() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        forecast.set(windy_then_calm(now()));
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.outcomes_written, 24);
        assert_eq!(report.alerts_sent, 1);

        let latest = db.latest_outcome("HQ").unwrap().unwrap();
        assert!(!latest.has_alert());

        let sent = notifier.sent();
        assert_eq!(sent[0].subject, "Weather Alert: HQ is now Alert Today");
        assert!(sent[0].text_body.contains("Triggered by: Windspeed"));
        assert!(sent[0].text_body.contains("High wind"));
        assert!(sent[0].text_body.contains("Secure loose items."));
    }

    #[tokio::test]
    async fn deleted_intervention_still_sends_alert() {
        let db = seeded_db();
        db.delete_intervention("wind_alert").unwrap();
        let forecast = MockForecast::default();
        forecast.set(windy_then_calm(now()));
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.alerts_sent, 1);
        assert_eq!(report.alert_failures, 0);

        let sent = notifier.sent();
        assert!(sent[0].text_body.contains("Triggered by: Windspeed"));
        assert!(!sent[0].text_body.contains("High wind"));
    }

    #[tokio::test]
    async fn green_red_red_alerts_once() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now()));
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let first = monitor.run_weather_check_cycle(now()).await.unwrap();
        let second = monitor
            .run_weather_check_cycle(now() + Duration::hours(3))
            .await
            .unwrap();

        assert_eq!(first.alerts_sent, 1);
        assert_eq!(second.alerts_sent, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn yellow_to_red_does_not_alert() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        forecast.set(windy_at(now() + Duration::days(2)));
        let first = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(monitor.site_status("HQ", now()).unwrap(), SiteStatus::Yellow);
        assert_eq!(first.alerts_sent, 1);

        forecast.set(windy_at(now()));
        let second = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(monitor.site_status("HQ", now()).unwrap(), SiteStatus::Red);
        assert_eq!(second.alerts_sent, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn calm_forecast_stays_green_and_silent() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        forecast.set(vec![ForecastSample::new(now(), 3.0, 0.0)]);
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.outcomes_written, 1);
        assert_eq!(report.alerts_sent, 0);
        assert_eq!(monitor.site_status("HQ", now()).unwrap(), SiteStatus::Green);
    }

    #[tokio::test]
    async fn failed_fetch_skips_only_that_building() {
        let db = seeded_db();
        db.upsert_location(&Location::new("B2", &["b2@example.com".into()], 2.35, 48.85).unwrap())
            .unwrap();
        let forecast = MockForecast {
            fail_latitude: Some(48.85),
            ..Default::default()
        };
        forecast.set(windy_at(now()));
        let monitor = monitor(&db, &forecast, None);

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.locations, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.outcomes_written, 1);
        assert!(db.all_outcomes("B2").unwrap().is_empty());
        assert_eq!(db.all_outcomes("HQ").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_forecast_is_skipped() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        let monitor = monitor(&db, &forecast, None);

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(db.all_outcomes("HQ").unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_block_others() {
        let db = seeded_db();
        db.upsert_location(
            &Location::new(
                "HQ",
                &["bad@example.com".into(), "good@example.com".into()],
                -0.12,
                51.5,
            )
            .unwrap(),
        )
        .unwrap();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now()));
        let notifier = MockNotifier {
            fail_for: vec!["bad@example.com".into()],
            ..Default::default()
        };
        let monitor = monitor(&db, &forecast, Some(&notifier));

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.alerts_sent, 1);
        assert_eq!(report.alert_failures, 1);
        assert_eq!(notifier.sent()[0].to, "good@example.com");
    }

    #[tokio::test]
    async fn without_notifier_outcomes_are_still_recorded() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now()));
        let monitor = monitor(&db, &forecast, None);

        let report = monitor.run_weather_check_cycle(now()).await.unwrap();
        assert_eq!(report.outcomes_written, 1);
        assert_eq!(report.alerts_sent, 0);
        assert_eq!(report.alert_failures, 0);
    }

    #[tokio::test]
    async fn digest_groups_sites_per_owner() {
        let db = seeded_db();
        db.upsert_location(
            &Location::new(
                "HQ",
                &["shared@example.com".into(), "hq@example.com".into()],
                -0.12,
                51.5,
            )
            .unwrap(),
        )
        .unwrap();
        db.upsert_location(&Location::new("B2", &["shared@example.com".into()], 2.35, 48.85).unwrap())
            .unwrap();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now()));
        let notifier = MockNotifier::default();
        let monitor = monitor(&db, &forecast, Some(&notifier));
        monitor.run_weather_check_cycle(now()).await.unwrap();
        let before = notifier.sent().len();

        let report = monitor.send_daily_digest(now()).await.unwrap();
        assert_eq!(report.recipients, 2);
        assert_eq!(report.sent, 2);

        let digests = &notifier.sent()[before..];
        let shared = digests.iter().find(|m| m.to == "shared@example.com").unwrap();
        assert!(shared.text_body.contains("HQ"));
        assert!(shared.text_body.contains("B2"));
        let hq_only = digests.iter().find(|m| m.to == "hq@example.com").unwrap();
        assert!(!hq_only.text_body.contains("B2"));
    }

    #[tokio::test]
    async fn digest_runs_at_alert_hour_once_per_day() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        let notifier = MockNotifier::default();
        let mut monitor = monitor(&db, &forecast, Some(&notifier));

        let seven = Utc.with_ymd_and_hms(2024, 6, 10, 7, 0, 0).unwrap();
        assert!(monitor.run_daily_digest_if_due(seven).await.unwrap().is_none());

        let eight = seven + Duration::hours(1);
        let report = monitor.run_daily_digest_if_due(eight).await.unwrap().unwrap();
        assert_eq!(report.sent, 1);

        let later = eight + Duration::minutes(30);
        assert!(monitor.run_daily_digest_if_due(later).await.unwrap().is_none());

        let tomorrow = eight + Duration::days(1);
        assert!(monitor.run_daily_digest_if_due(tomorrow).await.unwrap().is_some());
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn digest_sent_from_any_tick_inside_the_alert_hour() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        let notifier = MockNotifier::default();
        let mut monitor = monitor(&db, &forecast, Some(&notifier));

        // A tick held up by a weather check that ran past the top of the hour.
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 40).unwrap();
        assert!(monitor.run_daily_digest_if_due(late).await.unwrap().is_some());

        let last_minute = Utc.with_ymd_and_hms(2024, 6, 11, 8, 59, 30).unwrap();
        assert!(monitor.run_daily_digest_if_due(last_minute).await.unwrap().is_some());

        let next_minute = last_minute + Duration::minutes(1);
        assert!(monitor.run_daily_digest_if_due(next_minute).await.unwrap().is_none());
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn digest_hour_follows_offset() {
        let db = seeded_db();
        let forecast = MockForecast::default();
        let mut monitor = Monitor::new(
            db,
            Box::new(forecast),
            None,
            MonitorSettings {
                alert_hour: 8,
                utc_offset: FixedOffset::east_opt(2 * 3600).unwrap(),
            },
        );

        let six_utc = Utc.with_ymd_and_hms(2024, 6, 10, 6, 0, 0).unwrap();
        let report = monitor.run_daily_digest_if_due(six_utc).await.unwrap().unwrap();
        assert_eq!(report.recipients, 1);
        assert_eq!(report.sent, 0);
    }

    #[tokio::test]
    async fn site_statuses_cover_every_location() {
        let db = seeded_db();
        db.upsert_location(&Location::new("A1", &["a@example.com".into()], 0.0, 0.0).unwrap())
            .unwrap();
        let forecast = MockForecast::default();
        forecast.set(windy_at(now() + Duration::days(1)));
        let monitor = monitor(&db, &forecast, None);
        monitor.run_weather_check_cycle(now()).await.unwrap();

        let sites = monitor.site_statuses(now()).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].location.building_code, "A1");
        assert_eq!(sites[0].status, SiteStatus::Yellow);
        assert!(sites[1].latest.is_some());
    }
}
