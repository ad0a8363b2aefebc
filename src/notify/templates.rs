//! Plain-text and HTML bodies for the two kinds of email the monitor sends.
//!
//! Bodies are minijinja templates. Templates registered with an `.html`
//! name are rendered with HTML auto-escaping; `.txt` ones are not.

use super::{EmailMessage, NotifyError};
use crate::models::{AlertKind, Intervention, SiteReport, SiteStatus};
use chrono::{FixedOffset, NaiveDate};
use minijinja::Environment;
use serde::Serialize;

const FOOTER: &str = "This is an automated message from the weather alert system.";

const TEMPLATES: &[(&str, &str)] = &[
    (
        "status_change_subject.txt",
        include_str!("templates/status_change_subject.txt"),
    ),
    ("status_change.txt", include_str!("templates/status_change.txt")),
    ("status_change.html", include_str!("templates/status_change.html")),
    ("digest_subject.txt", include_str!("templates/digest_subject.txt")),
    ("digest.txt", include_str!("templates/digest.txt")),
    ("digest.html", include_str!("templates/digest.html")),
];

/// What changed for a building, as needed by the alert email.
#[derive(Debug, Clone)]
pub struct StatusChange<'a> {
    pub building_code: &'a str,
    pub previous: SiteStatus,
    pub current: SiteStatus,
    pub alert_kind: Option<AlertKind>,
    pub intervention: Option<&'a Intervention>,
}

#[derive(Serialize)]
struct StatusChangeContext<'a> {
    building_code: &'a str,
    previous: &'static str,
    current: &'static str,
    color: &'static str,
    description: &'static str,
    alert_kind: Option<&'static str>,
    intervention: Option<InterventionContext<'a>>,
    footer: &'static str,
}

#[derive(Serialize)]
struct InterventionContext<'a> {
    title: &'a str,
    lines: Vec<&'a str>,
}

#[derive(Serialize)]
struct DigestContext<'a> {
    date: String,
    long_date: String,
    alerting: usize,
    sites: Vec<SiteRow<'a>>,
    footer: &'static str,
}

#[derive(Serialize)]
struct SiteRow<'a> {
    building_code: &'a str,
    label: &'static str,
    color: &'static str,
    latest: Option<Reading>,
}

#[derive(Serialize)]
struct Reading {
    windspeed: f64,
    precipitation: f64,
    at: String,
}

fn environment() -> Result<Environment<'static>, NotifyError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("round", round_filter);
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
    }
    Ok(env)
}

fn render<S: Serialize>(env: &Environment<'_>, name: &str, ctx: &S) -> Result<String, NotifyError> {
    env.get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(|e| NotifyError::Template(format!("{}: {}", name, e)))
}

/// Fixed-point formatting, so `20` renders as `20.0` with one decimal.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

pub fn status_change_message(to: &str, change: &StatusChange<'_>) -> Result<EmailMessage, NotifyError> {
    let ctx = StatusChangeContext {
        building_code: change.building_code,
        previous: change.previous.label(),
        current: change.current.label(),
        color: change.current.color(),
        description: change.current.description(),
        alert_kind: change.alert_kind.map(|kind| kind.as_str()),
        intervention: change.intervention.map(|i| InterventionContext {
            title: &i.title,
            lines: i.description.lines().collect(),
        }),
        footer: FOOTER,
    };

    let env = environment()?;
    Ok(EmailMessage {
        to: to.to_string(),
        subject: render(&env, "status_change_subject.txt", &ctx)?.trim().to_string(),
        text_body: render(&env, "status_change.txt", &ctx)?,
        html_body: render(&env, "status_change.html", &ctx)?,
    })
}

/// One summary email listing every site the recipient owns, ordered by
/// building code. Reading times are shown in `offset`.
pub fn digest_message(
    to: &str,
    date: NaiveDate,
    sites: &[&SiteReport],
    offset: FixedOffset,
) -> Result<EmailMessage, NotifyError> {
    let mut sites = sites.to_vec();
    sites.sort_by(|a, b| a.location.building_code.cmp(&b.location.building_code));

    let ctx = DigestContext {
        date: date.format("%Y-%m-%d").to_string(),
        long_date: date.format("%A %d %B %Y").to_string(),
        alerting: sites.iter().filter(|s| !s.status.is_normal()).count(),
        sites: sites.iter().map(|site| site_row(site, offset)).collect(),
        footer: FOOTER,
    };

    let env = environment()?;
    Ok(EmailMessage {
        to: to.to_string(),
        subject: render(&env, "digest_subject.txt", &ctx)?.trim().to_string(),
        text_body: render(&env, "digest.txt", &ctx)?,
        html_body: render(&env, "digest.html", &ctx)?,
    })
}

fn site_row(site: &SiteReport, offset: FixedOffset) -> SiteRow<'_> {
    SiteRow {
        building_code: &site.location.building_code,
        label: site.status.label(),
        color: site.status.color(),
        latest: site.latest.as_ref().map(|latest| Reading {
            windspeed: latest.windspeed,
            precipitation: latest.precipitation,
            at: match latest.timestamp {
                Some(ts) => ts.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string(),
                None => latest.raw_timestamp.clone(),
            },
        }),
    }
}
