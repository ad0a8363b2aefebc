use crate::db::Database;
use crate::error::{Result, WeatherWatchError};
use crate::models::{
    parse_email_list, parse_timestamp, AlertKind, AlertRule, Intervention, Location, Operator,
    Outcome, RecordedOutcome,
};
use chrono::SecondsFormat;
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

// Location Queries

impl Database {
    pub fn upsert_location(&self, location: &Location) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO locations (building_code, owner_emails, longitude, latitude)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(building_code) DO UPDATE SET
                    owner_emails = excluded.owner_emails,
                    longitude = excluded.longitude,
                    latitude = excluded.latitude
                "#,
                params![
                    location.building_code,
                    location.joined_emails(),
                    location.longitude,
                    location.latitude,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_location(&self, building_code: &str) -> Result<Option<Location>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM locations WHERE building_code = ?1",
                [building_code],
                row_to_location,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn all_locations(&self) -> Result<Vec<Location>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM locations ORDER BY building_code")?;
            let locations = stmt
                .query_map([], row_to_location)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(locations)
        })
    }

    /// Removes a location together with its outcome log and any rules scoped
    /// to it. Returns how many outcomes were deleted.
    pub fn delete_location(&self, building_code: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM locations WHERE building_code = ?1",
                [building_code],
            )?;
            if removed == 0 {
                return Err(WeatherWatchError::NotFound(format!(
                    "location '{}'",
                    building_code
                )));
            }
            let outcomes = tx.execute(
                "DELETE FROM outcomes WHERE building_code = ?1",
                [building_code],
            )?;
            tx.execute(
                "DELETE FROM alert_rules WHERE building_code = ?1",
                [building_code],
            )?;
            tx.commit()?;
            Ok(outcomes)
        })
    }
}

fn row_to_location(row: &Row) -> rusqlite::Result<Location> {
    let emails: String = row.get("owner_emails")?;
    Ok(Location {
        building_code: row.get("building_code")?,
        owner_emails: parse_email_list(&emails),
        longitude: row.get("longitude")?,
        latitude: row.get("latitude")?,
    })
}

// Intervention Queries

impl Database {
    pub fn upsert_intervention(&self, intervention: &Intervention) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO interventions (id, title, description)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description
                "#,
                params![intervention.id, intervention.title, intervention.description],
            )?;
            Ok(())
        })
    }

    /// Looks up an intervention; outcomes may point at ids that were deleted
    /// since, which simply yields `None`.
    pub fn intervention_by_id(&self, id: &str) -> Result<Option<Intervention>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM interventions WHERE id = ?1",
                [id],
                row_to_intervention,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn all_interventions(&self) -> Result<Vec<Intervention>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM interventions ORDER BY id")?;
            let interventions = stmt
                .query_map([], row_to_intervention)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(interventions)
        })
    }

    pub fn delete_intervention(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM interventions WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(WeatherWatchError::NotFound(format!("intervention '{}'", id)));
            }
            Ok(())
        })
    }
}

fn row_to_intervention(row: &Row) -> rusqlite::Result<Intervention> {
    Ok(Intervention {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
    })
}

// Alert Rule Queries

impl Database {
    /// Stores a rule that applies to every building. There is at most one
    /// global rule per kind; an existing one is replaced.
    pub fn set_global_rule(&self, rule: &AlertRule) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM alert_rules WHERE building_code IS NULL AND alert_kind = ?1",
                [rule.kind.as_str()],
            )?;
            tx.execute(
                r#"
                INSERT INTO alert_rules (building_code, alert_kind, operator, threshold, intervention_id)
                VALUES (NULL, ?1, ?2, ?3, ?4)
                "#,
                params![
                    rule.kind.as_str(),
                    rule.operator.as_str(),
                    rule.threshold,
                    rule.intervention_id,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    /// Appends a rule as given, global or building scoped.
    pub fn add_rule(&self, rule: &AlertRule) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO alert_rules (building_code, alert_kind, operator, threshold, intervention_id)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    rule.building_code,
                    rule.kind.as_str(),
                    rule.operator.as_str(),
                    rule.threshold,
                    rule.intervention_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Rules applicable to a building: global rules plus the building's own,
    /// in insertion order. Order matters for intervention resolution.
    pub fn rules_for(&self, building_code: &str) -> Result<Vec<AlertRule>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM alert_rules WHERE building_code IS NULL OR building_code = ?1 ORDER BY id",
            )?;
            let rules = stmt
                .query_map([building_code], row_to_alert_rule)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rules.into_iter().flatten().collect())
        })
    }

    pub fn all_rules(&self) -> Result<Vec<AlertRule>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM alert_rules ORDER BY id")?;
            let rules = stmt
                .query_map([], row_to_alert_rule)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rules.into_iter().flatten().collect())
        })
    }

    pub fn delete_rule(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM alert_rules WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(WeatherWatchError::NotFound(format!("alert rule {}", id)));
            }
            Ok(())
        })
    }
}

/// Rows with an unknown alert kind are skipped; unknown operators are kept
/// and simply never match.
fn row_to_alert_rule(row: &Row) -> rusqlite::Result<Option<AlertRule>> {
    let id: i64 = row.get("id")?;
    let kind_str: String = row.get("alert_kind")?;
    let operator_str: String = row.get("operator")?;

    let Some(kind) = AlertKind::from_str(&kind_str) else {
        warn!(rule_id = id, alert_kind = %kind_str, "Unknown alert_kind in database, skipping rule");
        return Ok(None);
    };
    let operator = Operator::parse(&operator_str);
    if !operator.is_known() {
        warn!(rule_id = id, operator = %operator_str, "Unknown operator in database, rule will never trigger");
    }

    Ok(Some(AlertRule {
        id: Some(id),
        building_code: row.get("building_code")?,
        kind,
        operator,
        threshold: row.get("threshold")?,
        intervention_id: row.get("intervention_id")?,
    }))
}

// Outcome Queries

impl Database {
    #[cfg(test)]
    pub fn append_outcome(&self, outcome: &Outcome) -> Result<()> {
        self.append_outcomes(std::slice::from_ref(outcome)).map(|_| ())
    }

    /// Appends a cycle's outcomes in one transaction.
    pub fn append_outcomes(&self, outcomes: &[Outcome]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO outcomes
                        (building_code, timestamp, windspeed, precipitation, intervention_id)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )?;
                for outcome in outcomes {
                    stmt.execute(params![
                        outcome.building_code,
                        outcome.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                        outcome.windspeed,
                        outcome.precipitation,
                        outcome.intervention_id,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(outcomes.len())
        })
    }

    /// Every outcome recorded for a building, in insertion order.
    pub fn all_outcomes(&self, building_code: &str) -> Result<Vec<RecordedOutcome>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM outcomes WHERE building_code = ?1 ORDER BY id")?;
            let outcomes = stmt
                .query_map([building_code], row_to_outcome)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(outcomes)
        })
    }

    pub fn latest_outcome(&self, building_code: &str) -> Result<Option<RecordedOutcome>> {
        let outcomes = self.all_outcomes(building_code)?;
        Ok(latest_of(&outcomes).cloned())
    }
}

fn row_to_outcome(row: &Row) -> rusqlite::Result<RecordedOutcome> {
    let raw_timestamp: String = row.get("timestamp")?;
    Ok(RecordedOutcome {
        id: row.get("id")?,
        building_code: row.get("building_code")?,
        timestamp: parse_timestamp(&raw_timestamp),
        raw_timestamp,
        windspeed: row.get("windspeed")?,
        precipitation: row.get("precipitation")?,
        intervention_id: row.get("intervention_id")?,
    })
}

/// Picks the most recent outcome of a log read in insertion order.
///
/// The greatest parsed timestamp wins and the first one read wins a tie.
/// When no timestamp parses at all, the last row read is returned.
pub fn latest_of(outcomes: &[RecordedOutcome]) -> Option<&RecordedOutcome> {
    let mut latest: Option<&RecordedOutcome> = None;
    let mut last_unparsed: Option<&RecordedOutcome> = None;

    for outcome in outcomes {
        match (outcome.timestamp, latest.and_then(|l| l.timestamp)) {
            (Some(ts), Some(best)) if ts > best => latest = Some(outcome),
            (Some(_), None) => latest = Some(outcome),
            (Some(_), Some(_)) => {}
            (None, _) => last_unparsed = Some(outcome),
        }
    }

    latest.or(last_unparsed)
}
