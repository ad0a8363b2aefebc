mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod notify;

use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::Parser;
use crate::cli::{Cli, Commands, InterventionCommand, LocationCommand, RuleCommand};
use crate::config::Config;
use crate::datasources::OpenWeatherMapClient;
use crate::db::Database;
use crate::logic::{Monitor, MonitorSettings, Scheduler};
use crate::models::{AlertKind, AlertRule, Intervention, Location};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Init => {
            Config::setup_interactive().context("interactive setup failed")?;
        }
        Commands::Check => run_check(cli.config, cli.data_dir.as_ref()).await?,
        Commands::Run => {
            let (config, monitor) = build_monitor(cli.config, cli.data_dir.as_ref())?;
            Scheduler::new(monitor, config.schedule.check_interval())
                .run()
                .await;
        }
        Commands::Once => {
            let (_, monitor) = build_monitor(cli.config, cli.data_dir.as_ref())?;
            let report = monitor.run_weather_check_cycle(Utc::now()).await?;
            println!(
                "Checked {} location(s): {} skipped, {} outcome(s) written, {} alert(s) sent, {} failed",
                report.locations,
                report.skipped,
                report.outcomes_written,
                report.alerts_sent,
                report.alert_failures
            );
        }
        Commands::Digest => {
            let (_, monitor) = build_monitor(cli.config, cli.data_dir.as_ref())?;
            let report = monitor.send_daily_digest(Utc::now()).await?;
            println!(
                "Digest: {} recipient(s), {} sent, {} failed",
                report.recipients, report.sent, report.failed
            );
        }
        Commands::Status => {
            let (_, monitor) = build_monitor(cli.config, cli.data_dir.as_ref())?;
            print_status(&monitor)?;
        }
        Commands::Location { action } => {
            let db = open_database(cli.config, cli.data_dir.as_ref())?;
            manage_locations(&db, action)?;
        }
        Commands::Rule { action } => {
            let db = open_database(cli.config, cli.data_dir.as_ref())?;
            manage_rules(&db, action)?;
        }
        Commands::Intervention { action } => {
            let db = open_database(cli.config, cli.data_dir.as_ref())?;
            manage_interventions(&db, action)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(config_override: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = Config::load(config_override).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_monitor(
    config_override: Option<PathBuf>,
    data_dir: Option<&PathBuf>,
) -> anyhow::Result<(Config, Monitor)> {
    let config = load_config(config_override)?;
    let db_path = config.db_path(data_dir)?;
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let forecast = OpenWeatherMapClient::new(config.openweathermap.clone())?;
    let notifier = notify::from_config(config.email.as_ref())
        .context("failed to configure email delivery")?;
    let settings = MonitorSettings::from_config(&config)?;

    let monitor = Monitor::new(db, Box::new(forecast), notifier, settings);
    Ok((config, monitor))
}

/// Management commands only need the store; a missing config falls back to
/// the default data directory.
fn open_database(
    config_override: Option<PathBuf>,
    data_dir: Option<&PathBuf>,
) -> anyhow::Result<Database> {
    let db_path = match Config::load(config_override) {
        Ok(config) => config.db_path(data_dir)?,
        Err(e) => {
            tracing::debug!(error = %e, "No usable config, using default database location");
            Config::data_dir(data_dir)?.join("weatherwatch.db")
        }
    };

    Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

async fn run_check(config_override: Option<PathBuf>, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_override)?;
    println!("Configuration: OK");

    let db_path = config.db_path(data_dir)?;
    let db = Database::open(&db_path)?;
    println!(
        "Database: OK ({}, {} location(s))",
        db.path().display(),
        db.all_locations()?.len()
    );

    let client = OpenWeatherMapClient::new(config.openweathermap.clone())?;
    match client.test_connection().await {
        Ok(true) => println!("OpenWeatherMap: OK"),
        Ok(false) => println!("OpenWeatherMap: FAILED (check api_key)"),
        Err(e) => println!("OpenWeatherMap: OFFLINE ({})", e),
    }

    match notify::from_config(config.email.as_ref()) {
        Ok(Some(notifier)) => println!("Email: configured ({})", notifier.channel_name()),
        Ok(None) => println!("Email: not configured"),
        Err(e) => println!("Email: INVALID ({})", e),
    }

    Ok(())
}

fn print_status(monitor: &Monitor) -> anyhow::Result<()> {
    let sites = monitor.site_statuses(Utc::now())?;
    if sites.is_empty() {
        println!("No locations configured. Add one with `weatherwatch location add`.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:<13} {:>6} {:>8}  {}",
        "BUILDING", "STATUS", "LABEL", "WIND", "PRECIP", "LAST READING"
    );
    for site in sites {
        let (wind, precip, when) = match &site.latest {
            Some(latest) => (
                format!("{:.1}", latest.windspeed),
                format!("{:.1}", latest.precipitation),
                latest.raw_timestamp.clone(),
            ),
            None => ("-".into(), "-".into(), "never".into()),
        };
        println!(
            "{:<12} {:<8} {:<13} {:>6} {:>8}  {}",
            site.location.building_code,
            site.status.as_str(),
            site.status.label(),
            wind,
            precip,
            when
        );
    }
    Ok(())
}

fn manage_locations(db: &Database, action: LocationCommand) -> anyhow::Result<()> {
    match action {
        LocationCommand::Add {
            building_code,
            lat,
            lon,
            owners,
        } => {
            let location = Location::new(&building_code, &owners, lon, lat)?;
            db.upsert_location(&location)?;
            println!(
                "Saved {} ({}, {}) owners: {}",
                location.building_code,
                location.latitude,
                location.longitude,
                location.joined_emails()
            );
        }
        LocationCommand::List => {
            for location in db.all_locations()? {
                println!(
                    "{:<12} lat {:>9.4} lon {:>9.4}  {}",
                    location.building_code,
                    location.latitude,
                    location.longitude,
                    location.joined_emails()
                );
            }
        }
        LocationCommand::Remove { building_code } => {
            let outcomes = db.delete_location(&building_code)?;
            println!("Removed {} and {} outcome(s)", building_code, outcomes);
        }
    }
    Ok(())
}

fn parse_kind(kind: &str) -> anyhow::Result<AlertKind> {
    AlertKind::from_str(kind)
        .ok_or_else(|| anyhow!("unknown alert kind '{}', expected Windspeed or Precipitation", kind))
}

fn manage_rules(db: &Database, action: RuleCommand) -> anyhow::Result<()> {
    match action {
        RuleCommand::Set {
            kind,
            operator,
            threshold,
            intervention,
        } => {
            let rule = AlertRule::new(parse_kind(&kind)?, &operator, threshold, &intervention)?;
            warn_if_unknown_intervention(db, &rule.intervention_id)?;
            let id = db.set_global_rule(&rule)?;
            println!("Global rule {}: {}", id, rule.describe());
        }
        RuleCommand::Add {
            building_code,
            kind,
            operator,
            threshold,
            intervention,
        } => {
            if db.get_location(&building_code)?.is_none() {
                return Err(anyhow!("unknown building '{}'", building_code));
            }
            let rule = AlertRule::new(parse_kind(&kind)?, &operator, threshold, &intervention)?
                .for_building(&building_code);
            warn_if_unknown_intervention(db, &rule.intervention_id)?;
            let id = db.add_rule(&rule)?;
            println!("Rule {} for {}: {}", id, building_code, rule.describe());
        }
        RuleCommand::List => {
            for rule in db.all_rules()? {
                let scope = if rule.is_global() {
                    "(global)"
                } else {
                    rule.building_code.as_deref().unwrap_or_default()
                };
                println!(
                    "{:>4}  {:<12} {}",
                    rule.id.unwrap_or_default(),
                    scope,
                    rule.describe()
                );
            }
        }
        RuleCommand::Remove { id } => {
            db.delete_rule(id)?;
            println!("Removed rule {}", id);
        }
    }
    Ok(())
}

fn warn_if_unknown_intervention(db: &Database, id: &str) -> anyhow::Result<()> {
    if id != models::NO_ALERT && db.intervention_by_id(id)?.is_none() {
        tracing::warn!(intervention = id, "Rule references an intervention that does not exist yet");
    }
    Ok(())
}

fn manage_interventions(db: &Database, action: InterventionCommand) -> anyhow::Result<()> {
    match action {
        InterventionCommand::Add {
            id,
            title,
            description,
        } => {
            let intervention = Intervention::new(&id, &title, &description)?;
            db.upsert_intervention(&intervention)?;
            println!("Saved intervention {}", intervention.id);
        }
        InterventionCommand::List => {
            for intervention in db.all_interventions()? {
                println!("{:<16} {}", intervention.id, intervention.title);
                if !intervention.description.is_empty() {
                    println!("{:<16} {}", "", intervention.description);
                }
            }
        }
        InterventionCommand::Remove { id } => {
            db.delete_intervention(&id)?;
            println!("Removed intervention {}", id);
        }
    }
    Ok(())
}
