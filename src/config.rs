use crate::error::{Result, WeatherWatchError};
use chrono::FixedOffset;
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `WEATHERWATCH__SCHEDULE__ALERT_HOUR=9`.
const ENV_PREFIX: &str = "WEATHERWATCH";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub openweathermap: OpenWeatherMapConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default)]
    pub units: Units,
    /// Number of 3-hour forecast points requested per call.
    #[serde(default = "default_forecast_count")]
    pub forecast_count: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_forecast_count() -> u32 {
    24
}

fn default_timeout_secs() -> u64 {
    10
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("units", &self.units)
            .field("forecast_count", &self.forecast_count)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u64,
    /// Local hour (0-23) at which the daily digest goes out.
    #[serde(default = "default_alert_hour")]
    pub alert_hour: u32,
    /// Offset of the local day used for status windows and the digest hour.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

fn default_check_interval_hours() -> u64 {
    3
}

fn default_alert_hour() -> u32 {
    8
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_hours: default_check_interval_hours(),
            alert_hour: default_alert_hour(),
            utc_offset_hours: 0,
        }
    }
}

impl ScheduleConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours.max(1) * 3600)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(WeatherWatchError::Config(format!(
                "utc_offset_hours must be between -12 and 14, got {}",
                self.utc_offset_hours
            )));
        }
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            WeatherWatchError::Config(format!(
                "invalid utc_offset_hours {}",
                self.utc_offset_hours
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// Sender mailbox, e.g. `Weather Alerts <alerts@example.com>`.
    pub sender: String,
    pub transport: EmailTransport,
    /// Upper bound for one delivery attempt, SMTP or HTTP.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EmailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Smtp(SmtpConfig),
    Resend(ResendConfig),
}

#[derive(Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ResendConfig {
    pub api_key: String,
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(WeatherWatchError::Config(format!(
                "Config file not found at {:?}. Run `weatherwatch init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| WeatherWatchError::Config(format!("Failed to read config: {}", e)))?;

        let config_str = Self::substitute_env_vars(&config_str)?;

        let layered = ::config::Config::builder()
            .add_source(::config::File::from_str(&config_str, ::config::FileFormat::Yaml))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WeatherWatchError::Config(format!("Failed to parse config: {}", e)))?;

        let config: Config = layered
            .try_deserialize()
            .map_err(|e| WeatherWatchError::Config(format!("Invalid config: {}", e)))?;

        tracing::debug!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Checks the settings a running monitor cannot do without.
    pub fn validate(&self) -> Result<()> {
        if self.openweathermap.api_key.trim().is_empty() {
            return Err(WeatherWatchError::Config(
                "openweathermap.api_key is required".into(),
            ));
        }
        if self.openweathermap.forecast_count == 0 {
            return Err(WeatherWatchError::Config(
                "openweathermap.forecast_count must be at least 1".into(),
            ));
        }
        if self.schedule.alert_hour > 23 {
            return Err(WeatherWatchError::Config(format!(
                "schedule.alert_hour must be 0-23, got {}",
                self.schedule.alert_hour
            )));
        }
        if self.schedule.check_interval_hours == 0 {
            return Err(WeatherWatchError::Config(
                "schedule.check_interval_hours must be at least 1".into(),
            ));
        }
        self.schedule.utc_offset()?;
        if matches!(&self.email, Some(email) if email.timeout_secs == 0) {
            return Err(WeatherWatchError::Config(
                "email.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let default_path = Self::default_config_path()?;
        Ok(default_path)
    }

    /// Default path for writing new config files (~/.config/weatherwatch/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WeatherWatchError::Config("Cannot determine config directory".into()))?
            .join("weatherwatch");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up weatherwatch!");
        println!();

        println!("OpenWeatherMap");
        let api_key: String = Password::new()
            .with_prompt("  API key (or ${VAR} placeholder)")
            .interact()
            .map_err(input_error)?;

        let units_idx = Select::new()
            .with_prompt("  Units")
            .items(&["metric", "imperial", "standard"])
            .default(0)
            .interact()
            .map_err(input_error)?;
        let units = [Units::Metric, Units::Imperial, Units::Standard][units_idx];

        println!();
        println!("Schedule");
        let check_interval_hours: u64 = Input::new()
            .with_prompt("  Weather check interval (hours)")
            .default(default_check_interval_hours())
            .interact_text()
            .map_err(input_error)?;

        let alert_hour: u32 = Input::new()
            .with_prompt("  Daily digest hour (0-23)")
            .default(default_alert_hour())
            .validate_with(|h: &u32| if *h < 24 { Ok(()) } else { Err("must be 0-23") })
            .interact_text()
            .map_err(input_error)?;

        let utc_offset_hours: i32 = Input::new()
            .with_prompt("  Local UTC offset (hours)")
            .default(0)
            .interact_text()
            .map_err(input_error)?;

        println!();
        println!("Email notifications");
        let transport_idx = Select::new()
            .with_prompt("  Delivery")
            .items(&["disabled", "SMTP", "Resend API"])
            .default(0)
            .interact()
            .map_err(input_error)?;

        let email = match transport_idx {
            0 => None,
            idx => {
                let sender: String = Input::new()
                    .with_prompt("  Sender address")
                    .interact_text()
                    .map_err(input_error)?;

                let transport = if idx == 1 {
                    let host: String = Input::new()
                        .with_prompt("  SMTP host")
                        .interact_text()
                        .map_err(input_error)?;
                    let port: u16 = Input::new()
                        .with_prompt("  SMTP port")
                        .default(default_smtp_port())
                        .interact_text()
                        .map_err(input_error)?;
                    let username: String = Input::new()
                        .with_prompt("  SMTP username (blank for none)")
                        .default(String::new())
                        .allow_empty(true)
                        .interact_text()
                        .map_err(input_error)?;
                    let password: String = Password::new()
                        .with_prompt("  SMTP password")
                        .allow_empty_password(true)
                        .interact()
                        .map_err(input_error)?;

                    EmailTransport::Smtp(SmtpConfig {
                        host,
                        port,
                        username: Some(username).filter(|u| !u.is_empty()),
                        password: Some(password).filter(|p| !p.is_empty()),
                        use_tls: true,
                    })
                } else {
                    let api_key: String = Password::new()
                        .with_prompt("  Resend API key")
                        .interact()
                        .map_err(input_error)?;
                    EmailTransport::Resend(ResendConfig { api_key })
                };

                Some(EmailConfig {
                    sender,
                    transport,
                    timeout_secs: default_timeout_secs(),
                })
            }
        };

        let config = Config {
            openweathermap: OpenWeatherMapConfig {
                api_key,
                units,
                forecast_count: default_forecast_count(),
                timeout_secs: default_timeout_secs(),
            },
            schedule: ScheduleConfig {
                check_interval_hours,
                alert_hour,
                utc_offset_hours,
            },
            email,
            database: DatabaseConfig::default(),
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)?;
        let content = format!(
            "# weatherwatch configuration\n# Generated by `weatherwatch init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!();
        println!("Configuration saved to {}", config_path.display());

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WeatherWatchError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("WEATHERWATCH_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| WeatherWatchError::Config("Cannot determine data directory".into()))?
            .join("weatherwatch");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    /// Database file: `database.path` from the config wins, then the data dir.
    pub fn db_path(&self, data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir(data_dir_override)?.join("weatherwatch.db")),
        }
    }
}

fn input_error(e: dialoguer::Error) -> WeatherWatchError {
    WeatherWatchError::Config(format!("Input error: {}", e))
}
