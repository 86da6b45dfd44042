use crate::field::FieldKey;
use std::env;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Home Assistant base URL; empty means readings are only logged.
    pub ha_url: String,
    pub ha_token: String,
    pub log_readings: bool,
    /// Field keys to register, as given; validated at platform setup.
    pub sensors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ha_url: String::new(),
            ha_token: String::new(),
            log_readings: false,
            sensors: all_sensor_names(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            ha_url: env::var("HA_URL").unwrap_or_default(),
            ha_token: env::var("HA_TOKEN").unwrap_or_default(),
            log_readings: parse_bool_safe(env::var("B_ROUTE_LOG_READINGS").ok()),
            sensors: env::var("B_ROUTE_SENSORS")
                .map(|val| parse_list(Some(val)))
                .unwrap_or_else(|_| all_sensor_names()),
        }
    }

    pub fn log_summary(&self) {
        let ha_url = if self.ha_url.is_empty() {
            "none (dry run)"
        } else {
            self.ha_url.as_str()
        };
        tracing::info!(
            ha_url,
            log_readings = self.log_readings,
            sensors = %self.sensors.join(","),
            "B-Route meter config"
        );
    }
}

fn all_sensor_names() -> Vec<String> {
    FieldKey::ALL.iter().map(|key| key.as_str().to_string()).collect()
}

/// Splits a comma separated list, dropping blanks.
fn parse_list(val: Option<String>) -> Vec<String> {
    val.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Safely parses a boolean from an optional string, defaulting to false
fn parse_bool_safe(val: Option<String>) -> bool {
    val.unwrap_or_default()
        .to_ascii_lowercase()
        .parse()
        .unwrap_or_default()
}
