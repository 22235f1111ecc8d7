//! Configuration management for `FireWatch`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::FireWatchError;
use crate::models::Timeframe;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest region radius accepted, in kilometers
pub const MIN_REGION_RADIUS_KM: u32 = 50;
/// Largest region radius accepted, in kilometers
pub const MAX_REGION_RADIUS_KM: u32 = 500;

/// Root configuration structure for the `FireWatch` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireWatchConfig {
    /// Forward and reverse geocoding service
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Current weather API
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Earth Engine remote-sensing platform
    #[serde(default)]
    pub earth_engine: EarthEngineConfig,
    /// Burned-area model artifact
    #[serde(default)]
    pub model: ModelConfig,
    /// Fire feed downloader
    #[serde(default)]
    pub firms: FirmsConfig,
    /// Regional CSV merge
    #[serde(default)]
    pub merge: MergeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default assessment settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Dashboard server
    #[serde(default)]
    pub server: ServerConfig,
}

/// Geocoding service settings (Nominatim-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of the geocoding service
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// User agent sent with every request, required by Nominatim's usage policy
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
    /// Minimum delay between reverse lookups in milliseconds
    #[serde(default = "default_reverse_min_delay")]
    pub reverse_min_delay_ms: u64,
    /// Preferred language for addresses
    #[serde(default = "default_geocoding_language")]
    pub language: String,
}

/// Weather API settings (OpenWeatherMap-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API key
    pub api_key: Option<String>,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Earth Engine REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthEngineConfig {
    /// Cloud project the requests are billed to
    #[serde(default = "default_ee_project")]
    pub project: String,
    /// Base URL of the REST API
    #[serde(default = "default_ee_base_url")]
    pub base_url: String,
    /// Path to a service account key file
    pub service_account_key: Option<String>,
    /// Pre-issued OAuth access token, used instead of a service account
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_ee_timeout")]
    pub timeout_seconds: u32,
}

/// Model artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the serialized tree ensemble
    #[serde(default = "default_model_path")]
    pub path: String,
}

/// Fire feed (FIRMS) download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmsConfig {
    /// Country/sensor/time-window feed URL
    #[serde(default = "default_firms_url")]
    pub url: String,
    /// Basic auth user name
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// File the raw feed is written to
    #[serde(default = "default_firms_output")]
    pub output: String,
    /// Request timeout in seconds
    #[serde(default = "default_firms_timeout")]
    pub timeout_seconds: u32,
}

/// Regional CSV merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Directory holding the regional CSV files
    #[serde(default = "default_merge_input_dir")]
    pub input_dir: String,
    /// Combined output file
    #[serde(default = "default_merge_output")]
    pub output: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default assessment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Location queried when none is given
    #[serde(default = "default_location")]
    pub location: String,
    /// Region radius in kilometers
    #[serde(default = "default_region_radius")]
    pub region_radius_km: u32,
    /// Fire alert timeframe
    #[serde(default)]
    pub timeframe: Timeframe,
    /// Dark base map
    #[serde(default)]
    pub dark_mode: bool,
}

/// Dashboard server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoding_user_agent() -> String {
    "firewatch".to_string()
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_reverse_min_delay() -> u64 {
    1000
}

fn default_geocoding_language() -> String {
    "en".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_ee_project() -> String {
    "wildfiredetector".to_string()
}

fn default_ee_base_url() -> String {
    "https://earthengine.googleapis.com/v1".to_string()
}

fn default_ee_timeout() -> u32 {
    120
}

fn default_model_path() -> String {
    "models/wildfire_rf_model.json".to_string()
}

fn default_firms_url() -> String {
    "https://firms.modaps.eosdis.nasa.gov/api/country/csv/SUOMI_VIIRS_SNPP_NRT/world/1/VIIRS_SNPP_NRT_Global_24h.csv".to_string()
}

fn default_firms_output() -> String {
    "latest_fire_data.csv".to_string()
}

fn default_firms_timeout() -> u32 {
    120
}

fn default_merge_input_dir() -> String {
    "Csv".to_string()
}

fn default_merge_output() -> String {
    "global_fire_testing_data.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_location() -> String {
    "California".to_string()
}

fn default_region_radius() -> u32 {
    MIN_REGION_RADIUS_KM
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_geocoding_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
            reverse_min_delay_ms: default_reverse_min_delay(),
            language: default_geocoding_language(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            project: default_ee_project(),
            base_url: default_ee_base_url(),
            service_account_key: None,
            access_token: None,
            timeout_seconds: default_ee_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl Default for FirmsConfig {
    fn default() -> Self {
        Self {
            url: default_firms_url(),
            username: None,
            password: None,
            output: default_firms_output(),
            timeout_seconds: default_firms_timeout(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir: default_merge_input_dir(),
            output: default_merge_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            region_radius_km: default_region_radius(),
            timeframe: Timeframe::default(),
            dark_mode: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl FireWatchConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // FIREWATCH__WEATHER__API_KEY overrides weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("FIREWATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FireWatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("firewatch").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_geocoding_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.earth_engine.base_url.is_empty() {
            self.earth_engine.base_url = default_ee_base_url();
        }
        if self.earth_engine.timeout_seconds == 0 {
            self.earth_engine.timeout_seconds = default_ee_timeout();
        }
        if self.model.path.is_empty() {
            self.model.path = default_model_path();
        }
        if self.firms.output.is_empty() {
            self.firms.output = default_firms_output();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.region_radius_km == 0 {
            self.defaults.region_radius_km = default_region_radius();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather API", self.weather.timeout_seconds),
            ("Earth Engine", self.earth_engine.timeout_seconds),
            ("Fire feed", self.firms.timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(
                    FireWatchError::config(format!("{name} timeout cannot exceed 300 seconds"))
                        .into(),
                );
            }
        }

        if self.geocoding.reverse_min_delay_ms > 60_000 {
            return Err(
                FireWatchError::config("Reverse geocoding delay cannot exceed 60 seconds").into(),
            );
        }

        let radius = self.defaults.region_radius_km;
        if !(MIN_REGION_RADIUS_KM..=MAX_REGION_RADIUS_KM).contains(&radius) {
            return Err(FireWatchError::config(format!(
                "Region radius must be between {MIN_REGION_RADIUS_KM} and {MAX_REGION_RADIUS_KM} km, got {radius}"
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FireWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FireWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Geocoding", &self.geocoding.base_url),
            ("Weather API", &self.weather.base_url),
            ("Earth Engine", &self.earth_engine.base_url),
            ("Fire feed", &self.firms.url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FireWatchError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(FireWatchError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }
}
