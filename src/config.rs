use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::models::{AgeTier, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    /// Static weather document; absent means "no static source"
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub refresh_on_start: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WeatherSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            source: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_on_start: true,
            seed: None,
        }
    }
}

fn default_refresh_interval_secs() -> u64 { 25 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_compute_delay_ms")]
    pub compute_delay_ms: u64,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MatchingSettings {
    pub fn compute_delay(&self) -> Duration {
        Duration::from_millis(self.compute_delay_ms)
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            compute_delay_ms: default_compute_delay_ms(),
            limit: None,
        }
    }
}

fn default_compute_delay_ms() -> u64 { 1000 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_weight")]
    pub interest: u32,
    /// `[max_gap, bonus]` pairs
    #[serde(default = "default_age_tiers")]
    pub age_tiers: Vec<(u8, u32)>,
    #[serde(default = "default_diet_keyword")]
    pub diet_keyword: String,
    #[serde(default = "default_diet_weight")]
    pub diet: u32,
    #[serde(default = "default_education_weight")]
    pub education: u32,
    #[serde(default = "default_weather_weight")]
    pub weather: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interest: default_interest_weight(),
            age_tiers: default_age_tiers(),
            diet_keyword: default_diet_keyword(),
            diet: default_diet_weight(),
            education: default_education_weight(),
            weather: default_weather_weight(),
        }
    }
}

fn default_interest_weight() -> u32 { 25 }
fn default_age_tiers() -> Vec<(u8, u32)> { vec![(1, 20), (2, 10), (3, 5)] }
fn default_diet_keyword() -> String { "vegetarian".to_string() }
fn default_diet_weight() -> u32 { 15 }
fn default_education_weight() -> u32 { 10 }
fn default_weather_weight() -> u32 { 10 }

impl WeightsConfig {
    /// Convert into scoring weights, rejecting age tiers that are not a
    /// non-increasing step function of the gap
    pub fn to_weights(&self) -> Result<ScoringWeights, ConfigError> {
        let age_tiers: Vec<AgeTier> = self
            .age_tiers
            .iter()
            .map(|&(max_gap, bonus)| AgeTier { max_gap, bonus })
            .collect();

        ScoringWeights::validate_age_tiers(&age_tiers).map_err(ConfigError::Message)?;

        Ok(ScoringWeights {
            interest: self.interest,
            age_tiers,
            diet_keyword: self.diet_keyword.clone(),
            diet: self.diet,
            education: self.education,
            weather: self.weather,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_users_path")]
    pub users_path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            users_path: default_users_path(),
        }
    }
}

fn default_users_path() -> PathBuf { PathBuf::from("data/users.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RAINBOW__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RAINBOW__WEATHER__REFRESH_INTERVAL_SECS -> weather.refresh_interval_secs
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> Result<ScoringWeights, ConfigError> {
        self.scoring.weights.to_weights()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("RAINBOW")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default().to_weights().unwrap();
        assert_eq!(weights, ScoringWeights::default());
    }

    #[test]
    fn test_env_overrides_file_logging() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\nformat = \"json\"").unwrap();

        std::env::set_var("RAINBOW__LOGGING__FORMAT", "pretty");
        let settings = Settings::load_from(file.path());
        std::env::remove_var("RAINBOW__LOGGING__FORMAT");

        let settings = settings.unwrap();
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_default_timings() {
        let settings = Settings::default();
        assert_eq!(settings.weather.refresh_interval(), Duration::from_secs(25));
        assert_eq!(settings.matching.compute_delay(), Duration::from_millis(1000));
        assert!(settings.weather.refresh_on_start);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
source = "data/weather.json"
refresh_interval_secs = 5
seed = 99

[matching]
compute_delay_ms = 0
limit = 10

[scoring.weights]
interest = 20
age_tiers = [[1, 25], [2, 20], [3, 15]]
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.weather.source, Some(PathBuf::from("data/weather.json")));
        assert_eq!(settings.weather.seed, Some(99));
        assert_eq!(settings.matching.limit, Some(10));
        assert!(settings.matching.compute_delay().is_zero());

        let weights = settings.scoring_weights().unwrap();
        assert_eq!(weights.interest, 20);
        assert_eq!(weights.age_tiers[0], AgeTier { max_gap: 1, bonus: 25 });
        assert_eq!(weights.diet, 15);
    }

    #[test]
    fn test_increasing_age_tiers_rejected() {
        let config = WeightsConfig {
            age_tiers: vec![(1, 5), (2, 20)],
            ..WeightsConfig::default()
        };
        assert!(config.to_weights().is_err());
    }
}
