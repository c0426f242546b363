use crate::models::{WeatherConfig, WeatherDocument};
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

/// Reasons the static weather configuration could not be obtained
#[derive(Debug, Error)]
pub enum WeatherSourceError {
    #[error("Weather configuration unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Weather configuration malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Weather configuration invalid: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("No weather source configured")]
    NotConfigured,
}

/// Supplier of the initial weather state
pub trait WeatherSource: Send + Sync {
    fn load(&self) -> Result<WeatherConfig, WeatherSourceError>;
}

/// Parse and validate a weather JSON document
pub fn parse_weather_document(json: &str) -> Result<WeatherConfig, WeatherSourceError> {
    let document: WeatherDocument = serde_json::from_str(json)?;
    document.validate()?;
    Ok(WeatherConfig::from(document))
}

/// Weather document read from disk on every `load`
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WeatherSource for JsonFileSource {
    fn load(&self) -> Result<WeatherConfig, WeatherSourceError> {
        let json = std::fs::read_to_string(&self.path)?;
        tracing::debug!("Read weather document from {}", self.path.display());
        parse_weather_document(&json)
    }
}

/// Weather document bundled as a string
#[derive(Debug, Clone)]
pub struct InlineSource {
    json: String,
}

impl InlineSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl WeatherSource for InlineSource {
    fn load(&self) -> Result<WeatherConfig, WeatherSourceError> {
        parse_weather_document(&self.json)
    }
}

/// Deployments without a static document
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl WeatherSource for NoSource {
    fn load(&self) -> Result<WeatherConfig, WeatherSourceError> {
        Err(WeatherSourceError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherState;
    use std::io::Write;

    #[test]
    fn test_inline_source_parses() {
        let source = InlineSource::new(
            r#"{"sunny": true, "rainy": true, "description": "Sun shower", "bonus": 20}"#,
        );
        let config = source.load().unwrap();

        assert_eq!(config.state, WeatherState::OPEN);
        assert_eq!(config.description, "Sun shower");
        assert_eq!(config.bonus, Some(20));
    }

    #[test]
    fn test_malformed_document() {
        let source = InlineSource::new(r#"{"sunny": "maybe"}"#);
        assert!(matches!(source.load(), Err(WeatherSourceError::Malformed(_))));
    }

    #[test]
    fn test_invalid_bonus() {
        let source = InlineSource::new(r#"{"sunny": true, "rainy": false, "bonus": 101}"#);
        assert!(matches!(source.load(), Err(WeatherSourceError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let source = JsonFileSource::new("/definitely/not/here/weather.json");
        assert!(matches!(source.load(), Err(WeatherSourceError::Unavailable(_))));
    }

    #[test]
    fn test_file_source_reads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sunny": false, "rainy": true}}"#).unwrap();

        let config = JsonFileSource::new(file.path()).load().unwrap();
        assert_eq!(config.state, WeatherState::new(false, true));
    }

    #[test]
    fn test_no_source() {
        assert!(matches!(NoSource.load(), Err(WeatherSourceError::NotConfigured)));
    }
}
