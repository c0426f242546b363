use serde::{Deserialize, Serialize};
use validator::Validate;

/// Two independent environmental flags. The gate is open only when both hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WeatherState {
    pub sunny: bool,
    pub rainy: bool,
}

impl WeatherState {
    pub const OPEN: WeatherState = WeatherState { sunny: true, rainy: true };

    pub fn new(sunny: bool, rainy: bool) -> Self {
        Self { sunny, rainy }
    }

    #[inline]
    pub fn is_gate_open(&self) -> bool {
        self.sunny && self.rainy
    }

    pub fn condition(&self) -> SkyCondition {
        match (self.sunny, self.rainy) {
            (true, true) => SkyCondition::Rainbow,
            (true, false) => SkyCondition::SunOnly,
            (false, true) => SkyCondition::RainOnly,
            (false, false) => SkyCondition::Cloudy,
        }
    }
}

/// Human-facing reading of a [`WeatherState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCondition {
    Rainbow,
    SunOnly,
    RainOnly,
    Cloudy,
}

impl SkyCondition {
    pub fn headline(&self) -> &'static str {
        match self {
            SkyCondition::Rainbow => "Perfect Rainbow Weather!",
            SkyCondition::SunOnly => "Only Sunshine Today",
            SkyCondition::RainOnly => "Only Rain is Falling",
            SkyCondition::Cloudy => "Cloudy Skies Ahead",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SkyCondition::Rainbow => {
                "Both sun and rain are present. Love is in the air!"
            }
            SkyCondition::SunOnly => {
                "The sun is shining brightly, but we need some gentle rain for the rainbow moment."
            }
            SkyCondition::RainOnly => {
                "The gentle rain is perfect for romance, but we need some sunshine as well."
            }
            SkyCondition::Cloudy => {
                "The skies are too cloudy for love to bloom right now. We need both sunshine and gentle rain."
            }
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            SkyCondition::Rainbow => "Ready for matchmaking!",
            SkyCondition::SunOnly => "Need some rain",
            SkyCondition::RainOnly => "Need more sunshine",
            SkyCondition::Cloudy => "Waiting for sun and rain",
        }
    }
}

/// Raw static weather document, e.g. `{"sunny": true, "rainy": false, "bonus": 10}`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WeatherDocument {
    pub sunny: bool,
    pub rainy: bool,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub bonus: Option<u32>,
}

/// Validated weather configuration with every optional field resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    pub state: WeatherState,
    pub description: String,
    /// Overrides the scoring weight for the weather bonus when present
    pub bonus: Option<u32>,
}

impl WeatherConfig {
    /// Used whenever the static source cannot be read: gate open, no override
    pub fn fallback() -> Self {
        Self {
            state: WeatherState::OPEN,
            description: SkyCondition::Rainbow.headline().to_string(),
            bonus: None,
        }
    }
}

impl From<WeatherDocument> for WeatherConfig {
    fn from(doc: WeatherDocument) -> Self {
        let state = WeatherState::new(doc.sunny, doc.rainy);
        let description = doc
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| state.condition().headline().to_string());

        Self {
            state,
            description,
            bonus: doc.bonus,
        }
    }
}
