// Service exports
pub mod registry;
pub mod weather_source;

pub use registry::{UserRegistry, InMemoryRegistry, RegistryError};
pub use weather_source::{WeatherSource, WeatherSourceError, JsonFileSource, InlineSource, NoSource, parse_weather_document};
