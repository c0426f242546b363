// Model exports
pub mod domain;
pub mod responses;
pub mod weather;

pub use domain::{Archetype, Person, NewPerson, MatchResult, AgeTier, ScoringWeights};
pub use responses::MatchSummary;
pub use weather::{WeatherState, SkyCondition, WeatherDocument, WeatherConfig};
