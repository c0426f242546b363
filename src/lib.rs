//! Rainbow Match - weather-gated compatibility matching for the fox & chicken dating demo
//!
//! The crate scores foxes against chickens (and vice versa) by shared
//! interests, age proximity, diet and education, and only runs while the
//! weather oracle reports both sunshine and rain.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchError, MatchSession, MatchPhase, TriggerOutcome, WeatherOracle, WeatherTicker};
pub use models::{Archetype, Person, NewPerson, MatchResult, MatchSummary, ScoringWeights, WeatherState, SkyCondition};
pub use services::{UserRegistry, InMemoryRegistry, WeatherSource, JsonFileSource};
