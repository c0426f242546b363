// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod session;
pub mod weather;

pub use filters::{is_eligible_candidate, shared_interests, diet_matches_keyword};
pub use matcher::{Matcher, MatchError};
pub use scoring::{calculate_compatibility, age_bonus};
pub use session::{MatchSession, MatchPhase, TriggerOutcome};
pub use weather::{WeatherOracle, WeatherTicker};
