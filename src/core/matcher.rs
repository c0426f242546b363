use crate::models::{Person, MatchResult, ScoringWeights, WeatherState};
use crate::core::{
    filters::{is_eligible_candidate, shared_interests},
    scoring::calculate_compatibility,
};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Errors raised by the match engine
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid requester '{id}': {source}")]
    InvalidRequester {
        id: String,
        #[source]
        source: ValidationErrors,
    },
}

/// Main matching orchestrator - implements the filtering and ranking pipeline
///
/// # Pipeline Stages
/// 1. Archetype / self exclusion
/// 2. Shared interest extraction
/// 3. Scoring
/// 4. Zero-overlap rejection and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    limit: Option<usize>,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights, limit: None }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Cap the number of returned results
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Replace the weather bonus magnitude, e.g. from the static weather document
    pub fn with_weather_bonus(mut self, bonus: u32) -> Self {
        self.weights.weather = bonus;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Find matches for a requester within a candidate pool
    ///
    /// Deterministic in its inputs: the same requester, pool and weather always
    /// produce the same ordered list. An empty pool yields an empty list.
    ///
    /// # Arguments
    /// * `requester` - The user asking for matches
    /// * `pool` - Point-in-time snapshot of all registered users
    /// * `weather` - Current weather, or `None` when gating is not in play
    ///
    /// # Errors
    /// `MatchError::InvalidRequester` when the requester fails validation.
    pub fn find_matches(
        &self,
        requester: &Person,
        pool: &[Person],
        weather: Option<&WeatherState>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        requester
            .validate()
            .map_err(|source| MatchError::InvalidRequester {
                id: requester.id.clone(),
                source,
            })?;

        let gate_open = weather.is_some_and(WeatherState::is_gate_open);

        let mut results: Vec<MatchResult> = pool
            .iter()
            // Stage 1: Opposite archetype, not self
            .filter(|candidate| is_eligible_candidate(requester, candidate))
            // Stage 2 & 3: Shared interests and score
            .filter_map(|candidate| {
                let shared = shared_interests(requester, candidate);

                // Stage 4: No shared interests means no match
                if shared.is_empty() {
                    return None;
                }

                let score = calculate_compatibility(
                    requester,
                    candidate,
                    shared.len(),
                    &self.weights,
                    gate_open,
                );
                tracing::trace!(candidate = %candidate.id, shared = shared.len(), score, "Scored candidate");

                Some(MatchResult {
                    person: candidate.clone(),
                    shared_interests: shared,
                    compatibility_score: score,
                })
            })
            .collect();

        // Stable sort keeps pool order among equal scores
        results.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Archetype;

    fn create_candidate(id: &str, archetype: Archetype, age: u8, interests: &[&str]) -> Person {
        Person {
            id: id.to_string(),
            username: id.to_string(),
            name: format!("User {}", id),
            archetype,
            age,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            diet: "Balanced".to_string(),
            education: String::new(),
            job_title: String::new(),
            created_at: None,
        }
    }

    fn create_requester() -> Person {
        create_candidate("me", Archetype::Fox, 5, &["reading", "music", "hiking"])
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::with_default_weights();
        let requester = create_requester();

        let pool = vec![
            requester.clone(),
            create_candidate("1", Archetype::Chicken, 5, &["reading"]),  // Match
            create_candidate("2", Archetype::Fox, 5, &["reading"]),      // Same archetype
            create_candidate("3", Archetype::Chicken, 5, &["pecking"]),  // Nothing shared
        ];

        let result = matcher.find_matches(&requester, &pool, None).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].person.id, "1");
    }

    #[test]
    fn test_matches_sorted_by_score() {
        let matcher = Matcher::with_default_weights();
        let requester = create_requester();

        let pool = vec![
            create_candidate("1", Archetype::Chicken, 9, &["reading"]),
            create_candidate("2", Archetype::Chicken, 5, &["reading", "music"]),
            create_candidate("3", Archetype::Chicken, 6, &["hiking"]),
        ];

        let result = matcher.find_matches(&requester, &pool, None).unwrap();

        let ids: Vec<&str> = result.iter().map(|m| m.person.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        for i in 1..result.len() {
            assert!(result[i - 1].compatibility_score >= result[i].compatibility_score);
        }
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let matcher = Matcher::with_default_weights();
        let requester = create_requester();

        let pool = vec![
            create_candidate("b", Archetype::Chicken, 5, &["music"]),
            create_candidate("a", Archetype::Chicken, 5, &["reading"]),
        ];

        let result = matcher.find_matches(&requester, &pool, None).unwrap();
        assert_eq!(result[0].person.id, "b");
        assert_eq!(result[1].person.id, "a");
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_default_weights().with_limit(Some(3));
        let requester = create_requester();

        let pool: Vec<Person> = (0..10)
            .map(|i| create_candidate(&i.to_string(), Archetype::Chicken, 5, &["music"]))
            .collect();

        let result = matcher.find_matches(&requester, &pool, None).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_weather_bonus_only_when_gate_open() {
        let matcher = Matcher::with_default_weights();
        let requester = create_requester();
        let pool = vec![create_candidate("1", Archetype::Chicken, 9, &["music"])];

        let closed = WeatherState::new(true, false);
        let open = WeatherState::new(true, true);

        let none = matcher.find_matches(&requester, &pool, None).unwrap();
        let gated = matcher.find_matches(&requester, &pool, Some(&closed)).unwrap();
        let bonus = matcher.find_matches(&requester, &pool, Some(&open)).unwrap();

        assert_eq!(none[0].compatibility_score, 25);
        assert_eq!(gated[0].compatibility_score, 25);
        assert_eq!(bonus[0].compatibility_score, 35);
    }

    #[test]
    fn test_weather_bonus_override() {
        let matcher = Matcher::with_default_weights().with_weather_bonus(30);
        let requester = create_requester();
        let pool = vec![create_candidate("1", Archetype::Chicken, 9, &["music"])];

        let result = matcher
            .find_matches(&requester, &pool, Some(&WeatherState::OPEN))
            .unwrap();
        assert_eq!(result[0].compatibility_score, 55);
    }

    #[test]
    fn test_invalid_requester_rejected() {
        let matcher = Matcher::with_default_weights();
        let mut requester = create_requester();
        requester.id = String::new();

        let err = matcher.find_matches(&requester, &[], None).unwrap_err();
        assert!(matches!(err, MatchError::InvalidRequester { .. }));
    }
}
