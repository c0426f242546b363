use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchResult, Person};

/// Stats strip shown above a ready match list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "totalMatches")]
    pub total_matches: usize,
    #[serde(rename = "interestCount")]
    pub interest_count: usize,
    #[serde(rename = "highestCompatibility")]
    pub highest_compatibility: u8,
}

impl MatchSummary {
    pub fn new(requester: &Person, results: &[MatchResult]) -> Self {
        Self {
            total_matches: results.len(),
            interest_count: requester.interests.len(),
            highest_compatibility: results
                .iter()
                .map(|m| m.compatibility_score)
                .max()
                .unwrap_or(0),
        }
    }
}
