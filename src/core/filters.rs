use crate::models::Person;
use std::collections::BTreeSet;

/// Check whether a candidate may be proposed to the requester at all
///
/// This is Stage 1 of the matching pipeline: opposite archetype, never self.
#[inline]
pub fn is_eligible_candidate(requester: &Person, candidate: &Person) -> bool {
    candidate.archetype == requester.archetype.opposite() && candidate.id != requester.id
}

/// Interest tags held by both people
#[inline]
pub fn shared_interests(requester: &Person, candidate: &Person) -> BTreeSet<String> {
    requester
        .interests
        .intersection(&candidate.interests)
        .cloned()
        .collect()
}

/// Case-insensitive substring test of a diet descriptor against a keyword
///
/// An empty keyword never matches, so a blank configuration disables the bonus.
#[inline]
pub fn diet_matches_keyword(diet: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    diet.to_lowercase().contains(&keyword.to_lowercase())
}
