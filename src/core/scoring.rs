use crate::models::{AgeTier, Person, ScoringWeights};
use crate::core::filters::diet_matches_keyword;

/// Calculate a compatibility score (0-100) between requester and candidate
///
/// Scoring formula:
/// score = min(100,
///     shared_interests * interest +    # 25 per shared tag
///     age_bonus(|age gap|) +           # 20 / 10 / 5 for gaps <= 1 / 2 / 3
///     diet +                           # both diets match the keyword
///     education +                      # identical education strings
///     weather                          # only while the gate is open
/// )
///
/// Pure in its inputs; the caller decides whether the weather gate is open.
pub fn calculate_compatibility(
    requester: &Person,
    candidate: &Person,
    shared_count: usize,
    weights: &ScoringWeights,
    gate_open: bool,
) -> u8 {
    // Stage 3a: Shared interests
    let mut score = (shared_count as u64).saturating_mul(weights.interest as u64);

    // Stage 3b: Age proximity
    let gap = requester.age.abs_diff(candidate.age);
    score = score.saturating_add(age_bonus(gap, &weights.age_tiers) as u64);

    // Stage 3c: Diet
    if diet_matches_keyword(&requester.diet, &weights.diet_keyword)
        && diet_matches_keyword(&candidate.diet, &weights.diet_keyword)
    {
        score = score.saturating_add(weights.diet as u64);
    }

    // Stage 3d: Education (exact, case-sensitive, blank never matches)
    if !requester.education.is_empty() && requester.education == candidate.education {
        score = score.saturating_add(weights.education as u64);
    }

    // Stage 3e: Weather
    if gate_open {
        score = score.saturating_add(weights.weather as u64);
    }

    score.min(100) as u8
}

/// Bonus of the first tier whose `max_gap` covers the gap, zero past the last tier
#[inline]
pub fn age_bonus(gap: u8, tiers: &[AgeTier]) -> u32 {
    tiers
        .iter()
        .find(|tier| gap <= tier.max_gap)
        .map(|tier| tier.bonus)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Archetype;

    fn create_test_person(archetype: Archetype, age: u8, diet: &str, education: &str) -> Person {
        Person {
            id: format!("{}_{}", archetype, age),
            username: String::new(),
            name: "Test".to_string(),
            archetype,
            age,
            interests: Default::default(),
            diet: diet.to_string(),
            education: education.to_string(),
            job_title: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn test_age_bonus_tiers() {
        let tiers = ScoringWeights::default().age_tiers;

        assert_eq!(age_bonus(0, &tiers), 20);
        assert_eq!(age_bonus(1, &tiers), 20);
        assert_eq!(age_bonus(2, &tiers), 10);
        assert_eq!(age_bonus(3, &tiers), 5);
        assert_eq!(age_bonus(4, &tiers), 0);
        assert_eq!(age_bonus(200, &tiers), 0);
    }

    #[test]
    fn test_age_bonus_non_increasing() {
        let tiers = ScoringWeights::default().age_tiers;
        for gap in 0..20u8 {
            assert!(age_bonus(gap, &tiers) >= age_bonus(gap + 1, &tiers));
        }
    }

    #[test]
    fn test_full_score_components() {
        let weights = ScoringWeights::default();
        let fox = create_test_person(Archetype::Fox, 5, "Vegetarian", "Forest Academy");
        let hen = create_test_person(Archetype::Chicken, 5, "mostly vegetarian", "Forest Academy");

        // 1 * 25 + 20 + 15 + 10 = 70
        assert_eq!(calculate_compatibility(&fox, &hen, 1, &weights, false), 70);
        // + 10 weather
        assert_eq!(calculate_compatibility(&fox, &hen, 1, &weights, true), 80);
    }

    #[test]
    fn test_education_is_case_sensitive() {
        let weights = ScoringWeights::default();
        let fox = create_test_person(Archetype::Fox, 5, "Omnivore", "Forest Academy");
        let hen = create_test_person(Archetype::Chicken, 9, "Grains", "forest academy");

        assert_eq!(calculate_compatibility(&fox, &hen, 1, &weights, false), 25);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let weights = ScoringWeights::default();
        let fox = create_test_person(Archetype::Fox, 5, "vegetarian", "Forest Academy");
        let hen = create_test_person(Archetype::Chicken, 5, "vegetarian", "Forest Academy");

        assert_eq!(calculate_compatibility(&fox, &hen, 10, &weights, true), 100);
        assert_eq!(calculate_compatibility(&fox, &hen, usize::MAX, &weights, true), 100);
    }
}
