use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use validator::{Validate, ValidationError};

/// One of the two user categories. Matching always pairs opposites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Fox,
    Chicken,
}

impl Archetype {
    /// The archetype this one is paired with
    pub fn opposite(self) -> Self {
        match self {
            Archetype::Fox => Archetype::Chicken,
            Archetype::Chicken => Archetype::Fox,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Fox => "fox",
            Archetype::Chicken => "chicken",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user as seen by the match engine
///
/// `archetype` and `interests` are required when deserializing, so a person
/// that is missing either never reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Person {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub archetype: Archetype,
    #[validate(range(max = 120))]
    pub age: u8,
    #[serde(rename = "hobbies", alias = "interests")]
    #[validate(custom(function = "validate_interest_tags"))]
    pub interests: BTreeSet<String>,
    #[serde(default)]
    pub diet: String,
    #[serde(default)]
    pub education: String,
    #[serde(rename = "jobTitle", default)]
    pub job_title: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Registration payload; the registry assigns id and timestamp
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPerson {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(rename = "type")]
    pub archetype: Archetype,
    #[validate(range(max = 120))]
    pub age: u8,
    #[serde(rename = "hobbies", default)]
    #[validate(custom(function = "validate_interest_tags"))]
    pub interests: BTreeSet<String>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(rename = "jobTitle", default)]
    pub job_title: Option<String>,
}

fn validate_interest_tags(tags: &BTreeSet<String>) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ValidationError::new("blank_interest_tag"));
    }
    Ok(())
}

/// A candidate paired with what it shares with the requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub person: Person,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: BTreeSet<String>,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: u8,
}

/// Age-gap step: a gap of at most `max_gap` years earns `bonus` points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeTier {
    pub max_gap: u8,
    pub bonus: u32,
}

/// Scoring weights
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringWeights {
    /// Points per shared interest
    pub interest: u32,
    /// Ordered by `max_gap` ascending, bonuses non-increasing
    pub age_tiers: Vec<AgeTier>,
    pub diet_keyword: String,
    pub diet: u32,
    pub education: u32,
    pub weather: u32,
}

impl ScoringWeights {
    /// Check that the age tiers form a non-increasing step function
    pub fn validate_age_tiers(tiers: &[AgeTier]) -> Result<(), String> {
        for pair in tiers.windows(2) {
            if pair[1].max_gap <= pair[0].max_gap {
                return Err(format!(
                    "age tier gaps must be strictly increasing ({} then {})",
                    pair[0].max_gap, pair[1].max_gap
                ));
            }
            if pair[1].bonus > pair[0].bonus {
                return Err(format!(
                    "age tier bonuses must not increase with the gap ({} then {})",
                    pair[0].bonus, pair[1].bonus
                ));
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interest: 25,
            age_tiers: vec![
                AgeTier { max_gap: 1, bonus: 20 },
                AgeTier { max_gap: 2, bonus: 10 },
                AgeTier { max_gap: 3, bonus: 5 },
            ],
            diet_keyword: "vegetarian".to_string(),
            diet: 15,
            education: 10,
            weather: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_opposite() {
        assert_eq!(Archetype::Fox.opposite(), Archetype::Chicken);
        assert_eq!(Archetype::Chicken.opposite(), Archetype::Fox);
    }

    #[test]
    fn test_person_deserializes_original_field_names() {
        let json = r#"{
            "id": "fox_1",
            "username": "rusty",
            "name": "Rusty",
            "type": "fox",
            "age": 4,
            "hobbies": ["hunting", "reading", "reading"],
            "diet": "Omnivore",
            "education": "Forest Academy",
            "furColor": "Red"
        }"#;

        let person: Person = serde_json::from_str(json).unwrap();
        assert_eq!(person.archetype, Archetype::Fox);
        assert_eq!(person.interests.len(), 2);
        assert!(person.validate().is_ok());
    }

    #[test]
    fn test_person_missing_archetype_rejected() {
        let json = r#"{ "id": "x", "age": 3, "hobbies": [] }"#;
        assert!(serde_json::from_str::<Person>(json).is_err());
    }

    #[test]
    fn test_blank_interest_fails_validation() {
        let json = r#"{ "id": "x", "type": "chicken", "age": 3, "hobbies": ["  "] }"#;
        let person: Person = serde_json::from_str(json).unwrap();
        assert!(person.validate().is_err());
    }

    #[test]
    fn test_default_age_tiers_are_valid() {
        let weights = ScoringWeights::default();
        assert!(ScoringWeights::validate_age_tiers(&weights.age_tiers).is_ok());
    }

    #[test]
    fn test_increasing_bonus_rejected() {
        let tiers = vec![
            AgeTier { max_gap: 1, bonus: 5 },
            AgeTier { max_gap: 2, bonus: 10 },
        ];
        assert!(ScoringWeights::validate_age_tiers(&tiers).is_err());
    }
}
