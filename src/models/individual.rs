use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A person in the family tree.
///
/// Identity is the integer `id`. `owning_user_id` is the account that created
/// the profile; owners and administrators may edit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    pub is_alive: bool,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub owning_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Individual {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Life span label such as `1901–1970`, `1950–`, or `None` when the birth
    /// date is unknown.
    pub fn life_span(&self) -> Option<String> {
        use chrono::Datelike;

        let birth = self.birth_date?;
        Some(match self.death_date {
            Some(death) => format!("{}–{}", birth.year(), death.year()),
            None => format!("{}–", birth.year()),
        })
    }
}

/// Input for creating a new individual.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIndividualInput {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    /// Defaults to `true` when omitted.
    pub is_alive: Option<bool>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

impl CreateIndividualInput {
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

/// Input for editing an individual. This is a full replacement of the
/// editable fields; omitted optional fields are cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIndividualInput {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    pub is_alive: bool,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

/// Result of adding a child under an existing individual: the new profile and
/// the `child` edge linking it to its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildCreated {
    pub individual: Individual,
    pub relationship: super::Relationship,
}
