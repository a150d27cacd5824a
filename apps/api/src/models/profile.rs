use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::query::{FieldValue, Fields, FilterSpec, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

pub const EMAIL_EXISTS: &str = "A profile with this email already exists.";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub bio: String,
}

impl Validate for ProfileInput {
    type Output = ProfileDraft;

    fn validate(self) -> Result<ProfileDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.required("name", &self.name);
        errors.max_len("name", &name, 100);
        let email = errors.required("email", &self.email);
        errors.max_len("email", &email, 254);
        errors.email("email", &email);
        errors.into_result()?;
        Ok(ProfileDraft {
            name,
            email,
            bio: optional_text(self.bio).unwrap_or_default(),
        })
    }
}

/// List projection: the profile without its timestamps.
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bio: String,
}

impl From<&Profile> for ProfileSummary {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            bio: p.bio.clone(),
        }
    }
}

impl Fields for Profile {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "name" => FieldValue::Text(Some(&self.name)),
            "email" => FieldValue::Text(Some(&self.email)),
            "bio" => FieldValue::Text(Some(&self.bio)),
            _ => FieldValue::Missing,
        }
    }
}

pub const PROFILE_FILTERS: FilterSpec = FilterSpec {
    params: &[("search", Param::Search(&["name", "email", "bio"]))],
    order: &[],
};
