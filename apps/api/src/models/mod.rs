pub mod education;
pub mod experience;
pub mod profile;
pub mod project;
pub mod skill;
pub mod social;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, Row};
use thiserror::Error;

use crate::query::{FieldValue, Fields, Filter, FilterSpec};
use crate::validation::Validate;

pub use education::Education;
pub use experience::WorkExperience;
pub use profile::Profile;
pub use project::Project;
pub use skill::Skill;
pub use social::SocialLink;

/// A profile-owned record type served by the generic CRUD engine.
///
/// Each implementation supplies its schema (`TABLE`, `COLUMNS`, `bind`),
/// its write contract (`Input` validated into `Draft`), its read
/// projections and its filter table.
pub trait Resource:
    Clone + Send + Sync + Unpin + Serialize + Fields + for<'r> FromRow<'r, PgRow> + 'static
{
    /// Unchecked write payload, as deserialised from a request body.
    type Input: DeserializeOwned + Validate<Output = Self::Draft> + Send;
    /// Checked field values ready to be written.
    type Draft: Serialize + Clone + Send + Sync + 'static;
    /// Expanded projection used by list and detail responses.
    type Detail: Serialize + From<Expanded<Self>> + Send;
    /// Reduced projection selected by `summary=true`.
    type Summary: Serialize + for<'a> From<&'a Expanded<Self>> + Send;

    const TABLE: &'static str;
    const LABEL: &'static str;
    /// Writable columns besides `profile_id`, in the order `bind` pushes them.
    const COLUMNS: &'static [&'static str];
    const FILTERS: FilterSpec;

    fn id(&self) -> i64;
    fn profile_id(&self) -> i64;
    fn draft(&self) -> Self::Draft;
    fn from_draft(id: i64, profile_id: i64, draft: Self::Draft) -> Self;
    fn bind(draft: &Self::Draft, values: &mut Separated<'_, 'static, Postgres, &'static str>);

    /// The application-level uniqueness check run before every write.
    fn uniqueness(_profile_id: i64, _draft: &Self::Draft) -> Option<UniqueRule> {
        None
    }

    /// Per-profile key the store keeps unique, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn sql_expr(column: &str) -> String {
        default_sql_expr(column)
    }
}

/// Child tables are aliased `t` and joined to their owner as `p`.
pub fn default_sql_expr(column: &str) -> String {
    match column {
        "profile_name" => "p.name".to_string(),
        other => format!("t.{other}"),
    }
}

/// A uniqueness constraint checked before writing.
#[derive(Debug, Clone)]
pub struct UniqueRule {
    pub field: &'static str,
    pub filter: Filter,
    pub message: String,
}

/// A record joined with its owning profile's display name.
#[derive(Debug, Clone, Serialize)]
pub struct Expanded<R> {
    #[serde(flatten)]
    pub record: R,
    pub profile_name: String,
}

impl<'r, R: FromRow<'r, PgRow>> FromRow<'r, PgRow> for Expanded<R> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            record: R::from_row(row)?,
            profile_name: row.try_get("profile_name")?,
        })
    }
}

impl<R: Fields> Fields for Expanded<R> {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "profile_name" => FieldValue::Text(Some(&self.profile_name)),
            other => self.record.field(other),
        }
    }
}

/// Names the owning profile of a child write, by id or by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
}

impl OwnerRef {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none()
            && self
                .profile_name
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
    }
}

/// Request body of a child write: owner reference plus resource fields.
#[derive(Debug, Deserialize)]
pub struct Payload<I> {
    #[serde(flatten)]
    pub owner: OwnerRef,
    #[serde(flatten)]
    pub fields: I,
}

/// An enumerated field received a value outside its choices.
#[derive(Debug, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidChoice(pub String);

/// Splits a comma-separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" Rust, ,Axum ,PostgreSQL,"),
            vec!["Rust", "Axum", "PostgreSQL"]
        );
    }

    #[test]
    fn test_owner_ref_blank_name_is_empty() {
        let owner: OwnerRef = serde_json::from_value(json!({ "profile_name": "  " })).unwrap();
        assert!(owner.is_empty());
        let owner: OwnerRef = serde_json::from_value(json!({ "profile": 3 })).unwrap();
        assert!(!owner.is_empty());
    }

    #[test]
    fn test_default_sql_expr_maps_owner_name() {
        assert_eq!(default_sql_expr("profile_name"), "p.name");
        assert_eq!(default_sql_expr("degree"), "t.degree");
    }
}
