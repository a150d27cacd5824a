use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

use super::{Expanded, InvalidChoice, Resource, UniqueRule};
use crate::query::{Condition, FieldValue, Fields, Filter, FilterSpec, Literal, Order, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 4] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl TryFrom<String> for SkillLevel {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Skill {
    pub id: i64,
    #[serde(rename = "profile")]
    pub profile_id: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub level: SkillLevel,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub name: String,
    pub level: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDraft {
    pub name: String,
    pub level: SkillLevel,
    pub category: String,
}

impl Validate for SkillInput {
    type Output = SkillDraft;

    fn validate(self) -> Result<SkillDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.required("name", &self.name);
        errors.max_len("name", &name, 100);
        let category = optional_text(self.category).unwrap_or_default();
        errors.max_len("category", &category, 50);
        let level = match optional_text(self.level) {
            None => Some(SkillLevel::Intermediate),
            Some(raw) => match raw.parse::<SkillLevel>() {
                Ok(level) => Some(level),
                Err(e) => {
                    errors.add("level", e.to_string());
                    None
                }
            },
        };

        let Some(level) = level.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };
        Ok(SkillDraft {
            name,
            level,
            category,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SkillDetail {
    #[serde(flatten)]
    pub skill: Expanded<Skill>,
    pub level_display: &'static str,
}

impl From<Expanded<Skill>> for SkillDetail {
    fn from(skill: Expanded<Skill>) -> Self {
        let level_display = skill.record.level.display();
        Self {
            skill,
            level_display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillSummary {
    pub id: i64,
    pub profile_name: String,
    pub name: String,
    pub level: SkillLevel,
    pub level_display: &'static str,
    pub category: String,
}

impl From<&Expanded<Skill>> for SkillSummary {
    fn from(row: &Expanded<Skill>) -> Self {
        let s = &row.record;
        Self {
            id: s.id,
            profile_name: row.profile_name.clone(),
            name: s.name.clone(),
            level: s.level,
            level_display: s.level.display(),
            category: s.category.clone(),
        }
    }
}

impl Fields for Skill {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "profile_id" => FieldValue::Int(self.profile_id),
            "name" => FieldValue::Text(Some(&self.name)),
            "level" => FieldValue::Text(Some(self.level.as_str())),
            "category" => FieldValue::Text(Some(&self.category)),
            _ => FieldValue::Missing,
        }
    }
}

impl Resource for Skill {
    type Input = SkillInput;
    type Draft = SkillDraft;
    type Detail = SkillDetail;
    type Summary = SkillSummary;

    const TABLE: &'static str = "skills";
    const LABEL: &'static str = "Skill";
    const COLUMNS: &'static [&'static str] = &["name", "level", "category"];
    const FILTERS: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("profile_name", Param::Contains("profile_name")),
            ("level", Param::Exact("level")),
            ("category", Param::Contains("category")),
            ("skill_name", Param::Contains("name")),
            ("search", Param::Search(&["name", "category", "profile_name"])),
        ],
        order: &[Order::asc("category"), Order::asc("name")],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn profile_id(&self) -> i64 {
        self.profile_id
    }

    fn draft(&self) -> SkillDraft {
        SkillDraft {
            name: self.name.clone(),
            level: self.level,
            category: self.category.clone(),
        }
    }

    fn from_draft(id: i64, profile_id: i64, d: SkillDraft) -> Self {
        Self {
            id,
            profile_id,
            name: d.name,
            level: d.level,
            category: d.category,
        }
    }

    fn bind(d: &SkillDraft, values: &mut Separated<'_, 'static, Postgres, &'static str>) {
        values
            .push_bind(d.name.clone())
            .push_bind(d.level.as_str())
            .push_bind(d.category.clone());
    }

    fn uniqueness(profile_id: i64, draft: &SkillDraft) -> Option<UniqueRule> {
        Some(UniqueRule {
            field: "name",
            filter: Filter::new()
                .and(Condition::Equals("profile_id", Literal::Int(profile_id)))
                .and(Condition::IEquals("name", draft.name.clone())),
            message: format!("Skill '{}' already exists for this profile.", draft.name),
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: serde_json::Value) -> Result<SkillDraft, ValidationErrors> {
        serde_json::from_value::<SkillInput>(value).unwrap().validate()
    }

    #[test]
    fn test_level_defaults_to_intermediate() {
        let draft = validate(json!({ "name": "Python" })).unwrap();
        assert_eq!(draft.level, SkillLevel::Intermediate);
    }

    #[test]
    fn test_unknown_level_is_a_field_error() {
        let errors = validate(json!({ "name": "Python", "level": "guru" })).unwrap_err();
        assert_eq!(errors.messages("level"), ["\"guru\" is not a valid choice."]);
    }

    #[test]
    fn test_uniqueness_rule_is_case_insensitive() {
        let draft = validate(json!({ "name": "Python", "level": "expert" })).unwrap();
        let rule = Skill::uniqueness(4, &draft).unwrap();
        let existing = Expanded {
            record: Skill::from_draft(
                1,
                4,
                SkillDraft {
                    name: "python".into(),
                    level: SkillLevel::Beginner,
                    category: String::new(),
                },
            ),
            profile_name: "John Doe".into(),
        };
        assert!(rule.filter.matches(&existing));
        assert_eq!(rule.field, "name");
    }

    #[test]
    fn test_detail_carries_level_display() {
        let skill = Skill::from_draft(
            1,
            1,
            SkillDraft {
                name: "Rust".into(),
                level: SkillLevel::Expert,
                category: "Programming".into(),
            },
        );
        let detail = SkillDetail::from(Expanded {
            record: skill,
            profile_name: "John Doe".into(),
        });
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["level"], "expert");
        assert_eq!(value["level_display"], "Expert");
        assert_eq!(value["profile_name"], "John Doe");
        assert_eq!(value["profile"], 1);
    }
}
