use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

use super::{Expanded, Resource};
use crate::query::{FieldValue, Fields, FilterSpec, Order, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkExperience {
    pub id: i64,
    #[serde(rename = "profile")]
    pub profile_id: i64,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
    pub achievements: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkExperienceInput {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
    pub achievements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkExperienceDraft {
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
    pub achievements: String,
}

impl Validate for WorkExperienceInput {
    type Output = WorkExperienceDraft;

    fn validate(self) -> Result<WorkExperienceDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let company = errors.required("company", &self.company);
        errors.max_len("company", &company, 200);
        let position = errors.required("position", &self.position);
        errors.max_len("position", &position, 100);
        let location = optional_text(self.location).unwrap_or_default();
        errors.max_len("location", &location, 100);
        let description = errors.required("description", &self.description);
        let start_date = errors.required_date("start_date", self.start_date);

        match (self.is_current, self.end_date) {
            (true, Some(_)) => errors.add("end_date", "Cannot have end_date if position is current."),
            (false, None) => errors.add("end_date", "End date is required for non-current positions."),
            _ => {}
        }
        errors.date_order(start_date, self.end_date);

        let Some(start_date) = start_date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };
        Ok(WorkExperienceDraft {
            company,
            position,
            location,
            start_date,
            end_date: self.end_date,
            is_current: self.is_current,
            description,
            achievements: optional_text(self.achievements).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct WorkExperienceSummary {
    pub id: i64,
    pub profile_name: String,
    pub company: String,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

impl From<&Expanded<WorkExperience>> for WorkExperienceSummary {
    fn from(row: &Expanded<WorkExperience>) -> Self {
        let w = &row.record;
        Self {
            id: w.id,
            profile_name: row.profile_name.clone(),
            company: w.company.clone(),
            position: w.position.clone(),
            start_date: w.start_date,
            end_date: w.end_date,
            is_current: w.is_current,
        }
    }
}

impl Fields for WorkExperience {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "profile_id" => FieldValue::Int(self.profile_id),
            "company" => FieldValue::Text(Some(&self.company)),
            "position" => FieldValue::Text(Some(&self.position)),
            "location" => FieldValue::Text(Some(&self.location)),
            "start_date" => FieldValue::Date(Some(self.start_date)),
            "end_date" => FieldValue::Date(self.end_date),
            "is_current" => FieldValue::Bool(self.is_current),
            "description" => FieldValue::Text(Some(&self.description)),
            "achievements" => FieldValue::Text(Some(&self.achievements)),
            _ => FieldValue::Missing,
        }
    }
}

impl Resource for WorkExperience {
    type Input = WorkExperienceInput;
    type Draft = WorkExperienceDraft;
    type Detail = Expanded<WorkExperience>;
    type Summary = WorkExperienceSummary;

    const TABLE: &'static str = "work_experiences";
    const LABEL: &'static str = "Work experience";
    const COLUMNS: &'static [&'static str] = &[
        "company",
        "position",
        "location",
        "start_date",
        "end_date",
        "is_current",
        "description",
        "achievements",
    ];
    const FILTERS: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("profile_name", Param::Contains("profile_name")),
            ("company", Param::Contains("company")),
            ("position", Param::Contains("position")),
            ("current_only", Param::FlagTrue("is_current")),
            (
                "search",
                Param::Search(&["company", "position", "location", "description"]),
            ),
        ],
        order: &[Order::desc("start_date")],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn profile_id(&self) -> i64 {
        self.profile_id
    }

    fn draft(&self) -> WorkExperienceDraft {
        WorkExperienceDraft {
            company: self.company.clone(),
            position: self.position.clone(),
            location: self.location.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_current: self.is_current,
            description: self.description.clone(),
            achievements: self.achievements.clone(),
        }
    }

    fn from_draft(id: i64, profile_id: i64, d: WorkExperienceDraft) -> Self {
        Self {
            id,
            profile_id,
            company: d.company,
            position: d.position,
            location: d.location,
            start_date: d.start_date,
            end_date: d.end_date,
            is_current: d.is_current,
            description: d.description,
            achievements: d.achievements,
        }
    }

    fn bind(d: &WorkExperienceDraft, values: &mut Separated<'_, 'static, Postgres, &'static str>) {
        values
            .push_bind(d.company.clone())
            .push_bind(d.position.clone())
            .push_bind(d.location.clone())
            .push_bind(d.start_date)
            .push_bind(d.end_date)
            .push_bind(d.is_current)
            .push_bind(d.description.clone())
            .push_bind(d.achievements.clone());
    }
}
