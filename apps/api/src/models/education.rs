use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

use super::{Expanded, Resource};
use crate::query::{FieldValue, Fields, FilterSpec, Order, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Education {
    pub id: i64,
    #[serde(rename = "profile")]
    pub profile_id: i64,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub grade: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EducationInput {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationDraft {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub grade: String,
    pub description: String,
}

impl Validate for EducationInput {
    type Output = EducationDraft;

    fn validate(self) -> Result<EducationDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let institution = errors.required("institution", &self.institution);
        errors.max_len("institution", &institution, 200);
        let degree = errors.required("degree", &self.degree);
        errors.max_len("degree", &degree, 100);
        let field_of_study = optional_text(self.field_of_study).unwrap_or_default();
        errors.max_len("field_of_study", &field_of_study, 100);
        let grade = optional_text(self.grade).unwrap_or_default();
        errors.max_len("grade", &grade, 50);
        let start_date = errors.required_date("start_date", self.start_date);
        errors.date_order(start_date, self.end_date);

        let Some(start_date) = start_date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };
        Ok(EducationDraft {
            institution,
            degree,
            field_of_study,
            start_date,
            end_date: self.end_date,
            grade,
            description: optional_text(self.description).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct EducationSummary {
    pub id: i64,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub profile_name: String,
    pub duration: String,
}

impl From<&Expanded<Education>> for EducationSummary {
    fn from(row: &Expanded<Education>) -> Self {
        let e = &row.record;
        Self {
            id: e.id,
            institution: e.institution.clone(),
            degree: e.degree.clone(),
            field_of_study: e.field_of_study.clone(),
            start_date: e.start_date,
            end_date: e.end_date,
            profile_name: row.profile_name.clone(),
            duration: duration_label(e.start_date, e.end_date),
        }
    }
}

/// Human-readable span: 365-day years and 30-day months.
pub fn duration_label(start: NaiveDate, end: Option<NaiveDate>) -> String {
    match end {
        Some(end) => {
            let days = (end - start).num_days().max(0);
            format!("{} years, {} months", days / 365, (days % 365) / 30)
        }
        None => "Ongoing".to_string(),
    }
}

impl Fields for Education {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "profile_id" => FieldValue::Int(self.profile_id),
            "institution" => FieldValue::Text(Some(&self.institution)),
            "degree" => FieldValue::Text(Some(&self.degree)),
            "field_of_study" => FieldValue::Text(Some(&self.field_of_study)),
            "start_date" => FieldValue::Date(Some(self.start_date)),
            "end_date" => FieldValue::Date(self.end_date),
            "grade" => FieldValue::Text(Some(&self.grade)),
            "description" => FieldValue::Text(Some(&self.description)),
            _ => FieldValue::Missing,
        }
    }
}

impl Resource for Education {
    type Input = EducationInput;
    type Draft = EducationDraft;
    type Detail = Expanded<Education>;
    type Summary = EducationSummary;

    const TABLE: &'static str = "education";
    const LABEL: &'static str = "Education";
    const COLUMNS: &'static [&'static str] = &[
        "institution",
        "degree",
        "field_of_study",
        "start_date",
        "end_date",
        "grade",
        "description",
    ];
    const FILTERS: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("profile_name", Param::Contains("profile_name")),
            ("institution", Param::Contains("institution")),
            ("degree", Param::Contains("degree")),
            ("field", Param::Contains("field_of_study")),
            (
                "search",
                Param::Search(&["institution", "degree", "field_of_study", "description"]),
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

    fn draft(&self) -> EducationDraft {
        EducationDraft {
            institution: self.institution.clone(),
            degree: self.degree.clone(),
            field_of_study: self.field_of_study.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            grade: self.grade.clone(),
            description: self.description.clone(),
        }
    }

    fn from_draft(id: i64, profile_id: i64, d: EducationDraft) -> Self {
        Self {
            id,
            profile_id,
            institution: d.institution,
            degree: d.degree,
            field_of_study: d.field_of_study,
            start_date: d.start_date,
            end_date: d.end_date,
            grade: d.grade,
            description: d.description,
        }
    }

    fn bind(d: &EducationDraft, values: &mut Separated<'_, 'static, Postgres, &'static str>) {
        values
            .push_bind(d.institution.clone())
            .push_bind(d.degree.clone())
            .push_bind(d.field_of_study.clone())
            .push_bind(d.start_date)
            .push_bind(d.end_date)
            .push_bind(d.grade.clone())
            .push_bind(d.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> EducationInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_education_trims_fields() {
        let draft = input(json!({
            "institution": " MIT ",
            "degree": "BSc",
            "start_date": "2018-09-01",
            "end_date": "2022-06-30"
        }))
        .validate()
        .unwrap();
        assert_eq!(draft.institution, "MIT");
        assert_eq!(draft.field_of_study, "");
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let errors = input(json!({
            "institution": "MIT",
            "degree": "BSc",
            "start_date": "2022-06-30",
            "end_date": "2018-09-01"
        }))
        .validate()
        .unwrap_err();
        assert_eq!(errors.messages("end_date"), ["Start date must be before end date."]);
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let errors = input(json!({})).validate().unwrap_err();
        assert!(errors.has("institution"));
        assert!(errors.has("degree"));
        assert!(errors.has("start_date"));
    }

    #[test]
    fn test_duration_label() {
        let start = NaiveDate::from_ymd_opt(2018, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 6, 30).unwrap();
        assert_eq!(duration_label(start, Some(end)), "3 years, 10 months");
        assert_eq!(duration_label(start, None), "Ongoing");
    }
}
