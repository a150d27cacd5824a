use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

use super::{split_list, Expanded, Resource};
use crate::query::{FieldValue, Fields, FilterSpec, Order, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "profile")]
    pub profile_id: i64,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub demo_link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
}

impl Project {
    pub fn technologies_joined(&self) -> String {
        self.technologies.join(", ")
    }
}

/// Technologies as sent by clients: `"Rust, Axum"` or `["Rust", "Axum"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TechnologyList {
    Text(String),
    List(Vec<String>),
}

impl TechnologyList {
    fn normalise(self) -> Vec<String> {
        match self {
            TechnologyList::Text(raw) => split_list(&raw),
            TechnologyList::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub technologies: Option<TechnologyList>,
    /// Used only when `technologies` is empty.
    pub technologies_list: Option<Vec<String>>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub demo_link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub demo_link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
}

impl Validate for ProjectInput {
    type Output = ProjectDraft;

    fn validate(self) -> Result<ProjectDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = errors.required("title", &self.title);
        errors.max_len("title", &title, 200);
        let description = errors.required("description", &self.description);

        let mut technologies = self
            .technologies
            .map(TechnologyList::normalise)
            .unwrap_or_default();
        if technologies.is_empty() {
            if let Some(list) = self.technologies_list {
                technologies = TechnologyList::List(list).normalise();
            }
        }
        if technologies.is_empty() {
            errors.add("technologies", "This field is required.");
        }
        errors.max_len("technologies", &technologies.join(", "), 500);

        let mut link = |field: &str, value: Option<String>| {
            let value = optional_text(value);
            if let Some(url) = &value {
                errors.url(field, url);
            }
            value
        };
        let github_link = link("github_link", self.github_link);
        let live_link = link("live_link", self.live_link);
        let demo_link = link("demo_link", self.demo_link);
        errors.date_order(self.start_date, self.end_date);

        errors.into_result()?;
        Ok(ProjectDraft {
            title,
            description,
            technologies,
            github_link,
            live_link,
            demo_link,
            start_date: self.start_date,
            end_date: self.end_date,
            is_featured: self.is_featured,
        })
    }
}

/// Expanded projection keeping the comma-joined `technologies` format.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub id: i64,
    pub profile: i64,
    pub profile_name: String,
    pub title: String,
    pub description: String,
    pub technologies: String,
    pub technologies_list: Vec<String>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub demo_link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
}

impl From<Expanded<Project>> for ProjectDetail {
    fn from(row: Expanded<Project>) -> Self {
        let technologies = row.record.technologies_joined();
        let p = row.record;
        Self {
            id: p.id,
            profile: p.profile_id,
            profile_name: row.profile_name,
            title: p.title,
            description: p.description,
            technologies,
            technologies_list: p.technologies,
            github_link: p.github_link,
            live_link: p.live_link,
            demo_link: p.demo_link,
            start_date: p.start_date,
            end_date: p.end_date,
            is_featured: p.is_featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub profile_name: String,
    pub title: String,
    pub is_featured: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub technology_count: usize,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub demo_link: Option<String>,
}

impl From<&Expanded<Project>> for ProjectSummary {
    fn from(row: &Expanded<Project>) -> Self {
        let p = &row.record;
        Self {
            id: p.id,
            profile_name: row.profile_name.clone(),
            title: p.title.clone(),
            is_featured: p.is_featured,
            start_date: p.start_date,
            end_date: p.end_date,
            technology_count: p.technologies.len(),
            github_link: p.github_link.clone(),
            live_link: p.live_link.clone(),
            demo_link: p.demo_link.clone(),
        }
    }
}

impl Fields for Project {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "profile_id" => FieldValue::Int(self.profile_id),
            "title" => FieldValue::Text(Some(&self.title)),
            "description" => FieldValue::Text(Some(&self.description)),
            "technologies" => FieldValue::List(&self.technologies),
            "github_link" => FieldValue::Text(self.github_link.as_deref()),
            "live_link" => FieldValue::Text(self.live_link.as_deref()),
            "demo_link" => FieldValue::Text(self.demo_link.as_deref()),
            "start_date" => FieldValue::Date(self.start_date),
            "end_date" => FieldValue::Date(self.end_date),
            "is_featured" => FieldValue::Bool(self.is_featured),
            _ => FieldValue::Missing,
        }
    }
}

impl Resource for Project {
    type Input = ProjectInput;
    type Draft = ProjectDraft;
    type Detail = ProjectDetail;
    type Summary = ProjectSummary;

    const TABLE: &'static str = "projects";
    const LABEL: &'static str = "Project";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "technologies",
        "github_link",
        "live_link",
        "demo_link",
        "start_date",
        "end_date",
        "is_featured",
    ];
    const FILTERS: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("profile_name", Param::Contains("profile_name")),
            ("technology", Param::Contains("technologies")),
            ("featured_only", Param::FlagTrue("is_featured")),
            ("has_live_link", Param::FlagPresent("live_link")),
            ("has_github", Param::FlagPresent("github_link")),
            ("search", Param::Search(&["title", "description", "technologies"])),
        ],
        order: &[Order::desc("is_featured"), Order::desc("start_date")],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn profile_id(&self) -> i64 {
        self.profile_id
    }

    fn draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            technologies: self.technologies.clone(),
            github_link: self.github_link.clone(),
            live_link: self.live_link.clone(),
            demo_link: self.demo_link.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_featured: self.is_featured,
        }
    }

    fn from_draft(id: i64, profile_id: i64, d: ProjectDraft) -> Self {
        Self {
            id,
            profile_id,
            title: d.title,
            description: d.description,
            technologies: d.technologies,
            github_link: d.github_link,
            live_link: d.live_link,
            demo_link: d.demo_link,
            start_date: d.start_date,
            end_date: d.end_date,
            is_featured: d.is_featured,
        }
    }

    fn bind(d: &ProjectDraft, values: &mut Separated<'_, 'static, Postgres, &'static str>) {
        values
            .push_bind(d.title.clone())
            .push_bind(d.description.clone())
            .push_bind(d.technologies.clone())
            .push_bind(d.github_link.clone())
            .push_bind(d.live_link.clone())
            .push_bind(d.demo_link.clone())
            .push_bind(d.start_date)
            .push_bind(d.end_date)
            .push_bind(d.is_featured);
    }

    /// The list column is searched through its comma-joined text.
    fn sql_expr(column: &str) -> String {
        match column {
            "technologies" => "array_to_string(t.technologies, ',')".to_string(),
            other => super::default_sql_expr(other),
        }
    }
}
