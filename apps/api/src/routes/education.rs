use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;

use super::crud::{for_profile_name, resource_routes, required_param, Params, SearchHit, SearchResults};
use super::extract::Query;
use crate::aggregate::reports::{education_stats, EducationStats};
use crate::errors::AppError;
use crate::models::{Education, Resource};
use crate::query::{matched_columns, Condition, Filter};
use crate::state::AppState;
use crate::store::Stored;

const SEARCH_COLUMNS: &[&str] = &["institution", "degree", "field_of_study", "description"];

pub fn routes() -> Router<AppState> {
    resource_routes::<Education>("/education")
        .route("/education/search", get(search))
        .route("/education/stats", get(stats))
        .route("/profile/:name/education", get(for_profile_name::<Education>))
}

#[derive(Debug, Serialize)]
pub struct OwnerBrief {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct EducationHit {
    pub id: i64,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub profile: OwnerBrief,
}

/// GET /api/v1/education/search?q=
async fn search(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<SearchResults<EducationHit>>, AppError> {
    let q = required_param(&params, "q")?;
    let filter = Education::FILTERS
        .ordered()
        .and(Condition::AnyContains(SEARCH_COLUMNS, q.clone()));
    let rows = Education::repository(&state.stores).list(&filter).await?;
    let results = rows
        .into_iter()
        .map(|row| {
            let match_type = matched_columns(&row, SEARCH_COLUMNS, &q);
            let e = row.record;
            SearchHit {
                item: EducationHit {
                    id: e.id,
                    institution: e.institution,
                    degree: e.degree,
                    field_of_study: e.field_of_study,
                    start_date: e.start_date,
                    end_date: e.end_date,
                    profile: OwnerBrief {
                        id: e.profile_id,
                        name: row.profile_name,
                    },
                },
                match_type,
            }
        })
        .collect();
    Ok(Json(SearchResults::new(q, results)))
}

/// GET /api/v1/education/stats
async fn stats(State(state): State<AppState>) -> Result<Json<EducationStats>, AppError> {
    let rows = state.stores.education.list(&Filter::new()).await?;
    Ok(Json(education_stats(&rows)))
}
