use axum::{extract::State, routing::get, Json, Router};

use super::crud::{for_profile_name, resource_routes};
use crate::aggregate::reports::{experience_stats, ExperienceStats};
use crate::errors::AppError;
use crate::models::WorkExperience;
use crate::query::Filter;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    resource_routes::<WorkExperience>("/experience")
        .route("/experience/stats", get(stats))
        .route("/profile/:name/experience", get(for_profile_name::<WorkExperience>))
}

/// GET /api/v1/experience/stats
async fn stats(State(state): State<AppState>) -> Result<Json<ExperienceStats>, AppError> {
    let rows = state.stores.experience.list(&Filter::new()).await?;
    Ok(Json(experience_stats(&rows)))
}
