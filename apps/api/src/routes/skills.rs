use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::crud::{for_profile_name, resource_routes, select, ListResponse, Params};
use super::extract::{Path, Query};
use crate::aggregate::grouped::{skills_by_category, top_skills, SkillCategoryGroup, TopSkill};
use crate::aggregate::reports::{skill_stats, SkillStats};
use crate::errors::AppError;
use crate::models::Skill;
use crate::query::{Condition, Filter, Literal, Order};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    resource_routes::<Skill>("/skills")
        .route("/skills/category/:category", get(by_category))
        .route("/skills/level/:level", get(by_level))
        .route("/skills/grouped", get(grouped))
        .route("/skills/top", get(top))
        .route("/skills/stats", get(stats))
        .route("/profile/:name/skills", get(for_profile_name::<Skill>))
}

/// GET /api/v1/skills/category/:category
async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<Params>,
) -> Result<ListResponse<Skill>, AppError> {
    let filter = Filter::new()
        .and(Condition::Contains("category", category))
        .order_by(&[Order::asc("level"), Order::asc("name")]);
    select::<Skill>(&state, filter, &params).await
}

/// GET /api/v1/skills/level/:level
async fn by_level(
    State(state): State<AppState>,
    Path(level): Path<String>,
    Query(params): Query<Params>,
) -> Result<ListResponse<Skill>, AppError> {
    let filter = Filter::new()
        .and(Condition::Equals("level", Literal::Text(level)))
        .order_by(&[Order::asc("category"), Order::asc("name")]);
    select::<Skill>(&state, filter, &params).await
}

/// GET /api/v1/skills/grouped
async fn grouped(State(state): State<AppState>) -> Result<Json<Vec<SkillCategoryGroup>>, AppError> {
    let filter = Filter::new().order_by(&[Order::asc("category"), Order::asc("name")]);
    let rows = state.stores.skills.list(&filter).await?;
    Ok(Json(skills_by_category(rows)))
}

#[derive(Debug, Serialize)]
pub struct TopSkills {
    pub top_skills: Vec<TopSkill>,
}

/// GET /api/v1/skills/top
async fn top(State(state): State<AppState>) -> Result<Json<TopSkills>, AppError> {
    let rows = state.stores.skills.list(&Filter::new()).await?;
    Ok(Json(TopSkills {
        top_skills: top_skills(&rows),
    }))
}

/// GET /api/v1/skills/stats
async fn stats(State(state): State<AppState>) -> Result<Json<SkillStats>, AppError> {
    let rows = state.stores.skills.list(&Filter::new()).await?;
    Ok(Json(skill_stats(&rows)))
}
