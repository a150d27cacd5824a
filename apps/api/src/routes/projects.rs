use std::collections::BTreeSet;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::crud::{for_profile_name, resource_routes, required_param, select, ListResponse, Params};
use super::extract::{Path, Query};
use crate::aggregate::reports::{project_stats, ProjectStats};
use crate::errors::AppError;
use crate::models::project::ProjectDetail;
use crate::models::{Project, Resource};
use crate::query::{Condition, Filter, Literal, Order};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    resource_routes::<Project>("/projects")
        .route("/projects/featured", get(featured))
        .route("/projects/technology/:technology", get(by_technology))
        .route("/projects/by-skill", get(by_skill))
        .route("/projects/stats", get(stats))
        .route("/profile/:name/projects", get(for_profile_name::<Project>))
}

/// GET /api/v1/projects/featured
async fn featured(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<ListResponse<Project>, AppError> {
    let filter = Filter::new()
        .and(Condition::Equals("is_featured", Literal::Bool(true)))
        .order_by(&[Order::desc("start_date")]);
    select::<Project>(&state, filter, &params).await
}

/// GET /api/v1/projects/technology/:technology
async fn by_technology(
    State(state): State<AppState>,
    Path(technology): Path<String>,
    Query(params): Query<Params>,
) -> Result<ListResponse<Project>, AppError> {
    let filter = Project::FILTERS
        .ordered()
        .and(Condition::Contains("technologies", technology));
    select::<Project>(&state, filter, &params).await
}

#[derive(Debug, Serialize)]
pub struct ProjectsBySkill {
    pub skill: String,
    pub projects_count: usize,
    pub projects: Vec<ProjectDetail>,
}

/// GET /api/v1/projects/by-skill?skill=
///
/// Projects of every profile holding a skill whose name contains `skill`.
async fn by_skill(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<ProjectsBySkill>, AppError> {
    let skill = required_param(&params, "skill")?;
    let holders: BTreeSet<i64> = state
        .stores
        .skills
        .list(&Filter::new().and(Condition::Contains("name", skill.clone())))
        .await?
        .iter()
        .map(|row| row.record.profile_id)
        .collect();

    let projects = if holders.is_empty() {
        Vec::new()
    } else {
        let filter = Project::FILTERS
            .ordered()
            .and(Condition::IdIn("profile_id", holders.into_iter().collect()));
        state.stores.projects.list(&filter).await?
    };
    let projects: Vec<ProjectDetail> = projects.into_iter().map(ProjectDetail::from).collect();
    Ok(Json(ProjectsBySkill {
        skill,
        projects_count: projects.len(),
        projects,
    }))
}

/// GET /api/v1/projects/stats
async fn stats(State(state): State<AppState>) -> Result<Json<ProjectStats>, AppError> {
    let rows = state.stores.projects.list(&Filter::new()).await?;
    Ok(Json(project_stats(&rows)))
}
