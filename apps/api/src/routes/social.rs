use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use super::crud::{for_profile_name, resource_routes, select, ListResponse, Params};
use super::extract::{Path, Query};
use crate::aggregate::grouped::{links_by_type, LinkTypeGroup};
use crate::aggregate::reports::{social_stats, SocialStats};
use crate::errors::AppError;
use crate::models::social::LinkType;
use crate::models::SocialLink;
use crate::query::{Condition, Filter, Literal, Order};
use crate::state::AppState;

const BY_TYPE_THEN_OWNER: &[Order] = &[Order::asc("link_type"), Order::asc("profile_name")];

pub fn routes() -> Router<AppState> {
    resource_routes::<SocialLink>("/social")
        .route("/social/profile/:name", get(for_profile_name::<SocialLink>))
        .route("/social/type/:link_type", get(by_type))
        .route("/social/grouped", get(grouped))
        .route("/social/professional", get(professional))
        .route("/social/social-media", get(social_media))
        .route("/social/stats", get(stats))
}

/// GET /api/v1/social/type/:link_type
async fn by_type(
    State(state): State<AppState>,
    Path(link_type): Path<String>,
    Query(params): Query<Params>,
) -> Result<ListResponse<SocialLink>, AppError> {
    let filter = Filter::new()
        .and(Condition::Equals("link_type", Literal::Text(link_type)))
        .order_by(&[Order::asc("profile_name")]);
    select::<SocialLink>(&state, filter, &params).await
}

/// GET /api/v1/social/grouped
async fn grouped(State(state): State<AppState>) -> Result<Json<Vec<LinkTypeGroup>>, AppError> {
    let rows = state
        .stores
        .social
        .list(&Filter::new().order_by(BY_TYPE_THEN_OWNER))
        .await?;
    Ok(Json(links_by_type(rows)))
}

async fn of_types(
    state: &AppState,
    types: &[LinkType],
    params: &Params,
) -> Result<ListResponse<SocialLink>, AppError> {
    let wanted = types.iter().map(|t| t.as_str().to_string()).collect();
    let filter = Filter::new()
        .and(Condition::OneOf("link_type", wanted))
        .order_by(BY_TYPE_THEN_OWNER);
    select::<SocialLink>(state, filter, params).await
}

/// GET /api/v1/social/professional
async fn professional(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<ListResponse<SocialLink>, AppError> {
    of_types(&state, &LinkType::PROFESSIONAL, &params).await
}

/// GET /api/v1/social/social-media
async fn social_media(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<ListResponse<SocialLink>, AppError> {
    of_types(&state, &LinkType::SOCIAL_MEDIA, &params).await
}

/// GET /api/v1/social/stats
async fn stats(State(state): State<AppState>) -> Result<Json<SocialStats>, AppError> {
    let rows = state.stores.social.list(&Filter::new()).await?;
    let total_profiles = state.stores.profiles.list_profiles(&Filter::new()).await?.len();
    Ok(Json(social_stats(&rows, total_profiles)))
}
