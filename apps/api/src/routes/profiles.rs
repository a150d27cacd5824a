use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use super::crud::{merge_patch, parse_body, required_param, Params, SearchHit, SearchResults};
use super::extract::{JsonBody, Path, Query};
use crate::aggregate::portfolio::{portfolio_stats, PortfolioStats};
use crate::assemble::ComprehensiveProfile;
use crate::errors::AppError;
use crate::lookup::profile_by_name;
use crate::models::profile::{ProfileDraft, ProfileInput, ProfileSummary, EMAIL_EXISTS, PROFILE_FILTERS};
use crate::models::Profile;
use crate::query::{matched_columns, Condition, Filter, Literal};
use crate::state::AppState;
use crate::store::ProfileStore;
use crate::validation::{Validate, ValidationErrors};

const SEARCH_COLUMNS: &[&str] = &["name", "email", "bio"];

/// GET /api/v1/profiles
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<ProfileSummary>>, AppError> {
    let profiles = state
        .stores
        .profiles
        .list_profiles(&PROFILE_FILTERS.build(&params))
        .await?;
    Ok(Json(profiles.iter().map(ProfileSummary::from).collect()))
}

/// POST /api/v1/profiles
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let draft = parse_body::<ProfileInput>(body)?.validate()?;
    let profiles = state.stores.profiles.as_ref();
    check_email(profiles, None, &draft).await?;
    let profile = profiles.insert_profile(&draft).await?;
    info!(id = profile.id, "profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/profiles/:id
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(fetch(&state, id).await?))
}

/// PUT /api/v1/profiles/:id
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Profile>, AppError> {
    fetch(&state, id).await?;
    write(&state, id, body).await
}

/// PATCH /api/v1/profiles/:id
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Profile>, AppError> {
    let existing = fetch(&state, id).await?;
    let base =
        serde_json::to_value(existing.draft()).map_err(|e| AppError::Internal(e.into()))?;
    write(&state, id, merge_patch(base, body)?).await
}

/// DELETE /api/v1/profiles/:id
///
/// Removes everything the profile owns along with it.
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.stores.profiles.delete_profile(id).await? {
        return Err(AppError::not_found("Profile", id));
    }
    info!(id, "profile deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/profiles/:id/comprehensive
pub async fn comprehensive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ComprehensiveProfile>, AppError> {
    let profile = fetch(&state, id).await?;
    Ok(Json(state.assembler.assemble(profile).await?))
}

/// GET /api/v1/profiles/name/:name
pub async fn by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(profile_by_name(state.stores.profiles.as_ref(), &name).await?))
}

/// GET /api/v1/profile/:name
pub async fn comprehensive_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ComprehensiveProfile>, AppError> {
    let profile = profile_by_name(state.stores.profiles.as_ref(), &name).await?;
    Ok(Json(state.assembler.assemble(profile).await?))
}

/// GET /api/v1/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<SearchResults<ProfileSummary>>, AppError> {
    let q = required_param(&params, "q")?;
    let filter = Filter::new().and(Condition::AnyContains(SEARCH_COLUMNS, q.clone()));
    let results = state
        .stores
        .profiles
        .list_profiles(&filter)
        .await?
        .iter()
        .map(|profile| SearchHit {
            match_type: matched_columns(profile, SEARCH_COLUMNS, &q),
            item: ProfileSummary::from(profile),
        })
        .collect();
    Ok(Json(SearchResults::new(q, results)))
}

/// GET /api/v1/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<PortfolioStats>, AppError> {
    let stats = portfolio_stats(state.stores.profiles.as_ref(), state.assembler.siblings()).await?;
    Ok(Json(stats))
}

async fn fetch(state: &AppState, id: i64) -> Result<Profile, AppError> {
    state
        .stores
        .profiles
        .get_profile(id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile", id))
}

async fn write(state: &AppState, id: i64, body: Value) -> Result<Json<Profile>, AppError> {
    let draft = parse_body::<ProfileInput>(body)?.validate()?;
    let profiles = state.stores.profiles.as_ref();
    check_email(profiles, Some(id), &draft).await?;
    let profile = profiles
        .update_profile(id, &draft)
        .await?
        .ok_or_else(|| AppError::not_found("Profile", id))?;
    info!(id, "profile updated");
    Ok(Json(profile))
}

/// Emails are unique across profiles.
async fn check_email(
    profiles: &dyn ProfileStore,
    id: Option<i64>,
    draft: &ProfileDraft,
) -> Result<(), AppError> {
    let filter = Filter::new().and(Condition::Equals("email", Literal::Text(draft.email.clone())));
    let taken = profiles
        .list_profiles(&filter)
        .await?
        .iter()
        .any(|p| Some(p.id) != id);
    if taken {
        return Err(ValidationErrors::single("email", EMAIL_EXISTS).into());
    }
    Ok(())
}
