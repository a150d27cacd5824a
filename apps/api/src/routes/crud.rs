//! Handlers shared by every profile-owned resource.
//!
//! Each is generic over the resource type and mounted once per resource by
//! [`resource_routes`].

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::extract::{JsonBody, Path, Query};
use crate::assemble::owned_by;
use crate::errors::AppError;
use crate::lookup::{profile_by_name, LookupError};
use crate::models::{Expanded, OwnerRef, Payload, Resource};
use crate::query::{wants_summary, Filter};
use crate::state::AppState;
use crate::store::{Repository, Stored};
use crate::validation::{Validate, ValidationErrors};

pub type Params = HashMap<String, String>;

/// A list response in either projection.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<D, S> {
    Detail(Vec<D>),
    Summary(Vec<S>),
}

pub type ListResponse<R> = Json<Listing<<R as Resource>::Detail, <R as Resource>::Summary>>;

pub fn listing<R: Resource>(rows: Vec<Expanded<R>>, summary: bool) -> ListResponse<R> {
    Json(if summary {
        Listing::Summary(rows.iter().map(R::Summary::from).collect())
    } else {
        Listing::Detail(rows.into_iter().map(R::Detail::from).collect())
    })
}

/// Runs `filter` against a resource and renders the projection `params` asked for.
pub async fn select<R: Stored>(
    state: &AppState,
    filter: Filter,
    params: &Params,
) -> Result<ListResponse<R>, AppError> {
    let rows = R::repository(&state.stores).list(&filter).await?;
    Ok(listing(rows, wants_summary(params)))
}

/// GET /<resource>
pub async fn list<R: Stored>(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<ListResponse<R>, AppError> {
    select::<R>(&state, R::FILTERS.build(&params), &params).await
}

/// GET /<resource>/:id
pub async fn show<R: Stored>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<R::Detail>, AppError> {
    let row = R::repository(&state.stores)
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(R::LABEL, id))?;
    Ok(Json(R::Detail::from(row)))
}

/// POST /<resource>
pub async fn create<R: Stored>(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<R::Detail>), AppError> {
    let payload = parse_payload::<R>(body)?;
    let (owner, draft) = resolve_and_validate::<R>(&state, payload, None).await?;

    let repo = R::repository(&state.stores);
    check_unique::<R>(repo.as_ref(), None, owner, &draft).await?;
    let created = repo.insert(owner, &draft).await?;
    info!(resource = R::TABLE, id = created.record.id(), "created");
    Ok((StatusCode::CREATED, Json(R::Detail::from(created))))
}

/// PUT /<resource>/:id
pub async fn replace<R: Stored>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<R::Detail>, AppError> {
    let existing = fetch::<R>(&state, id).await?;
    write::<R>(&state, id, existing.record.profile_id(), body).await
}

/// PATCH /<resource>/:id
///
/// The patch is laid over the stored record and the result validated as
/// a full write.
pub async fn patch<R: Stored>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<R::Detail>, AppError> {
    let existing = fetch::<R>(&state, id).await?;
    let base = serde_json::to_value(existing.record.draft())
        .map_err(|e| AppError::Internal(e.into()))?;
    let merged = merge_patch(base, body)?;
    write::<R>(&state, id, existing.record.profile_id(), merged).await
}

/// DELETE /<resource>/:id
pub async fn destroy<R: Stored>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !R::repository(&state.stores).delete(id).await? {
        return Err(AppError::not_found(R::LABEL, id));
    }
    info!(resource = R::TABLE, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /profile/:name/<resource>
pub async fn for_profile_name<R: Stored>(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> Result<ListResponse<R>, AppError> {
    let profile = profile_by_name(state.stores.profiles.as_ref(), &name).await?;
    let rows = owned_by(R::repository(&state.stores).as_ref(), profile.id).await?;
    Ok(listing(rows, wants_summary(&params)))
}

/// List, create, detail, replace, patch and delete routes for one resource.
pub fn resource_routes<R: Stored>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .route(
            &format!("{path}/:id"),
            get(show::<R>)
                .put(replace::<R>)
                .patch(patch::<R>)
                .delete(destroy::<R>),
        )
}

async fn fetch<R: Stored>(state: &AppState, id: i64) -> Result<Expanded<R>, AppError> {
    R::repository(&state.stores)
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(R::LABEL, id))
}

async fn write<R: Stored>(
    state: &AppState,
    id: i64,
    current_owner: i64,
    body: Value,
) -> Result<Json<R::Detail>, AppError> {
    let payload = parse_payload::<R>(body)?;
    let (owner, draft) = resolve_and_validate::<R>(state, payload, Some(current_owner)).await?;

    let repo = R::repository(&state.stores);
    check_unique::<R>(repo.as_ref(), Some(id), owner, &draft).await?;
    let updated = repo
        .update(id, owner, &draft)
        .await?
        .ok_or_else(|| AppError::not_found(R::LABEL, id))?;
    info!(resource = R::TABLE, id, "updated");
    Ok(Json(R::Detail::from(updated)))
}

fn parse_payload<R: Resource>(body: Value) -> Result<Payload<R::Input>, AppError> {
    parse_body(body)
}

/// Deserialises a write body; shape errors are reported as validation
/// failures against the keys that caused them.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    let Value::Object(fields) = &body else {
        return Err(ValidationErrors::single("non_field_errors", "Expected a JSON object.").into());
    };
    T::deserialize(&body).map_err(|e| field_errors::<T>(fields, e).into())
}

/// Every input field defaults when absent, so a key that fails on its own
/// is the one to blame. Failures no single key explains stay unattributed.
fn field_errors<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    err: serde_json::Error,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (key, value) in fields {
        let alone = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        if let Err(e) = T::deserialize(&alone) {
            if value.is_null() {
                errors.add(key, "This field may not be null.");
            } else {
                errors.add(key, e.to_string());
            }
        }
    }
    if errors.is_empty() {
        errors.add("non_field_errors", err.to_string());
    }
    errors
}

/// A required, non-blank query parameter.
pub fn required_param(params: &Params, key: &str) -> Result<String, AppError> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(format!("{key} parameter is required")))
}

/// One search result and the columns the query matched in it.
#[derive(Debug, Serialize)]
pub struct SearchHit<T> {
    #[serde(flatten)]
    pub item: T,
    pub match_type: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults<T> {
    pub query: String,
    pub results_count: usize,
    pub results: Vec<SearchHit<T>>,
}

impl<T> SearchResults<T> {
    pub fn new(query: String, results: Vec<SearchHit<T>>) -> Self {
        Self {
            query,
            results_count: results.len(),
            results,
        }
    }
}

/// Overlays the keys of a PATCH body onto the stored record's fields.
pub fn merge_patch(mut base: Value, patch: Value) -> Result<Value, AppError> {
    let Value::Object(patch) = patch else {
        return Err(ValidationErrors::single("non_field_errors", "Expected a JSON object.").into());
    };
    if let Value::Object(fields) = &mut base {
        fields.extend(patch);
    }
    Ok(base)
}

/// Resolves the owner and validates the fields, reporting failures of
/// both together. Without an owner in the payload `fallback` is kept.
async fn resolve_and_validate<R: Resource>(
    state: &AppState,
    payload: Payload<R::Input>,
    fallback: Option<i64>,
) -> Result<(i64, R::Draft), AppError> {
    let owner = resolve_owner(state, &payload.owner).await?;
    let fields = payload.fields.validate();

    let mut errors = ValidationErrors::new();
    let owner = match owner {
        Ok(Some(id)) => Some(id),
        Ok(None) if fallback.is_some() => fallback,
        Ok(None) => {
            errors.add("profile", "This field is required.");
            None
        }
        Err(e) => {
            errors.extend(e);
            None
        }
    };
    match (owner, fields) {
        (Some(owner), Ok(draft)) if errors.is_empty() => Ok((owner, draft)),
        (_, fields) => {
            if let Err(e) = fields {
                errors.extend(e);
            }
            Err(errors.into())
        }
    }
}

/// Maps an owner reference to a profile id. `Ok(Err(_))` carries field
/// errors for an owner that does not resolve.
async fn resolve_owner(
    state: &AppState,
    owner: &OwnerRef,
) -> Result<Result<Option<i64>, ValidationErrors>, AppError> {
    if let Some(id) = owner.profile {
        return Ok(match state.stores.profiles.get_profile(id).await? {
            Some(profile) => Ok(Some(profile.id)),
            None => Err(ValidationErrors::single(
                "profile",
                format!("Invalid pk \"{id}\" - object does not exist."),
            )),
        });
    }
    if owner.is_empty() {
        return Ok(Ok(None));
    }
    let name = owner.profile_name.as_deref().unwrap_or_default().trim();
    match profile_by_name(state.stores.profiles.as_ref(), name).await {
        Ok(profile) => Ok(Ok(Some(profile.id))),
        Err(LookupError::Store(e)) => Err(e.into()),
        Err(LookupError::Missing(_)) => Ok(Err(ValidationErrors::single(
            "profile_name",
            format!("Profile with name '{name}' does not exist"),
        ))),
        Err(e @ LookupError::Ambiguous(..)) => {
            Ok(Err(ValidationErrors::single("profile_name", e.to_string())))
        }
    }
}

/// Rejects a write that would break the resource's uniqueness rule.
/// The store's constraint still guards against concurrent writers.
async fn check_unique<R: Resource>(
    repo: &dyn Repository<R>,
    id: Option<i64>,
    profile_id: i64,
    draft: &R::Draft,
) -> Result<(), AppError> {
    let Some(rule) = R::uniqueness(profile_id, draft) else {
        return Ok(());
    };
    let clashes = repo.list(&rule.filter).await?;
    if clashes.iter().any(|row| Some(row.record.id()) != id) {
        return Err(ValidationErrors::single(rule.field, rule.message).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_overlays_keys() {
        let base = json!({ "name": "Python", "level": "beginner", "category": "" });
        let merged = merge_patch(base, json!({ "level": "expert", "profile": 2 })).unwrap();
        assert_eq!(
            merged,
            json!({ "name": "Python", "level": "expert", "category": "", "profile": 2 })
        );
    }

    #[test]
    fn test_required_param_rejects_blank() {
        let mut params = Params::new();
        params.insert("q".into(), "   ".into());
        let err = required_param(&params, "q").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "q parameter is required"));
        params.insert("q".into(), " MIT ".into());
        assert_eq!(required_param(&params, "q").unwrap(), "MIT");
    }

    #[test]
    fn test_shape_errors_name_the_field() {
        use crate::models::education::EducationInput;
        use crate::models::experience::WorkExperienceInput;

        let err = parse_body::<Payload<WorkExperienceInput>>(json!({
            "profile": 1,
            "company": null,
            "position": "Developer"
        }))
        .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.messages("company"), ["This field may not be null."]);
        assert!(!errors.has("non_field_errors"));
        assert!(!errors.has("position"));

        let err = parse_body::<Payload<EducationInput>>(json!({
            "profile": "one",
            "start_date": "2018-13-45",
            "institution": "MIT"
        }))
        .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert!(errors.has("start_date"));
        assert!(errors.has("profile"));
        assert!(!errors.has("institution"));
    }

    #[test]
    fn test_parse_body_requires_an_object() {
        let err = parse_body::<Payload<crate::models::skill::SkillInput>>(json!("python"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.has("non_field_errors")));
    }

    #[test]
    fn test_merge_patch_rejects_non_objects() {
        assert!(matches!(
            merge_patch(json!({}), json!([1, 2])),
            Err(AppError::Validation(_))
        ));
    }
}
