pub mod crud;
pub mod docs;
pub mod education;
pub mod experience;
pub mod extract;
pub mod health;
pub mod profiles;
pub mod projects;
pub mod skills;
pub mod social;

use axum::{middleware, routing::get, Router};

use crate::policy::enforce_access;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(docs::api_documentation))
        .route("/profiles", get(profiles::list).post(profiles::create))
        .route(
            "/profiles/:id",
            get(profiles::show)
                .put(profiles::replace)
                .patch(profiles::patch)
                .delete(profiles::destroy),
        )
        .route("/profiles/:id/comprehensive", get(profiles::comprehensive))
        .route("/profiles/name/:name", get(profiles::by_name))
        .route("/profile/:name", get(profiles::comprehensive_by_name))
        .route("/search", get(profiles::search))
        .route("/stats", get(profiles::stats))
        .merge(education::routes())
        .merge(experience::routes())
        .merge(skills::routes())
        .merge(projects::routes())
        .merge(social::routes());

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(
            state.policy.clone(),
            enforce_access,
        ))
        .with_state(state)
}
