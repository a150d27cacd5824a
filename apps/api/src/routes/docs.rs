use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/v1
/// Describes the public API and its access policy.
pub async fn api_documentation(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "title": "Personal Portfolio API",
        "description": "Public API for viewing professional portfolio details. Read access is public, write access requires admin privileges.",
        "version": env!("CARGO_PKG_VERSION"),
        "access_policy": {
            "read_access": "Public - Anyone can view portfolio data",
            "write_access": "Admin only - Send 'Authorization: Bearer <token>' to create/update/delete data",
            "write_access_enabled": state.config.admin_token.is_some(),
        },
        "endpoints": {
            "profiles": {
                "GET /api/v1/profiles": "List all profiles",
                "POST /api/v1/profiles": "Create new profile (admin only)",
                "GET /api/v1/profiles/{id}": "Get specific profile",
                "PUT /api/v1/profiles/{id}": "Update profile (admin only)",
                "PATCH /api/v1/profiles/{id}": "Partially update profile (admin only)",
                "DELETE /api/v1/profiles/{id}": "Delete profile and all of its data (admin only)",
                "GET /api/v1/profiles/{id}/comprehensive": "Get profile with all related data",
                "GET /api/v1/profile/{name}": "Get comprehensive profile by name",
                "GET /api/v1/profiles/name/{name}": "Get basic profile by name",
            },
            "resources": {
                "/api/v1/education": "Education records; also /search?q= and /stats",
                "/api/v1/experience": "Work experience; also /stats",
                "/api/v1/skills": "Skills; also /category/{category}, /level/{level}, /grouped, /top and /stats",
                "/api/v1/projects": "Projects; also /featured, /technology/{technology}, /by-skill?skill= and /stats",
                "/api/v1/social": "Social links; also /profile/{name}, /type/{link_type}, /grouped, /professional, /social-media and /stats",
                "/api/v1/profile/{name}/{resource}": "One profile's education, experience, skills or projects",
            },
            "query_endpoints": {
                "GET /api/v1/projects/by-skill?skill=python": "Projects of profiles having a skill",
                "GET /api/v1/skills/top": "Top skills by usage",
                "GET /api/v1/search?q=keyword": "Search across profiles",
            },
            "statistics": {
                "GET /api/v1/stats": "Portfolio statistics",
            },
        },
        "conventions": {
            "summary": "List endpoints accept summary=true for a reduced projection",
            "errors": "Failures return {\"error\", \"code\"} plus \"fields\" for validation errors",
        },
    }))
}
