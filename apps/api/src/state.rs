use std::sync::Arc;

use crate::assemble::{ProfileAssembler, Siblings};
use crate::config::Config;
use crate::policy::{AccessPolicy, TokenAuthorizer};
use crate::store::Stores;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    /// Builds comprehensive profiles and portfolio stats from the wired-in siblings.
    pub assembler: ProfileAssembler,
    /// Installed once as router middleware; handlers never check access themselves.
    pub policy: AccessPolicy,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        let authorizer = Arc::new(TokenAuthorizer::new(config.admin_token.clone()));
        Self {
            assembler: ProfileAssembler::new(Siblings::all(&stores)),
            policy: AccessPolicy::new(authorizer),
            stores,
            config,
        }
    }
}
