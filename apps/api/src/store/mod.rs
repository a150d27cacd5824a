pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::profile::ProfileDraft;
use crate::models::{Education, Expanded, Profile, Project, Resource, Skill, SocialLink, WorkExperience};
use crate::query::Filter;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A store-level unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    #[error("Profile {0} does not exist")]
    MissingProfile(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self, filter: &Filter) -> StoreResult<Vec<Profile>>;
    async fn get_profile(&self, id: i64) -> StoreResult<Option<Profile>>;
    async fn insert_profile(&self, draft: &ProfileDraft) -> StoreResult<Profile>;
    async fn update_profile(&self, id: i64, draft: &ProfileDraft) -> StoreResult<Option<Profile>>;
    /// Removes the profile and every record it owns.
    async fn delete_profile(&self, id: i64) -> StoreResult<bool>;
}

/// Storage for one profile-owned resource. Reads return records joined
/// with their owner's name.
#[async_trait]
pub trait Repository<R: Resource>: Send + Sync {
    async fn list(&self, filter: &Filter) -> StoreResult<Vec<Expanded<R>>>;
    async fn get(&self, id: i64) -> StoreResult<Option<Expanded<R>>>;
    async fn insert(&self, profile_id: i64, draft: &R::Draft) -> StoreResult<Expanded<R>>;
    async fn update(
        &self,
        id: i64,
        profile_id: i64,
        draft: &R::Draft,
    ) -> StoreResult<Option<Expanded<R>>>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// Every repository the service talks to, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub education: Arc<dyn Repository<Education>>,
    pub experience: Arc<dyn Repository<WorkExperience>>,
    pub skills: Arc<dyn Repository<Skill>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub social: Arc<dyn Repository<SocialLink>>,
}

impl Stores {
    pub fn postgres(store: PgStore) -> Self {
        Self::shared(Arc::new(store))
    }

    pub fn memory() -> Self {
        Self::shared(Arc::new(MemoryStore::new()))
    }

    fn shared<S>(store: Arc<S>) -> Self
    where
        S: ProfileStore
            + Repository<Education>
            + Repository<WorkExperience>
            + Repository<Skill>
            + Repository<Project>
            + Repository<SocialLink>
            + 'static,
    {
        Self {
            profiles: store.clone(),
            education: store.clone(),
            experience: store.clone(),
            skills: store.clone(),
            projects: store.clone(),
            social: store,
        }
    }
}

/// Selects a resource's repository out of [`Stores`].
pub trait Stored: Resource {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>>;
}

impl Stored for Education {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>> {
        stores.education.clone()
    }
}

impl Stored for WorkExperience {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>> {
        stores.experience.clone()
    }
}

impl Stored for Skill {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>> {
        stores.skills.clone()
    }
}

impl Stored for Project {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>> {
        stores.projects.clone()
    }
}

impl Stored for SocialLink {
    fn repository(stores: &Stores) -> Arc<dyn Repository<Self>> {
        stores.social.clone()
    }
}
