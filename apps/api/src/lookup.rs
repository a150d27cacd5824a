use thiserror::Error;

use crate::errors::AppError;
use crate::models::Profile;
use crate::query::{Condition, Filter};
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Profile with name \"{0}\" does not exist")]
    Missing(String),

    #[error("Profile name \"{0}\" is ambiguous: {1} profiles match")]
    Ambiguous(String, usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Store(e) => e.into(),
            other => AppError::NotFound(other.to_string()),
        }
    }
}

/// Resolves a profile by case-insensitive exact name. More than one
/// match is an error rather than an arbitrary pick.
pub async fn profile_by_name(
    profiles: &dyn ProfileStore,
    name: &str,
) -> Result<Profile, LookupError> {
    let name = name.trim();
    let filter = Filter::new().and(Condition::IEquals("name", name.to_string()));
    let mut matches = profiles.list_profiles(&filter).await?;
    match matches.len() {
        0 => Err(LookupError::Missing(name.to_string())),
        1 => Ok(matches.remove(0)),
        n => Err(LookupError::Ambiguous(name.to_string(), n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileDraft;
    use crate::store::MemoryStore;

    async fn store_with(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, name) in names.iter().enumerate() {
            store
                .insert_profile(&ProfileDraft {
                    name: name.to_string(),
                    email: format!("user{i}@example.com"),
                    bio: String::new(),
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let store = store_with(&["John Doe", "Jane Roe"]).await;
        let profile = profile_by_name(&store, "john doe").await.unwrap();
        assert_eq!(profile.name, "John Doe");
    }

    #[tokio::test]
    async fn test_missing_name_is_reported() {
        let store = store_with(&["John Doe"]).await;
        let err = profile_by_name(&store, "Nonexistent").await.unwrap_err();
        assert_eq!(err.to_string(), "Profile with name \"Nonexistent\" does not exist");
    }

    #[tokio::test]
    async fn test_duplicate_names_are_ambiguous() {
        let store = store_with(&["John Doe", "JOHN DOE"]).await;
        let err = profile_by_name(&store, "John Doe").await.unwrap_err();
        assert!(matches!(err, LookupError::Ambiguous(_, 2)));
        assert!(matches!(AppError::from(err), AppError::NotFound(msg) if msg.contains("ambiguous")));
    }
}
