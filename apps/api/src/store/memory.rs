use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{ProfileStore, Repository, StoreError, StoreResult};
use crate::models::profile::{ProfileDraft, EMAIL_EXISTS};
use crate::models::{
    Education, Expanded, Profile, Project, Resource, Skill, SocialLink, WorkExperience,
};
use crate::query::Filter;

#[derive(Default)]
pub struct Tables {
    sequences: HashMap<&'static str, i64>,
    profiles: Vec<Profile>,
    education: Vec<Education>,
    experience: Vec<WorkExperience>,
    skills: Vec<Skill>,
    projects: Vec<Project>,
    social: Vec<SocialLink>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn profile_name(&self, id: i64) -> Option<&str> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.profiles
            .iter()
            .any(|p| p.email == email && Some(p.id) != except)
    }
}

/// Binds a resource to its table inside [`Tables`].
pub trait Tabled: Resource {
    fn rows(tables: &Tables) -> &Vec<Self>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;
}

macro_rules! tabled {
    ($ty:ty, $field:ident) => {
        impl Tabled for $ty {
            fn rows(tables: &Tables) -> &Vec<Self> {
                &tables.$field
            }

            fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
                &mut tables.$field
            }
        }
    };
}

tabled!(Education, education);
tabled!(WorkExperience, experience);
tabled!(Skill, skills);
tabled!(Project, projects);
tabled!(SocialLink, social);

/// Process-local store behind a single mutex. It enforces the same
/// constraints as the PostgreSQL schema: owner existence, per-profile
/// unique keys, unique emails and cascading profile deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn expand<R: Tabled>(tables: &Tables, record: &R) -> Expanded<R> {
    Expanded {
        record: record.clone(),
        profile_name: tables
            .profile_name(record.profile_id())
            .unwrap_or_default()
            .to_string(),
    }
}

fn check_constraints<R: Tabled>(tables: &Tables, candidate: &R) -> StoreResult<()> {
    if tables.profile_name(candidate.profile_id()).is_none() {
        return Err(StoreError::MissingProfile(candidate.profile_id()));
    }
    if let Some(key) = candidate.unique_key() {
        let clash = R::rows(tables).iter().any(|r| {
            r.id() != candidate.id()
                && r.profile_id() == candidate.profile_id()
                && r.unique_key().as_deref() == Some(key.as_str())
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "{} conflicts with an existing record for this profile.",
                R::LABEL
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn list_profiles(&self, filter: &Filter) -> StoreResult<Vec<Profile>> {
        Ok(filter.apply(&self.lock().profiles))
    }

    async fn get_profile(&self, id: i64) -> StoreResult<Option<Profile>> {
        Ok(self.lock().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_profile(&self, draft: &ProfileDraft) -> StoreResult<Profile> {
        let mut tables = self.lock();
        if tables.email_taken(&draft.email, None) {
            return Err(StoreError::Conflict(EMAIL_EXISTS.to_string()));
        }
        let now = Utc::now();
        let profile = Profile {
            id: tables.next_id("profiles"),
            name: draft.name.clone(),
            email: draft.email.clone(),
            bio: draft.bio.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: i64, draft: &ProfileDraft) -> StoreResult<Option<Profile>> {
        let mut tables = self.lock();
        if tables.email_taken(&draft.email, Some(id)) {
            return Err(StoreError::Conflict(EMAIL_EXISTS.to_string()));
        }
        let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        profile.name = draft.name.clone();
        profile.email = draft.email.clone();
        profile.bio = draft.bio.clone();
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn delete_profile(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Ok(false);
        }
        tables.education.retain(|r| r.profile_id != id);
        tables.experience.retain(|r| r.profile_id != id);
        tables.skills.retain(|r| r.profile_id != id);
        tables.projects.retain(|r| r.profile_id != id);
        tables.social.retain(|r| r.profile_id != id);
        Ok(true)
    }
}

#[async_trait]
impl<R: Tabled> Repository<R> for MemoryStore {
    async fn list(&self, filter: &Filter) -> StoreResult<Vec<Expanded<R>>> {
        let tables = self.lock();
        let rows: Vec<Expanded<R>> = R::rows(&tables)
            .iter()
            .map(|r| expand(&tables, r))
            .collect();
        Ok(filter.apply(&rows))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Expanded<R>>> {
        let tables = self.lock();
        Ok(R::rows(&tables)
            .iter()
            .find(|r| r.id() == id)
            .map(|r| expand(&tables, r)))
    }

    async fn insert(&self, profile_id: i64, draft: &R::Draft) -> StoreResult<Expanded<R>> {
        let mut tables = self.lock();
        let mut record = R::from_draft(0, profile_id, draft.clone());
        check_constraints(&tables, &record)?;
        record = R::from_draft(tables.next_id(R::TABLE), profile_id, draft.clone());
        let expanded = expand(&tables, &record);
        R::rows_mut(&mut tables).push(record);
        Ok(expanded)
    }

    async fn update(
        &self,
        id: i64,
        profile_id: i64,
        draft: &R::Draft,
    ) -> StoreResult<Option<Expanded<R>>> {
        let mut tables = self.lock();
        let Some(index) = R::rows(&tables).iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let record = R::from_draft(id, profile_id, draft.clone());
        check_constraints(&tables, &record)?;
        let expanded = expand(&tables, &record);
        R::rows_mut(&mut tables)[index] = record;
        Ok(Some(expanded))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let rows = R::rows_mut(&mut tables);
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::{SkillDraft, SkillLevel};

    fn profile(name: &str, email: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.into(),
            email: email.into(),
            bio: String::new(),
        }
    }

    fn skill(name: &str) -> SkillDraft {
        SkillDraft {
            name: name.into(),
            level: SkillLevel::Advanced,
            category: "Programming".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .insert_profile(&profile("John Doe", "john@example.com"))
            .await
            .unwrap();
        let err = store
            .insert_profile(&profile("Johnny", "john@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg == EMAIL_EXISTS));
    }

    #[tokio::test]
    async fn test_skill_names_are_unique_per_profile_ignoring_case() {
        let store = MemoryStore::new();
        let john = store
            .insert_profile(&profile("John Doe", "john@example.com"))
            .await
            .unwrap();
        let jane = store
            .insert_profile(&profile("Jane Roe", "jane@example.com"))
            .await
            .unwrap();
        Repository::<Skill>::insert(&store, john.id, &skill("Python"))
            .await
            .unwrap();
        let err = Repository::<Skill>::insert(&store, john.id, &skill("python"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        Repository::<Skill>::insert(&store, jane.id, &skill("python"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_owner_is_rejected() {
        let store = MemoryStore::new();
        let err = Repository::<Skill>::insert(&store, 42, &skill("Rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingProfile(42)));
    }

    #[tokio::test]
    async fn test_deleting_profile_cascades() {
        let store = MemoryStore::new();
        let john = store
            .insert_profile(&profile("John Doe", "john@example.com"))
            .await
            .unwrap();
        let created = Repository::<Skill>::insert(&store, john.id, &skill("Rust"))
            .await
            .unwrap();
        assert_eq!(created.profile_name, "John Doe");
        assert!(store.delete_profile(john.id).await.unwrap());
        let left = Repository::<Skill>::list(&store, &Filter::new()).await.unwrap();
        assert!(left.is_empty());
        assert!(!store.delete_profile(john.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_keeps_own_unique_key() {
        let store = MemoryStore::new();
        let john = store
            .insert_profile(&profile("John Doe", "john@example.com"))
            .await
            .unwrap();
        let created = Repository::<Skill>::insert(&store, john.id, &skill("Rust"))
            .await
            .unwrap();
        let mut draft = skill("rust");
        draft.level = SkillLevel::Expert;
        let updated = Repository::<Skill>::update(&store, created.record.id, john.id, &draft)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.record.level, SkillLevel::Expert);
        assert!(Repository::<Skill>::update(&store, 99, john.id, &draft)
            .await
            .unwrap()
            .is_none());
    }
}
