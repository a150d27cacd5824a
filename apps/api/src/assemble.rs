use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::social::LinkType;
use crate::models::{
    Education, Expanded, Profile, Project, Resource, Skill, SocialLink, WorkExperience,
};
use crate::query::{Condition, Literal};
use crate::store::{Repository, StoreResult, Stores};

/// The child repositories a profile view can draw on. Any of them may be
/// left out, in which case the corresponding section is omitted.
#[derive(Clone, Default)]
pub struct Siblings {
    pub education: Option<Arc<dyn Repository<Education>>>,
    pub experience: Option<Arc<dyn Repository<WorkExperience>>>,
    pub skills: Option<Arc<dyn Repository<Skill>>>,
    pub projects: Option<Arc<dyn Repository<Project>>>,
    pub social: Option<Arc<dyn Repository<SocialLink>>>,
}

impl Siblings {
    pub fn all(stores: &Stores) -> Self {
        Self {
            education: Some(stores.education.clone()),
            experience: Some(stores.experience.clone()),
            skills: Some(stores.skills.clone()),
            projects: Some(stores.projects.clone()),
            social: Some(stores.social.clone()),
        }
    }
}

/// Records of one resource owned by `profile_id`, in the resource's default order.
pub async fn owned_by<R: Resource>(
    repo: &dyn Repository<R>,
    profile_id: i64,
) -> StoreResult<Vec<Expanded<R>>> {
    let filter = R::FILTERS
        .ordered()
        .and(Condition::Equals("profile_id", Literal::Int(profile_id)));
    repo.list(&filter).await
}

async fn section<R: Resource, T>(
    repo: &Option<Arc<dyn Repository<R>>>,
    profile_id: i64,
    project: impl Fn(Expanded<R>) -> T,
) -> StoreResult<Option<Vec<T>>> {
    let Some(repo) = repo else {
        return Ok(None);
    };
    let rows = owned_by(repo.as_ref(), profile_id).await?;
    Ok(Some(rows.into_iter().map(project).collect()))
}

#[derive(Debug, Serialize)]
pub struct ProjectLinks {
    pub github: Option<String>,
    pub live: Option<String>,
    pub demo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub technologies: String,
    pub links: ProjectLinks,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
}

impl From<Project> for ProjectEntry {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            technologies: p.technologies_joined(),
            title: p.title,
            description: p.description,
            links: ProjectLinks {
                github: p.github_link,
                live: p.live_link,
                demo: p.demo_link,
            },
            start_date: p.start_date,
            end_date: p.end_date,
            is_featured: p.is_featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkEntry {
    pub url: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct ComprehensiveProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_experiences: Option<Vec<WorkExperience>>,
    /// Keyed by link type; a profile has at most one link per type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<BTreeMap<LinkType, LinkEntry>>,
}

/// Builds the profile view that embeds every owned collection.
#[derive(Clone)]
pub struct ProfileAssembler {
    siblings: Siblings,
}

impl ProfileAssembler {
    pub fn new(siblings: Siblings) -> Self {
        Self { siblings }
    }

    pub fn siblings(&self) -> &Siblings {
        &self.siblings
    }

    pub async fn assemble(&self, profile: Profile) -> StoreResult<ComprehensiveProfile> {
        let s = &self.siblings;
        let id = profile.id;
        let education = section(&s.education, id, |r| r.record).await?;
        let skills = section(&s.skills, id, |r| r.record).await?;
        let projects = section(&s.projects, id, |r| ProjectEntry::from(r.record)).await?;
        let work_experiences = section(&s.experience, id, |r| r.record).await?;
        let social_links = section(&s.social, id, |r| {
            (
                r.record.link_type,
                LinkEntry {
                    url: r.record.url,
                    display_name: r.record.display_name,
                },
            )
        })
        .await?
        .map(|entries| entries.into_iter().collect());

        Ok(ComprehensiveProfile {
            id,
            name: profile.name,
            email: profile.email,
            bio: profile.bio,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            education,
            skills,
            projects,
            work_experiences,
            social_links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileDraft;
    use crate::models::skill::{SkillDraft, SkillLevel};
    use crate::models::social::SocialLinkDraft;
    use crate::store::{MemoryStore, ProfileStore};

    async fn seeded() -> (Arc<MemoryStore>, Profile) {
        let store = Arc::new(MemoryStore::new());
        let profile = store
            .insert_profile(&ProfileDraft {
                name: "John Doe".into(),
                email: "john@example.com".into(),
                bio: "Software Developer".into(),
            })
            .await
            .unwrap();
        Repository::<Skill>::insert(
            store.as_ref(),
            profile.id,
            &SkillDraft {
                name: "Python".into(),
                level: SkillLevel::Advanced,
                category: "Programming".into(),
            },
        )
        .await
        .unwrap();
        Repository::<SocialLink>::insert(
            store.as_ref(),
            profile.id,
            &SocialLinkDraft {
                link_type: LinkType::Github,
                url: "https://github.com/johndoe".into(),
                display_name: "johndoe".into(),
            },
        )
        .await
        .unwrap();
        (store, profile)
    }

    #[tokio::test]
    async fn test_absent_siblings_are_omitted() {
        let (store, profile) = seeded().await;
        let assembler = ProfileAssembler::new(Siblings {
            skills: Some(store.clone()),
            ..Siblings::default()
        });
        let view = assembler.assemble(profile).await.unwrap();
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["skills"][0]["name"], "Python");
        assert!(value.get("education").is_none());
        assert!(value.get("social_links").is_none());
    }

    #[tokio::test]
    async fn test_social_links_are_keyed_by_type() {
        let (store, profile) = seeded().await;
        let assembler = ProfileAssembler::new(Siblings {
            education: Some(store.clone()),
            social: Some(store.clone()),
            ..Siblings::default()
        });
        let value = serde_json::to_value(assembler.assemble(profile).await.unwrap()).unwrap();
        assert_eq!(value["social_links"]["github"]["display_name"], "johndoe");
        assert_eq!(value["education"], serde_json::json!([]));
    }
}
