use serde::Serialize;

use super::distinct_count;
use crate::assemble::Siblings;
use crate::query::{Condition, Filter, Literal};
use crate::store::{ProfileStore, StoreResult};

/// Headline counts across the whole portfolio. Counts for a sibling
/// repository that is not wired in are left out of the response.
#[derive(Debug, Default, Serialize)]
pub struct PortfolioStats {
    pub total_profiles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_skills: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_skills: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_projects: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_projects: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_work_experiences: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_social_links: Option<usize>,
}

pub async fn portfolio_stats(
    profiles: &dyn ProfileStore,
    siblings: &Siblings,
) -> StoreResult<PortfolioStats> {
    let mut stats = PortfolioStats {
        total_profiles: profiles.list_profiles(&Filter::new()).await?.len(),
        ..PortfolioStats::default()
    };

    if let Some(skills) = &siblings.skills {
        let rows = skills.list(&Filter::new()).await?;
        stats.total_skills = Some(rows.len());
        stats.unique_skills = Some(distinct_count(rows.iter().map(|r| r.record.name.as_str())));
    }
    if let Some(projects) = &siblings.projects {
        let all = projects.list(&Filter::new()).await?.len();
        let featured = projects
            .list(&Filter::new().and(Condition::Equals("is_featured", Literal::Bool(true))))
            .await?
            .len();
        stats.total_projects = Some(all);
        stats.featured_projects = Some(featured);
    }
    if let Some(experience) = &siblings.experience {
        stats.total_work_experiences = Some(experience.list(&Filter::new()).await?.len());
    }
    if let Some(social) = &siblings.social {
        stats.total_social_links = Some(social.list(&Filter::new()).await?.len());
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::profile::ProfileDraft;
    use crate::models::skill::{SkillDraft, SkillLevel};
    use crate::models::Skill;
    use crate::store::{MemoryStore, Repository};

    #[tokio::test]
    async fn test_only_wired_siblings_are_reported() {
        let store = Arc::new(MemoryStore::new());
        let john = store
            .insert_profile(&ProfileDraft {
                name: "John Doe".into(),
                email: "john@example.com".into(),
                bio: String::new(),
            })
            .await
            .unwrap();
        for name in ["Python", "Rust"] {
            Repository::<Skill>::insert(
                store.as_ref(),
                john.id,
                &SkillDraft {
                    name: name.into(),
                    level: SkillLevel::Intermediate,
                    category: String::new(),
                },
            )
            .await
            .unwrap();
        }
        let siblings = Siblings {
            skills: Some(store.clone()),
            ..Siblings::default()
        };
        let stats = portfolio_stats(store.as_ref(), &siblings).await.unwrap();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["total_profiles"], 1);
        assert_eq!(value["total_skills"], 2);
        assert_eq!(value["unique_skills"], 2);
        assert!(value.get("total_projects").is_none());
    }
}
