use std::collections::BTreeMap;

use serde::Serialize;

use super::{coverage, distinct_count, ranked, tally, top_n};
use crate::models::skill::SkillLevel;
use crate::models::social::LinkType;
use crate::models::{Education, Expanded, Project, Skill, SocialLink, WorkExperience};

fn not_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct EducationStats {
    pub total_education_records: usize,
    pub total_institutions: usize,
    pub total_degrees: usize,
    pub ongoing_education: usize,
}

pub fn education_stats(rows: &[Expanded<Education>]) -> EducationStats {
    EducationStats {
        total_education_records: rows.len(),
        total_institutions: distinct_count(rows.iter().map(|r| r.record.institution.as_str())),
        total_degrees: distinct_count(rows.iter().map(|r| r.record.degree.as_str())),
        ongoing_education: rows.iter().filter(|r| r.record.end_date.is_none()).count(),
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct PositionCount {
    pub position: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ExperienceStats {
    pub total_experiences: usize,
    pub current_positions: usize,
    pub past_positions: usize,
    pub unique_companies: usize,
    pub unique_positions: usize,
    pub top_companies: Vec<CompanyCount>,
    pub top_positions: Vec<PositionCount>,
}

pub fn experience_stats(rows: &[Expanded<WorkExperience>]) -> ExperienceStats {
    let current = rows.iter().filter(|r| r.record.is_current).count();
    let companies = tally(rows.iter().map(|r| r.record.company.clone()));
    let positions = tally(rows.iter().map(|r| r.record.position.clone()));
    ExperienceStats {
        total_experiences: rows.len(),
        current_positions: current,
        past_positions: rows.len() - current,
        unique_companies: companies.len(),
        unique_positions: positions.len(),
        top_companies: top_n(companies, 5)
            .into_iter()
            .map(|(company, count)| CompanyCount { company, count })
            .collect(),
        top_positions: top_n(positions, 5)
            .into_iter()
            .map(|(position, count)| PositionCount { position, count })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SkillUsage {
    pub skill: String,
    pub total_count: usize,
    pub profiles_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SkillStats {
    pub total_skills: usize,
    pub unique_skills: usize,
    pub categories_count: usize,
    pub profiles_with_skills: usize,
    pub level_distribution: BTreeMap<&'static str, usize>,
    pub top_categories: Vec<CategoryCount>,
    pub top_skills: Vec<SkillUsage>,
    /// Level label → count per top-5 category.
    pub level_category_matrix: BTreeMap<&'static str, BTreeMap<String, usize>>,
    pub available_levels: Vec<&'static str>,
}

pub fn skill_stats(rows: &[Expanded<Skill>]) -> SkillStats {
    let skills: Vec<&Skill> = rows.iter().map(|r| &r.record).collect();
    let categorised = || skills.iter().filter(|s| !s.category.is_empty());

    let level_distribution = SkillLevel::ALL
        .iter()
        .map(|level| {
            let count = skills.iter().filter(|s| s.level == *level).count();
            (level.display(), count)
        })
        .collect();

    let top_categories = top_n(tally(categorised().map(|s| s.category.clone())), 10);

    let top_skills = top_n(tally(skills.iter().map(|s| s.name.clone())), 10)
        .into_iter()
        .map(|(name, total_count)| SkillUsage {
            profiles_count: distinct_count(
                skills
                    .iter()
                    .filter(|s| s.name == name)
                    .map(|s| s.profile_id),
            ),
            skill: name,
            total_count,
        })
        .collect();

    let level_category_matrix = SkillLevel::ALL
        .iter()
        .map(|level| {
            let row = top_categories
                .iter()
                .take(5)
                .map(|(category, _)| {
                    let count = skills
                        .iter()
                        .filter(|s| s.level == *level && &s.category == category)
                        .count();
                    (category.clone(), count)
                })
                .collect();
            (level.display(), row)
        })
        .collect();

    SkillStats {
        total_skills: skills.len(),
        unique_skills: distinct_count(skills.iter().map(|s| s.name.as_str())),
        categories_count: distinct_count(categorised().map(|s| s.category.as_str())),
        profiles_with_skills: distinct_count(skills.iter().map(|s| s.profile_id)),
        level_distribution,
        top_categories: top_categories
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        top_skills,
        level_category_matrix,
        available_levels: SkillLevel::ALL.iter().map(|l| l.display()).collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct TechnologyCount {
    pub technology: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfileProjects {
    pub profile_name: String,
    pub project_count: usize,
    pub featured_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectStats {
    pub total_projects: usize,
    pub featured_projects: usize,
    pub projects_with_live_links: usize,
    pub projects_with_github: usize,
    pub projects_with_demo: usize,
    pub top_technologies: Vec<TechnologyCount>,
    pub top_profiles: Vec<ProfileProjects>,
}

pub fn project_stats(rows: &[Expanded<Project>]) -> ProjectStats {
    let count = |pred: fn(&Project) -> bool| rows.iter().filter(|r| pred(&r.record)).count();

    let technologies = tally(
        rows.iter()
            .flat_map(|r| r.record.technologies.iter().cloned()),
    );
    let per_profile = tally(rows.iter().map(|r| r.profile_name.clone()));
    let top_profiles = top_n(per_profile, 5)
        .into_iter()
        .map(|(profile_name, project_count)| ProfileProjects {
            featured_count: rows
                .iter()
                .filter(|r| r.profile_name == profile_name && r.record.is_featured)
                .count(),
            profile_name,
            project_count,
        })
        .collect();

    ProjectStats {
        total_projects: rows.len(),
        featured_projects: count(|p| p.is_featured),
        projects_with_live_links: count(|p| not_blank(&p.live_link)),
        projects_with_github: count(|p| not_blank(&p.github_link)),
        projects_with_demo: count(|p| not_blank(&p.demo_link)),
        top_technologies: top_n(technologies, 10)
            .into_iter()
            .map(|(technology, count)| TechnologyCount { technology, count })
            .collect(),
        top_profiles,
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformUsage {
    pub platform: &'static str,
    pub link_type: LinkType,
    pub total_links: usize,
    pub profiles_count: usize,
}

#[derive(Debug, Serialize)]
pub struct LinkTypeChoice {
    pub key: &'static str,
    pub display: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SocialStats {
    pub total_links: usize,
    pub unique_link_types: usize,
    pub profiles_with_links: usize,
    pub total_profiles: usize,
    pub link_type_distribution: BTreeMap<&'static str, usize>,
    pub most_popular_platforms: Vec<PlatformUsage>,
    pub profiles_by_platform: BTreeMap<&'static str, usize>,
    /// Empty when there are no profiles.
    pub platform_coverage: BTreeMap<&'static str, f64>,
    pub available_link_types: Vec<LinkTypeChoice>,
}

pub fn social_stats(rows: &[Expanded<SocialLink>], total_profiles: usize) -> SocialStats {
    let links: Vec<&SocialLink> = rows.iter().map(|r| &r.record).collect();
    let profiles_using = |link_type: LinkType| {
        distinct_count(
            links
                .iter()
                .filter(|l| l.link_type == link_type)
                .map(|l| l.profile_id),
        )
    };

    let by_type = tally(links.iter().map(|l| l.link_type.as_str()));
    let most_popular_platforms = ranked(by_type.clone())
        .into_iter()
        .filter_map(|(key, total_links)| {
            let link_type: LinkType = key.parse().ok()?;
            Some(PlatformUsage {
                platform: link_type.display(),
                link_type,
                total_links,
                profiles_count: profiles_using(link_type),
            })
        })
        .collect();

    let profiles_by_platform: BTreeMap<&'static str, usize> = LinkType::ALL
        .iter()
        .map(|t| (t.display(), profiles_using(*t)))
        .collect();
    let platform_coverage = profiles_by_platform
        .iter()
        .filter_map(|(platform, count)| Some((*platform, coverage(*count, total_profiles)?)))
        .collect();

    SocialStats {
        total_links: links.len(),
        unique_link_types: by_type.len(),
        profiles_with_links: distinct_count(links.iter().map(|l| l.profile_id)),
        total_profiles,
        link_type_distribution: LinkType::ALL
            .iter()
            .map(|t| (t.display(), by_type.get(t.as_str()).copied().unwrap_or(0)))
            .collect(),
        most_popular_platforms,
        profiles_by_platform,
        platform_coverage,
        available_link_types: LinkType::ALL
            .iter()
            .map(|t| LinkTypeChoice {
                key: t.as_str(),
                display: t.display(),
            })
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::skill::SkillLevel;
    use crate::models::social::LinkType;
    use crate::models::{Expanded, Project, Skill, SocialLink, WorkExperience};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn owned<R>(record: R, profile_name: &str) -> Expanded<R> {
        Expanded {
            record,
            profile_name: profile_name.to_string(),
        }
    }

    pub fn skill(id: i64, profile_id: i64, name: &str, level: SkillLevel, category: &str) -> Expanded<Skill> {
        owned(
            Skill {
                id,
                profile_id,
                name: name.into(),
                level,
                category: category.into(),
            },
            &format!("Profile {profile_id}"),
        )
    }

    pub fn project(id: i64, profile: &str, technologies: &[&str], featured: bool) -> Expanded<Project> {
        owned(
            Project {
                id,
                profile_id: 1,
                title: format!("Project {id}"),
                description: "Something useful".into(),
                technologies: technologies.iter().map(|t| t.to_string()).collect(),
                github_link: Some(format!("https://github.com/example/{id}")),
                live_link: featured.then(|| "https://example.com".to_string()),
                demo_link: Some(String::new()),
                start_date: None,
                end_date: None,
                is_featured: featured,
            },
            profile,
        )
    }

    pub fn job(id: i64, company: &str, position: &str, current: bool) -> Expanded<WorkExperience> {
        owned(
            WorkExperience {
                id,
                profile_id: 1,
                company: company.into(),
                position: position.into(),
                location: String::new(),
                start_date: date("2020-01-01"),
                end_date: (!current).then(|| date("2021-01-01")),
                is_current: current,
                description: "Work".into(),
                achievements: String::new(),
            },
            "John Doe",
        )
    }

    pub fn link(id: i64, profile_id: i64, link_type: LinkType) -> Expanded<SocialLink> {
        owned(
            SocialLink {
                id,
                profile_id,
                link_type,
                url: format!("https://example.com/{id}"),
                display_name: String::new(),
            },
            &format!("Profile {profile_id}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_experience_stats_rank_companies() {
        let rows = vec![
            job(1, "Acme", "Engineer", false),
            job(2, "Globex", "Engineer", false),
            job(3, "Acme", "Lead", true),
        ];
        let stats = experience_stats(&rows);
        assert_eq!(stats.current_positions, 1);
        assert_eq!(stats.past_positions, 2);
        assert_eq!(stats.unique_companies, 2);
        assert_eq!(stats.top_companies[0].company, "Acme");
        assert_eq!(stats.top_companies[0].count, 2);
        assert_eq!(stats.top_positions[0].position, "Engineer");
    }

    #[test]
    fn test_skill_stats_distribution_and_matrix() {
        let rows = vec![
            skill(1, 1, "Python", SkillLevel::Expert, "Programming"),
            skill(2, 2, "Python", SkillLevel::Advanced, "Programming"),
            skill(3, 1, "Figma", SkillLevel::Beginner, "Design"),
            skill(4, 2, "Teamwork", SkillLevel::Expert, ""),
        ];
        let stats = skill_stats(&rows);
        assert_eq!(stats.unique_skills, 3);
        assert_eq!(stats.categories_count, 2);
        assert_eq!(stats.profiles_with_skills, 2);
        assert_eq!(stats.level_distribution["Expert"], 2);
        assert_eq!(stats.level_distribution["Intermediate"], 0);
        assert_eq!(stats.top_categories[0].category, "Programming");
        assert_eq!(stats.top_skills[0].skill, "Python");
        assert_eq!(stats.top_skills[0].profiles_count, 2);
        assert_eq!(stats.level_category_matrix["Expert"]["Programming"], 1);
        assert_eq!(stats.level_category_matrix["Beginner"]["Design"], 1);
        assert_eq!(stats.available_levels, ["Beginner", "Intermediate", "Advanced", "Expert"]);
    }

    #[test]
    fn test_project_stats_counts_links_and_technologies() {
        let rows = vec![
            project(1, "John Doe", &["Rust", "Axum"], true),
            project(2, "John Doe", &["Rust"], false),
            project(3, "Jane Roe", &["Python"], false),
        ];
        let stats = project_stats(&rows);
        assert_eq!(stats.featured_projects, 1);
        assert_eq!(stats.projects_with_live_links, 1);
        assert_eq!(stats.projects_with_github, 3);
        assert_eq!(stats.projects_with_demo, 0);
        assert_eq!(stats.top_technologies[0].technology, "Rust");
        assert_eq!(stats.top_technologies[0].count, 2);
        assert_eq!(stats.top_technologies[1].technology, "Axum");
        assert_eq!(stats.top_profiles[0].profile_name, "John Doe");
        assert_eq!(stats.top_profiles[0].featured_count, 1);
    }

    #[test]
    fn test_social_stats_coverage() {
        let rows = vec![
            link(1, 1, LinkType::Github),
            link(2, 2, LinkType::Github),
            link(3, 1, LinkType::Linkedin),
        ];
        let stats = social_stats(&rows, 3);
        assert_eq!(stats.unique_link_types, 2);
        assert_eq!(stats.profiles_with_links, 2);
        assert_eq!(stats.most_popular_platforms[0].platform, "GitHub");
        assert_eq!(stats.most_popular_platforms[0].profiles_count, 2);
        assert_eq!(stats.platform_coverage["GitHub"], 66.7);
        assert_eq!(stats.platform_coverage["Blog"], 0.0);
        assert_eq!(stats.link_type_distribution["LinkedIn"], 1);

        let empty = social_stats(&[], 0);
        assert!(empty.platform_coverage.is_empty());
    }
}
