use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::top_n;
use crate::models::skill::SkillDetail;
use crate::models::social::{LinkType, SocialLinkDetail};
use crate::models::{Expanded, Skill, SocialLink};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Serialize)]
pub struct TopSkill {
    pub name: String,
    pub category: String,
    pub usage_count: usize,
}

/// The ten `(name, category)` pairs held by the most profiles.
pub fn top_skills(rows: &[Expanded<Skill>]) -> Vec<TopSkill> {
    let mut holders: BTreeMap<(String, String), BTreeSet<i64>> = BTreeMap::new();
    for row in rows {
        let skill = &row.record;
        holders
            .entry((skill.name.clone(), skill.category.clone()))
            .or_default()
            .insert(skill.profile_id);
    }
    let counts = holders
        .into_iter()
        .map(|(pair, profiles)| (pair, profiles.len()))
        .collect();
    top_n(counts, 10)
        .into_iter()
        .map(|((name, category), usage_count)| TopSkill {
            name,
            category,
            usage_count,
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SkillCategoryGroup {
    pub category: String,
    pub skills: Vec<SkillDetail>,
    pub skill_count: usize,
    pub level_breakdown: BTreeMap<&'static str, usize>,
}

/// Skills grouped by category, largest group first. Blank categories
/// are grouped as "Uncategorized".
pub fn skills_by_category(rows: Vec<Expanded<Skill>>) -> Vec<SkillCategoryGroup> {
    let mut groups: BTreeMap<String, Vec<Expanded<Skill>>> = BTreeMap::new();
    for row in rows {
        let category = if row.record.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            row.record.category.clone()
        };
        groups.entry(category).or_default().push(row);
    }
    let mut grouped: Vec<SkillCategoryGroup> = groups
        .into_iter()
        .map(|(category, skills)| {
            let mut level_breakdown = BTreeMap::new();
            for s in &skills {
                *level_breakdown.entry(s.record.level.as_str()).or_insert(0) += 1;
            }
            SkillCategoryGroup {
                category,
                skill_count: skills.len(),
                skills: skills.into_iter().map(SkillDetail::from).collect(),
                level_breakdown,
            }
        })
        .collect();
    grouped.sort_by(|a, b| b.skill_count.cmp(&a.skill_count));
    grouped
}

#[derive(Debug, Serialize)]
pub struct LinkTypeGroup {
    pub link_type: LinkType,
    pub link_type_display: &'static str,
    pub links: Vec<SocialLinkDetail>,
    pub link_count: usize,
}

/// Social links grouped by type, largest group first.
pub fn links_by_type(rows: Vec<Expanded<SocialLink>>) -> Vec<LinkTypeGroup> {
    let mut groups: BTreeMap<&'static str, (LinkType, Vec<Expanded<SocialLink>>)> = BTreeMap::new();
    for row in rows {
        let link_type = row.record.link_type;
        groups
            .entry(link_type.as_str())
            .or_insert_with(|| (link_type, Vec::new()))
            .1
            .push(row);
    }
    let mut grouped: Vec<LinkTypeGroup> = groups
        .into_values()
        .map(|(link_type, links)| LinkTypeGroup {
            link_type,
            link_type_display: link_type.display(),
            link_count: links.len(),
            links: links.into_iter().map(SocialLinkDetail::from).collect(),
        })
        .collect();
    grouped.sort_by(|a, b| b.link_count.cmp(&a.link_count));
    grouped
}

#[cfg(test)]
mod tests {
    use super::super::reports::fixtures::{link, skill};
    use super::*;
    use crate::models::skill::SkillLevel;

    #[test]
    fn test_top_skills_count_profiles_per_pair() {
        let rows = vec![
            skill(1, 1, "Python", SkillLevel::Expert, "Programming"),
            skill(2, 2, "Python", SkillLevel::Advanced, "Programming"),
            skill(3, 3, "Python", SkillLevel::Advanced, "Data"),
            skill(4, 1, "Go", SkillLevel::Beginner, "Programming"),
        ];
        let top = top_skills(&rows);
        assert_eq!(top[0].name, "Python");
        assert_eq!(top[0].category, "Programming");
        assert_eq!(top[0].usage_count, 2);
        // Ties order by (name, category).
        assert_eq!(top[1].name, "Go");
        assert_eq!(top[2].category, "Data");
    }

    #[test]
    fn test_skills_group_blank_categories() {
        let rows = vec![
            skill(1, 1, "Python", SkillLevel::Expert, "Programming"),
            skill(2, 1, "Teamwork", SkillLevel::Expert, ""),
            skill(3, 1, "Listening", SkillLevel::Advanced, ""),
        ];
        let groups = skills_by_category(rows);
        assert_eq!(groups[0].category, "Uncategorized");
        assert_eq!(groups[0].skill_count, 2);
        assert_eq!(groups[0].level_breakdown["expert"], 1);
        assert_eq!(groups[1].category, "Programming");
    }

    #[test]
    fn test_links_group_by_type() {
        let rows = vec![
            link(1, 1, LinkType::Twitter),
            link(2, 1, LinkType::Github),
            link(3, 2, LinkType::Github),
        ];
        let groups = links_by_type(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].link_type, LinkType::Github);
        assert_eq!(groups[0].link_type_display, "GitHub");
        assert_eq!(groups[0].link_count, 2);
    }
}
