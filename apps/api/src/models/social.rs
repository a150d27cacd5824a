use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

use super::{Expanded, InvalidChoice, Resource, UniqueRule};
use crate::query::{Condition, FieldValue, Fields, Filter, FilterSpec, Literal, Order, Param};
use crate::validation::{optional_text, Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Github,
    Linkedin,
    Twitter,
    Website,
    Portfolio,
    Blog,
    Other,
}

impl LinkType {
    pub const ALL: [LinkType; 7] = [
        LinkType::Github,
        LinkType::Linkedin,
        LinkType::Twitter,
        LinkType::Website,
        LinkType::Portfolio,
        LinkType::Blog,
        LinkType::Other,
    ];

    pub const PROFESSIONAL: [LinkType; 4] = [
        LinkType::Github,
        LinkType::Linkedin,
        LinkType::Portfolio,
        LinkType::Website,
    ];

    pub const SOCIAL_MEDIA: [LinkType; 3] = [LinkType::Twitter, LinkType::Blog, LinkType::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Github => "github",
            LinkType::Linkedin => "linkedin",
            LinkType::Twitter => "twitter",
            LinkType::Website => "website",
            LinkType::Portfolio => "portfolio",
            LinkType::Blog => "blog",
            LinkType::Other => "other",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            LinkType::Github => "GitHub",
            LinkType::Linkedin => "LinkedIn",
            LinkType::Twitter => "Twitter",
            LinkType::Website => "Personal Website",
            LinkType::Portfolio => "Portfolio",
            LinkType::Blog => "Blog",
            LinkType::Other => "Other",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl TryFrom<String> for LinkType {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SocialLink {
    pub id: i64,
    #[serde(rename = "profile")]
    pub profile_id: i64,
    #[sqlx(try_from = "String")]
    pub link_type: LinkType,
    pub url: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SocialLinkInput {
    pub link_type: String,
    pub url: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLinkDraft {
    pub link_type: LinkType,
    pub url: String,
    pub display_name: String,
}

impl Validate for SocialLinkInput {
    type Output = SocialLinkDraft;

    fn validate(self) -> Result<SocialLinkDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let raw_type = errors.required("link_type", &self.link_type);
        let link_type = if raw_type.is_empty() {
            None
        } else {
            match raw_type.parse::<LinkType>() {
                Ok(t) => Some(t),
                Err(e) => {
                    errors.add("link_type", e.to_string());
                    None
                }
            }
        };
        let url = errors.required("url", &self.url);
        if !url.is_empty() {
            errors.url("url", &url);
        }
        let display_name = optional_text(self.display_name).unwrap_or_default();
        errors.max_len("display_name", &display_name, 100);

        let Some(link_type) = link_type.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };
        Ok(SocialLinkDraft {
            link_type,
            url,
            display_name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SocialLinkDetail {
    #[serde(flatten)]
    pub link: Expanded<SocialLink>,
    pub link_type_display: &'static str,
}

impl From<Expanded<SocialLink>> for SocialLinkDetail {
    fn from(link: Expanded<SocialLink>) -> Self {
        let link_type_display = link.record.link_type.display();
        Self {
            link,
            link_type_display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SocialLinkSummary {
    pub id: i64,
    pub profile_name: String,
    pub link_type: LinkType,
    pub link_type_display: &'static str,
    pub url: String,
    pub display_name: String,
}

impl From<&Expanded<SocialLink>> for SocialLinkSummary {
    fn from(row: &Expanded<SocialLink>) -> Self {
        let l = &row.record;
        Self {
            id: l.id,
            profile_name: row.profile_name.clone(),
            link_type: l.link_type,
            link_type_display: l.link_type.display(),
            url: l.url.clone(),
            display_name: l.display_name.clone(),
        }
    }
}

impl Fields for SocialLink {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "id" => FieldValue::Int(self.id),
            "profile_id" => FieldValue::Int(self.profile_id),
            "link_type" => FieldValue::Text(Some(self.link_type.as_str())),
            "url" => FieldValue::Text(Some(&self.url)),
            "display_name" => FieldValue::Text(Some(&self.display_name)),
            _ => FieldValue::Missing,
        }
    }
}

impl Resource for SocialLink {
    type Input = SocialLinkInput;
    type Draft = SocialLinkDraft;
    type Detail = SocialLinkDetail;
    type Summary = SocialLinkSummary;

    const TABLE: &'static str = "social_links";
    const LABEL: &'static str = "Social link";
    const COLUMNS: &'static [&'static str] = &["link_type", "url", "display_name"];
    const FILTERS: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("profile_name", Param::Contains("profile_name")),
            ("link_type", Param::Exact("link_type")),
            ("platform", Param::Contains("link_type")),
            (
                "search",
                Param::Search(&["display_name", "url", "link_type", "profile_name"]),
            ),
        ],
        order: &[Order::asc("profile_name"), Order::asc("link_type")],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn profile_id(&self) -> i64 {
        self.profile_id
    }

    fn draft(&self) -> SocialLinkDraft {
        SocialLinkDraft {
            link_type: self.link_type,
            url: self.url.clone(),
            display_name: self.display_name.clone(),
        }
    }

    fn from_draft(id: i64, profile_id: i64, d: SocialLinkDraft) -> Self {
        Self {
            id,
            profile_id,
            link_type: d.link_type,
            url: d.url,
            display_name: d.display_name,
        }
    }

    fn bind(d: &SocialLinkDraft, values: &mut Separated<'_, 'static, Postgres, &'static str>) {
        values
            .push_bind(d.link_type.as_str())
            .push_bind(d.url.clone())
            .push_bind(d.display_name.clone());
    }

    fn uniqueness(profile_id: i64, draft: &SocialLinkDraft) -> Option<UniqueRule> {
        Some(UniqueRule {
            field: "link_type",
            filter: Filter::new()
                .and(Condition::Equals("profile_id", Literal::Int(profile_id)))
                .and(Condition::Equals(
                    "link_type",
                    Literal::Text(draft.link_type.as_str().to_string()),
                )),
            message: format!(
                "A {} link already exists for this profile.",
                draft.link_type.display()
            ),
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.link_type.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: serde_json::Value) -> Result<SocialLinkDraft, ValidationErrors> {
        serde_json::from_value::<SocialLinkInput>(value)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_valid_link() {
        let draft = validate(json!({
            "link_type": "github",
            "url": "https://github.com/johndoe",
            "display_name": " johndoe "
        }))
        .unwrap();
        assert_eq!(draft.link_type, LinkType::Github);
        assert_eq!(draft.display_name, "johndoe");
    }

    #[test]
    fn test_unknown_type_and_bad_url() {
        let errors = validate(json!({ "link_type": "myspace", "url": "johndoe" })).unwrap_err();
        assert_eq!(
            errors.messages("link_type"),
            ["\"myspace\" is not a valid choice."]
        );
        assert_eq!(errors.messages("url"), ["Enter a valid URL."]);
    }

    #[test]
    fn test_uniqueness_message_uses_display_label() {
        let draft = validate(json!({
            "link_type": "website",
            "url": "https://johndoe.dev"
        }))
        .unwrap();
        let rule = SocialLink::uniqueness(1, &draft).unwrap();
        assert_eq!(rule.message, "A Personal Website link already exists for this profile.");
    }

    #[test]
    fn test_professional_and_social_media_partition_all_types() {
        let mut all: Vec<LinkType> = LinkType::PROFESSIONAL
            .into_iter()
            .chain(LinkType::SOCIAL_MEDIA)
            .collect();
        all.sort();
        assert_eq!(all, LinkType::ALL.to_vec());
    }
}
