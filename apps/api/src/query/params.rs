use std::collections::HashMap;

use super::filter::{Condition, Filter, Literal, Order};

/// How one query-string parameter becomes a condition.
#[derive(Debug, Clone, Copy)]
pub enum Param {
    /// Case-insensitive substring on a column.
    Contains(&'static str),
    /// Exact text equality on a column.
    Exact(&'static str),
    /// Owner id; non-numeric values are ignored.
    ProfileId,
    /// `"true"` requires the boolean column to be set.
    FlagTrue(&'static str),
    /// `"true"` requires the column to be non-blank.
    FlagPresent(&'static str),
    /// Substring on any of the columns.
    Search(&'static [&'static str]),
}

/// Declarative table of the filters a resource's list endpoint understands.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub params: &'static [(&'static str, Param)],
    pub order: &'static [Order],
}

impl FilterSpec {
    /// Builds the conjunction of every recognised, non-empty parameter.
    /// Unknown keys are ignored.
    pub fn build(&self, query: &HashMap<String, String>) -> Filter {
        let mut filter = self.ordered();
        for (key, param) in self.params {
            let Some(raw) = query.get(*key) else {
                continue;
            };
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(condition) = param.condition(value) {
                filter.push(condition);
            }
        }
        filter
    }

    /// An unconstrained filter carrying this resource's default order.
    pub fn ordered(&self) -> Filter {
        Filter::new().order_by(self.order)
    }
}

impl Param {
    fn condition(self, value: &str) -> Option<Condition> {
        match self {
            Param::Contains(column) => Some(Condition::Contains(column, value.to_string())),
            Param::Exact(column) => Some(Condition::Equals(column, Literal::Text(value.to_string()))),
            Param::ProfileId => value
                .parse::<i64>()
                .ok()
                .map(|id| Condition::Equals("profile_id", Literal::Int(id))),
            Param::FlagTrue(column) => {
                is_true(value).then_some(Condition::Equals(column, Literal::Bool(true)))
            }
            Param::FlagPresent(column) => is_true(value).then_some(Condition::NotBlank(column)),
            Param::Search(columns) => Some(Condition::AnyContains(columns, value.to_string())),
        }
    }
}

pub fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Whether `summary=true` asked for the reduced projection.
pub fn wants_summary(query: &HashMap<String, String>) -> bool {
    query.get("summary").is_some_and(|v| is_true(v.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: FilterSpec = FilterSpec {
        params: &[
            ("profile", Param::ProfileId),
            ("company", Param::Contains("company")),
            ("level", Param::Exact("level")),
            ("current_only", Param::FlagTrue("is_current")),
            ("has_github", Param::FlagPresent("github_link")),
            ("search", Param::Search(&["company", "position"])),
        ],
        order: &[Order::desc("start_date")],
    };

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unknown_and_empty_params_are_ignored() {
        let filter = SPEC.build(&query(&[("colour", "red"), ("company", "  ")]));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_flags_only_trigger_on_true() {
        let filter = SPEC.build(&query(&[("current_only", "TRUE"), ("has_github", "yes")]));
        assert_eq!(
            filter.conditions(),
            [Condition::Equals("is_current", Literal::Bool(true))]
        );
    }

    #[test]
    fn test_profile_id_must_be_numeric() {
        assert!(SPEC.build(&query(&[("profile", "abc")])).is_empty());
        let filter = SPEC.build(&query(&[("profile", "7")]));
        assert_eq!(
            filter.conditions(),
            [Condition::Equals("profile_id", Literal::Int(7))]
        );
    }

    #[test]
    fn test_search_and_exact_combine() {
        let filter = SPEC.build(&query(&[("search", "rust"), ("level", "expert")]));
        assert_eq!(filter.conditions().len(), 2);
        assert!(filter
            .conditions()
            .contains(&Condition::AnyContains(&["company", "position"], "rust".into())));
    }

    #[test]
    fn test_summary_flag() {
        assert!(wants_summary(&query(&[("summary", "True")])));
        assert!(!wants_summary(&query(&[("summary", "1")])));
        assert!(!wants_summary(&query(&[])));
    }
}
