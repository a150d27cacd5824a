//! Predicate trees over resource fields.
//!
//! A `Filter` is rendered as a parameterised SQL clause for PostgreSQL and
//! evaluated directly against records for the in-memory store. Both paths
//! must agree: substring matches are case-insensitive on both sides, text
//! sorts case-insensitively as PostgreSQL's linguistic collations do, list
//! columns match against their comma-joined form, and NULLs sort last.

use std::cmp::Ordering;

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

/// A borrowed view of one column of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Int(i64),
    Bool(bool),
    Text(Option<&'a str>),
    Date(Option<NaiveDate>),
    List(&'a [String]),
    Missing,
}

impl FieldValue<'_> {
    /// Text representation used for substring and case-insensitive matching.
    fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(v) => v.map(str::to_string),
            FieldValue::List(items) => Some(items.join(",")),
            FieldValue::Int(v) => Some(v.to_string()),
            FieldValue::Bool(v) => Some(v.to_string()),
            FieldValue::Date(v) => v.map(|d| d.to_string()),
            FieldValue::Missing => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(
            self,
            FieldValue::Text(None) | FieldValue::Date(None) | FieldValue::Missing
        )
    }

    /// Total order with NULLs greater than every value, so they land last
    /// in ascending order. Descending order flips them explicitly.
    fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Text(Some(a)), FieldValue::Text(Some(b))) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.as_text().cmp(&other.as_text()),
        }
    }
}

/// Anything the in-memory store can filter and sort.
pub trait Fields {
    fn field(&self, column: &str) -> FieldValue<'_>;
}

/// A literal compared for exact equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(&'static str, Literal),
    /// Case-insensitive exact match.
    IEquals(&'static str, String),
    /// Case-insensitive substring match.
    Contains(&'static str, String),
    /// Substring match on any of the columns.
    AnyContains(&'static [&'static str], String),
    /// Neither NULL nor the empty string.
    NotBlank(&'static str),
    OneOf(&'static str, Vec<String>),
    IdIn(&'static str, Vec<i64>),
}

impl Condition {
    pub fn matches<F: Fields + ?Sized>(&self, record: &F) -> bool {
        match self {
            Condition::Equals(column, literal) => match (record.field(column), literal) {
                (FieldValue::Int(v), Literal::Int(want)) => v == *want,
                (FieldValue::Bool(v), Literal::Bool(want)) => v == *want,
                (value, Literal::Text(want)) => value.as_text().as_deref() == Some(want.as_str()),
                _ => false,
            },
            Condition::IEquals(column, want) => record
                .field(column)
                .as_text()
                .is_some_and(|v| v.to_lowercase() == want.to_lowercase()),
            Condition::Contains(column, needle) => contains(&record.field(column), needle),
            Condition::AnyContains(columns, needle) => columns
                .iter()
                .any(|column| contains(&record.field(column), needle)),
            Condition::NotBlank(column) => record
                .field(column)
                .as_text()
                .is_some_and(|v| !v.is_empty()),
            Condition::OneOf(column, values) => record
                .field(column)
                .as_text()
                .is_some_and(|v| values.iter().any(|want| *want == v)),
            Condition::IdIn(column, ids) => match record.field(column) {
                FieldValue::Int(v) => ids.contains(&v),
                _ => false,
            },
        }
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>, expr: SqlExpr) {
        match self {
            Condition::Equals(column, literal) => {
                qb.push(expr(column)).push(" = ");
                match literal {
                    Literal::Int(v) => qb.push_bind(*v),
                    Literal::Bool(v) => qb.push_bind(*v),
                    Literal::Text(v) => qb.push_bind(v.clone()),
                };
            }
            Condition::IEquals(column, value) => {
                qb.push("LOWER(")
                    .push(expr(column))
                    .push(") = LOWER(")
                    .push_bind(value.clone())
                    .push(")");
            }
            Condition::Contains(column, needle) => push_ilike(qb, &expr(column), needle),
            Condition::AnyContains(columns, needle) => {
                qb.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    push_ilike(qb, &expr(column), needle);
                }
                qb.push(")");
            }
            Condition::NotBlank(column) => {
                let column = expr(column);
                qb.push("(")
                    .push(&column)
                    .push(" IS NOT NULL AND ")
                    .push(&column)
                    .push(" <> '')");
            }
            Condition::OneOf(column, values) => {
                qb.push(expr(column))
                    .push(" = ANY(")
                    .push_bind(values.clone())
                    .push(")");
            }
            Condition::IdIn(column, ids) => {
                qb.push(expr(column))
                    .push(" = ANY(")
                    .push_bind(ids.clone())
                    .push(")");
            }
        }
    }
}

fn contains(value: &FieldValue<'_>, needle: &str) -> bool {
    value
        .as_text()
        .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
}

/// The columns among `columns` whose text contains `needle`.
pub fn matched_columns<F: Fields + ?Sized>(
    record: &F,
    columns: &'static [&'static str],
    needle: &str,
) -> Vec<&'static str> {
    columns
        .iter()
        .copied()
        .filter(|column| contains(&record.field(column), needle))
        .collect()
}

fn push_ilike(qb: &mut QueryBuilder<'static, Postgres>, column: &str, needle: &str) {
    qb.push(column)
        .push(" ILIKE ")
        .push_bind(format!("%{}%", escape_like(needle)))
        .push(" ESCAPE '\\'");
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Maps a logical column name to its SQL expression in a query.
pub type SqlExpr = fn(&str) -> String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

/// A conjunction of conditions plus an ordering.
///
/// Every ordering is completed with `id ASC` so equal keys sort the same
/// way on every backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    order: Vec<Order>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn order_by(mut self, order: &[Order]) -> Self {
        self.order = order.to_vec();
        self
    }

    #[cfg(test)]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches<F: Fields + ?Sized>(&self, record: &F) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Keeps matching records and sorts them by this filter's ordering.
    pub fn apply<F: Fields + Clone>(&self, records: &[F]) -> Vec<F> {
        let mut selected: Vec<F> = records
            .iter()
            .filter(|r| self.matches(*r))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }

    fn compare<F: Fields>(&self, a: &F, b: &F) -> Ordering {
        for order in &self.order {
            let (left, right) = (a.field(order.column), b.field(order.column));
            let ordering = match order.direction {
                SortDirection::Asc => left.compare(&right),
                SortDirection::Desc => match (left.is_null(), right.is_null()) {
                    (false, false) => right.compare(&left),
                    _ => left.compare(&right),
                },
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.field("id").compare(&b.field("id"))
    }

    /// Appends ` WHERE ... ORDER BY ...` to a query that aliases its tables.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>, expr: SqlExpr) {
        self.push_where(qb, expr);
        qb.push(" ORDER BY ");
        for order in &self.order {
            qb.push(expr(order.column));
            qb.push(match order.direction {
                SortDirection::Asc => " ASC NULLS LAST, ",
                SortDirection::Desc => " DESC NULLS LAST, ",
            });
        }
        qb.push(expr("id")).push(" ASC");
    }

    pub fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>, expr: SqlExpr) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            condition.push_sql(qb, expr);
        }
    }
}
