use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{ProfileStore, Repository, StoreError, StoreResult};
use crate::models::profile::{ProfileDraft, EMAIL_EXISTS};
use crate::models::{Expanded, Profile, Resource};
use crate::query::{Condition, Filter, Literal};

/// PostgreSQL-backed store. Child tables are read through a join with
/// `profiles` so every row carries its owner's name.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_expr(column: &str) -> String {
    format!("p.{column}")
}

fn select_expanded<R: Resource>() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!(
        "SELECT t.*, p.name AS profile_name FROM {} t JOIN profiles p ON p.id = t.profile_id",
        R::TABLE
    ))
}

/// Wraps a data-modifying statement so its `RETURNING` row comes back joined
/// with the owner's name.
const RETURN_EXPANDED: &str =
    " RETURNING *) SELECT t.*, p.name AS profile_name FROM t JOIN profiles p ON p.id = t.profile_id";

/// Maps constraint violations onto the store's error taxonomy.
fn classify(err: sqlx::Error, conflict: &str, profile_id: Option<i64>) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(conflict.to_string());
        }
        if let (true, Some(id)) = (db.is_foreign_key_violation(), profile_id) {
            return StoreError::MissingProfile(id);
        }
    }
    StoreError::Database(err)
}

fn conflict_message<R: Resource>() -> String {
    format!("{} conflicts with an existing record for this profile.", R::LABEL)
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn list_profiles(&self, filter: &Filter) -> StoreResult<Vec<Profile>> {
        let mut qb = QueryBuilder::new("SELECT * FROM profiles p");
        filter.push_sql(&mut qb, profile_expr);
        debug!(sql = qb.sql(), "listing profiles");
        Ok(qb.build_query_as().fetch_all(&self.pool).await?)
    }

    async fn get_profile(&self, id: i64) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn insert_profile(&self, draft: &ProfileDraft) -> StoreResult<Profile> {
        sqlx::query_as("INSERT INTO profiles (name, email, bio) VALUES ($1, $2, $3) RETURNING *")
            .bind(&draft.name)
            .bind(&draft.email)
            .bind(&draft.bio)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, EMAIL_EXISTS, None))
    }

    async fn update_profile(&self, id: i64, draft: &ProfileDraft) -> StoreResult<Option<Profile>> {
        sqlx::query_as(
            "UPDATE profiles SET name = $1, email = $2, bio = $3, updated_at = now() \
             WHERE id = $4 RETURNING *",
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.bio)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, EMAIL_EXISTS, None))
    }

    async fn delete_profile(&self, id: i64) -> StoreResult<bool> {
        // Owned rows go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl<R: Resource> Repository<R> for PgStore {
    async fn list(&self, filter: &Filter) -> StoreResult<Vec<Expanded<R>>> {
        let mut qb = select_expanded::<R>();
        filter.push_sql(&mut qb, R::sql_expr);
        debug!(table = R::TABLE, sql = qb.sql(), "listing records");
        Ok(qb.build_query_as().fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Expanded<R>>> {
        let mut qb = select_expanded::<R>();
        Filter::new()
            .and(Condition::Equals("id", Literal::Int(id)))
            .push_where(&mut qb, R::sql_expr);
        Ok(qb.build_query_as().fetch_optional(&self.pool).await?)
    }

    async fn insert(&self, profile_id: i64, draft: &R::Draft) -> StoreResult<Expanded<R>> {
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "WITH t AS (INSERT INTO {} (profile_id, {}) VALUES (",
            R::TABLE,
            R::COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            values.push_bind(profile_id);
            R::bind(draft, &mut values);
        }
        qb.push(")").push(RETURN_EXPANDED);
        qb.build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, &conflict_message::<R>(), Some(profile_id)))
    }

    async fn update(
        &self,
        id: i64,
        profile_id: i64,
        draft: &R::Draft,
    ) -> StoreResult<Option<Expanded<R>>> {
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "WITH t AS (UPDATE {} SET (profile_id, {}) = ROW(",
            R::TABLE,
            R::COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            values.push_bind(profile_id);
            R::bind(draft, &mut values);
        }
        qb.push(") WHERE id = ").push_bind(id).push(RETURN_EXPANDED);
        qb.build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, &conflict_message::<R>(), Some(profile_id)))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", R::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Education, Project, Skill};
    use crate::query::Order;

    #[test]
    fn test_select_joins_owner_and_applies_filter() {
        let mut qb = select_expanded::<Skill>();
        Filter::new()
            .and(Condition::Contains("profile_name", "john".into()))
            .order_by(&[Order::asc("category")])
            .push_sql(&mut qb, Skill::sql_expr);
        assert_eq!(
            qb.sql(),
            "SELECT t.*, p.name AS profile_name FROM skills t JOIN profiles p ON p.id = t.profile_id \
             WHERE p.name ILIKE $1 ESCAPE '\\' ORDER BY t.category ASC NULLS LAST, t.id ASC"
        );
    }

    #[test]
    fn test_project_technology_filter_searches_joined_array() {
        let mut qb = select_expanded::<Project>();
        Filter::new()
            .and(Condition::Contains("technologies", "rust".into()))
            .push_where(&mut qb, Project::sql_expr);
        assert!(qb
            .sql()
            .ends_with("WHERE array_to_string(t.technologies, ',') ILIKE $1 ESCAPE '\\'"));
    }

    #[test]
    fn test_profile_filter_uses_profile_alias() {
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT * FROM profiles p");
        Filter::new()
            .and(Condition::AnyContains(&["name", "email"], "doe".into()))
            .push_sql(&mut qb, profile_expr);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM profiles p WHERE (p.name ILIKE $1 ESCAPE '\\' OR p.email ILIKE $2 ESCAPE '\\') \
             ORDER BY p.id ASC"
        );
    }

    #[test]
    fn test_conflict_message_names_resource() {
        assert_eq!(
            conflict_message::<Education>(),
            "Education conflicts with an existing record for this profile."
        );
    }
}
