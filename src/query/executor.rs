use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::errors::AppError;

use super::columns::Columns;
use super::pagination::{PageWindow, Paginated};
use super::predicate::{push_where, Predicate};
use super::sort::{push_order_by, OrderBy};
use super::{ListQuery, QueryPlan, QuerySettings};

/// A queryable table: what to select, where from, and which fields clients
/// may filter and sort on.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    /// `FROM` clause including alias and joins
    pub from: &'static str,
    pub select: &'static str,
    pub columns: Columns,
    /// Fallback `ORDER BY` when the client sends no usable sort
    pub default_order: &'static str,
    /// Column matched by the free-text `search` parameter
    pub search: Option<&'static str>,
}

impl Table {
    pub fn count_query(&self, predicate: Option<&Predicate>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.from));
        push_where(&mut qb, predicate);
        qb
    }

    pub fn select_query(
        &self,
        predicate: Option<&Predicate>,
        order: &[OrderBy],
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", self.select, self.from));
        push_where(&mut qb, predicate);
        push_order_by(&mut qb, order, self.default_order);
        qb
    }

    pub fn page_query(
        &self,
        predicate: Option<&Predicate>,
        order: &[OrderBy],
        window: &PageWindow,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.select_query(predicate, order);
        qb.push(" LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
        qb
    }
}

/// Count matching rows, then fetch one page of them.
///
/// The two reads are not run in a shared transaction.
pub async fn fetch_page<T>(
    pool: &PgPool,
    table: &Table,
    plan: &QueryPlan,
) -> Result<(Vec<T>, i64), AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let total: i64 = table
        .count_query(plan.predicate.as_ref())
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let rows = table
        .page_query(plan.predicate.as_ref(), &plan.order, &plan.window)
        .build_query_as::<T>()
        .fetch_all(pool)
        .await?;

    debug!(
        table = table.name,
        page = plan.window.page,
        page_size = plan.window.page_size,
        total,
        fetched = rows.len(),
        "fetched page"
    );

    Ok((rows, total))
}

/// Plan `query` against `table` within `scope` and return one page.
pub async fn fetch_paginated<T>(
    pool: &PgPool,
    table: &Table,
    settings: &QuerySettings,
    query: &ListQuery,
    scope: Predicate,
) -> Result<Paginated<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let plan = settings.plan(table, query, scope);
    let (rows, total) = fetch_page(pool, table, &plan).await?;
    Ok(Paginated::new(rows, total, &plan.window))
}

/// Fetch every matching row without pagination.
pub async fn fetch_all<T>(
    pool: &PgPool,
    table: &Table,
    predicate: Option<&Predicate>,
) -> Result<Vec<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let rows = table
        .select_query(predicate, &[])
        .build_query_as::<T>()
        .fetch_all(pool)
        .await?;

    debug!(table = table.name, fetched = rows.len(), "fetched rows");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::columns::ColumnDescriptor;
    use crate::query::operators::{FieldType, FilterValue};
    use crate::query::pagination::{derive, PaginationInput};

    static COLUMNS: &[ColumnDescriptor] =
        &[ColumnDescriptor::new("title", "g.title", FieldType::String)];

    const TAGS: Table = Table {
        name: "tags",
        from: "tags g",
        select: "g.id, g.title",
        columns: Columns::new(COLUMNS),
        default_order: "g.created_at DESC",
        search: Some("g.title"),
    };

    #[test]
    fn test_count_query() {
        let predicate = Predicate::eq("g.owner_id", FilterValue::Uuid(uuid::Uuid::nil()));
        let qb = TAGS.count_query(Some(&predicate));
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tags g WHERE g.owner_id = $1");
    }

    #[test]
    fn test_page_query_binds_limit_after_filters() {
        let predicate = Predicate::eq("g.title", FilterValue::Text("rent".to_string()));
        let window = derive(&PaginationInput::page(2, 5));
        let qb = TAGS.page_query(Some(&predicate), &[], &window);
        assert_eq!(
            qb.sql(),
            "SELECT g.id, g.title FROM tags g WHERE g.title = $1 \
             ORDER BY g.created_at DESC LIMIT $2 OFFSET $3"
        );
    }
}
