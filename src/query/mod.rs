//! Filter, sort and pagination compiler shared by every list endpoint.
//!
//! Client input is never rejected here: unknown fields, operators that do not
//! fit a column and malformed operands simply contribute nothing.

pub mod columns;
pub mod executor;
pub mod operators;
pub mod pagination;
pub mod predicate;
pub mod sort;
pub mod where_compiler;

use serde::Deserialize;
use utoipa::ToSchema;

pub use columns::{ColumnDescriptor, Columns, RegistryError};
pub use executor::{fetch_all, fetch_page, fetch_paginated, Table};
pub use operators::{contains_pattern, FieldType, FilterValue, Operator, OperatorBag};
pub use pagination::{PageWindow, Paginated, PaginationInput, PaginationSettings};
pub use predicate::Predicate;
pub use sort::{compile_sort, OrderBy, SortDirection, SortInput};
pub use where_compiler::{compile_where, FilterInput, WhereCompiler, DEFAULT_MAX_FILTER_DEPTH};

/// Body of `POST /{entity}/query`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Field -> operator bag, with optional nested `and` / `or` groups
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"amount": {"gte": 1000}, "or": [{"method": {"eq": "CASH"}}]}))]
    pub filters: FilterInput,
    /// `{field, direction}` or a list of them
    #[serde(default, alias = "sort")]
    #[schema(value_type = Object, example = json!([{"field": "date", "direction": "desc"}]))]
    pub sort_by: SortInput,
    #[serde(default)]
    pub pagination: PaginationInput,
    /// Substring match on the entity's title, name or description
    #[serde(default)]
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(pagination: PaginationInput) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }
}

/// Limits applied to every list request, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    pub pagination: PaginationSettings,
    pub max_filter_depth: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            pagination: PaginationSettings::default(),
            max_filter_depth: DEFAULT_MAX_FILTER_DEPTH,
        }
    }
}

/// Everything the executor needs for one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicate: Option<Predicate>,
    pub order: Vec<OrderBy>,
    pub window: PageWindow,
}

impl QuerySettings {
    /// Compile `query` against `table`, ANDing in the caller's `scope`.
    pub fn plan(&self, table: &Table, query: &ListQuery, scope: Predicate) -> QueryPlan {
        let filters = WhereCompiler::new(table.columns)
            .with_max_depth(self.max_filter_depth)
            .compile(&query.filters);

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .zip(table.search)
            .map(|(needle, column)| Predicate::like(column, contains_pattern(needle)));

        QueryPlan {
            predicate: Predicate::all([Some(scope), filters, search].into_iter().flatten()),
            order: compile_sort(&query.sort_by, table.columns),
            window: self.pagination.derive(&query.pagination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static COLUMNS: &[ColumnDescriptor] = &[
        ColumnDescriptor::new("title", "c.title", FieldType::String),
        ColumnDescriptor::new("isIncome", "c.is_income", FieldType::Boolean),
    ];

    const CATEGORIES: Table = Table {
        name: "categories",
        from: "categories c",
        select: "c.id, c.title",
        columns: Columns::new(COLUMNS),
        default_order: "c.title ASC",
        search: Some("c.title"),
    };

    fn owner() -> Predicate {
        Predicate::eq("c.owner_id", FilterValue::Uuid(uuid::Uuid::nil()))
    }

    #[test]
    fn test_list_query_accepts_missing_and_garbage_parts() {
        let query: ListQuery = serde_json::from_value(json!({
            "filters": "nope",
            "sort": { "field": "title", "direction": "desc" }
        }))
        .unwrap();
        assert!(query.filters.is_empty());
        assert_eq!(query.sort_by.entries().len(), 1);
        assert!(query.pagination.page.is_none());
    }

    #[test]
    fn test_plan_scopes_and_searches() {
        let query: ListQuery = serde_json::from_value(json!({
            "filters": { "isIncome": { "eq": false } },
            "search": "  food ",
            "pagination": { "page": 2, "pageSize": 5 }
        }))
        .unwrap();

        let plan = QuerySettings::default().plan(&CATEGORIES, &query, owner());
        assert_eq!(
            plan.predicate,
            Some(Predicate::And(vec![
                owner(),
                Predicate::eq("c.is_income", FilterValue::Boolean(false)),
                Predicate::like("c.title", "%food%"),
            ]))
        );
        assert_eq!(plan.window.offset, 5);
        assert!(plan.order.is_empty());
    }

    #[test]
    fn test_plan_with_only_scope() {
        let plan = QuerySettings::default().plan(&CATEGORIES, &ListQuery::default(), owner());
        assert_eq!(plan.predicate, Some(owner()));
    }
}
