use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};

use budget_query::query::{
    compile_sort, compile_where, ColumnDescriptor, Columns, FieldType, FilterInput, ListQuery,
    Predicate, QuerySettings, Table, WhereCompiler,
};

static FIXTURE: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("amount", "t.amount", FieldType::Number),
    ColumnDescriptor::new("description", "t.description", FieldType::String),
    ColumnDescriptor::new("method", "t.method", FieldType::String),
    ColumnDescriptor::new("date", "t.transaction_date", FieldType::Date),
    ColumnDescriptor::new("accountId", "t.account_id::text", FieldType::String),
    ColumnDescriptor::new("isIncome", "c.is_income", FieldType::Boolean),
];

const COLUMNS: Columns = Columns::new(FIXTURE);

fn filters(value: Value) -> FilterInput {
    serde_json::from_value(value).unwrap()
}

fn render(predicate: Option<Predicate>) -> (String, usize) {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM transactions t");
    let binds = predicate.as_ref().map_or(0, Predicate::bind_count);
    if let Some(predicate) = &predicate {
        qb.push(" WHERE ");
        predicate.push_sql(&mut qb);
    }
    (qb.sql().to_string(), binds)
}

#[test]
fn test_empty_filters_match_everything() {
    assert_eq!(compile_where(&FilterInput::default(), COLUMNS), None);
    assert_eq!(compile_where(&filters(json!({})), COLUMNS), None);
    assert_eq!(compile_where(&filters(json!("garbage")), COLUMNS), None);
}

#[test]
fn test_single_comparison() {
    let (sql, binds) = render(compile_where(&filters(json!({"amount": {"gte": 1000}})), COLUMNS));
    assert_eq!(sql, "SELECT * FROM transactions t WHERE t.amount >= $1");
    assert_eq!(binds, 1);
}

#[test]
fn test_fields_and_operators_are_anded() {
    let input = filters(json!({
        "amount": {"lte": 5000, "gt": 100},
        "method": {"in": ["CASH", "YAPE"]}
    }));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(
        sql,
        "SELECT * FROM transactions t WHERE (t.amount > $1 AND t.amount <= $2 AND t.method IN ($3, $4))"
    );
    assert_eq!(binds, 4);
}

#[test]
fn test_unknown_fields_and_operators_are_ignored() {
    let known = filters(json!({"amount": {"eq": 10}}));
    let noisy = filters(json!({
        "amount": {"eq": 10, "regex": ".*"},
        "ownerId": {"eq": "someone-else"},
        "password": {"contains": "a"}
    }));
    assert_eq!(compile_where(&noisy, COLUMNS), compile_where(&known, COLUMNS));
}

#[test]
fn test_between_equals_gte_plus_lte() {
    let between = filters(json!({"date": {"between": ["2024-01-01", "2024-01-31T23:59:59Z"]}}));
    let explicit = filters(json!({"date": {"gte": "2024-01-01", "lte": "2024-01-31T23:59:59Z"}}));
    let compiled = compile_where(&between, COLUMNS);
    assert!(compiled.is_some());
    assert_eq!(compiled, compile_where(&explicit, COLUMNS));
}

#[test]
fn test_type_mismatch_drops_operator() {
    let input = filters(json!({
        "amount": {"eq": "ten", "gt": 5},
        "isIncome": {"eq": "yes"},
        "description": {"gt": 3}
    }));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(sql, "SELECT * FROM transactions t WHERE t.amount > $1");
    assert_eq!(binds, 1);
}

#[test]
fn test_contains_escapes_wildcards() {
    let input = filters(json!({"description": {"contains": "50%_off"}}));
    assert_eq!(
        compile_where(&input, COLUMNS),
        Some(Predicate::like("t.description", "%50\\%\\_off%"))
    );
}

#[test]
fn test_null_checks_only_when_true() {
    let input = filters(json!({"accountId": {"isNull": true}}));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(sql, "SELECT * FROM transactions t WHERE t.account_id::text IS NULL");
    assert_eq!(binds, 0);

    let ignored = filters(json!({"accountId": {"isNotNull": false}}));
    assert_eq!(compile_where(&ignored, COLUMNS), None);
}

#[test]
fn test_both_null_checks_match_nothing() {
    let input = filters(json!({"accountId": {"isNull": true, "isNotNull": true}}));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(
        sql,
        "SELECT * FROM transactions t WHERE (t.account_id::text IS NULL AND t.account_id::text IS NOT NULL)"
    );
    assert_eq!(binds, 0);
}

#[test]
fn test_negated_operators() {
    let input = filters(json!({
        "amount": {"notEq": 0},
        "description": {"notContains": "refund"},
        "method": {"notIn": ["CASH", "OTHER"]}
    }));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(
        sql,
        "SELECT * FROM transactions t WHERE (t.amount <> $1 AND t.description NOT LIKE $2 AND t.method NOT IN ($3, $4))"
    );
    assert_eq!(binds, 4);
}

#[test]
fn test_not_like_is_not_contains() {
    let alias = filters(json!({"description": {"notLike": "100%"}}));
    let canonical = filters(json!({"description": {"notContains": "100%"}}));
    assert_eq!(
        compile_where(&alias, COLUMNS),
        Some(Predicate::not_like("t.description", "%100\\%%"))
    );
    assert_eq!(compile_where(&alias, COLUMNS), compile_where(&canonical, COLUMNS));
}

#[test]
fn test_empty_not_in_matches_everything() {
    let input = filters(json!({"method": {"notIn": []}}));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(sql, "SELECT * FROM transactions t WHERE TRUE");
    assert_eq!(binds, 0);
}

#[test]
fn test_nested_and_or_groups() {
    let input = filters(json!({
        "amount": {"gte": 100},
        "or": [
            {"method": {"eq": "CASH"}},
            {"and": [
                {"method": {"eq": "YAPE"}},
                {"description": {"contains": "lunch"}}
            ]}
        ]
    }));
    let (sql, binds) = render(compile_where(&input, COLUMNS));
    assert_eq!(
        sql,
        "SELECT * FROM transactions t WHERE (t.amount >= $1 AND (t.method = $2 OR (t.method = $3 AND t.description LIKE $4)))"
    );
    assert_eq!(binds, 4);
}

#[test]
fn test_groups_beyond_max_depth_are_ignored() {
    let input = filters(json!({
        "amount": {"gt": 1},
        "and": [{"amount": {"lt": 100}, "and": [{"method": {"eq": "CASH"}}]}]
    }));

    let shallow = WhereCompiler::new(COLUMNS).with_max_depth(1).compile(&input);
    assert_eq!(
        render(shallow),
        (
            "SELECT * FROM transactions t WHERE (t.amount > $1 AND t.amount < $2)".to_string(),
            2
        )
    );

    let flat = WhereCompiler::new(COLUMNS).with_max_depth(0).compile(&input);
    assert_eq!(render(flat).1, 1);
}

#[test]
fn test_list_query_plan_scopes_sorts_and_pages() {
    const TABLE: Table = Table {
        name: "transactions",
        from: "transactions t",
        select: "t.id",
        columns: COLUMNS,
        default_order: "t.transaction_date DESC",
        search: Some("t.description"),
    };

    let query: ListQuery = serde_json::from_value(json!({
        "filters": {"method": {"eq": "CASH"}},
        "sortBy": [{"field": "amount", "direction": "DESC"}, {"field": "nope"}],
        "pagination": {"page": 3, "pageSize": 20}
    }))
    .unwrap();

    let scope = Predicate::is_not_null("t.owner_id");
    let plan = QuerySettings::default().plan(&TABLE, &query, scope);

    let (sql, binds) = render(plan.predicate);
    assert_eq!(
        sql,
        "SELECT * FROM transactions t WHERE (t.owner_id IS NOT NULL AND t.method = $1)"
    );
    assert_eq!(binds, 1);
    assert_eq!(plan.order, compile_sort(&query.sort_by, COLUMNS));
    assert_eq!(plan.order.len(), 1);
    assert_eq!(plan.window.offset, 40);
    assert_eq!(plan.window.limit, 20);
}
