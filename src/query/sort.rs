use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use super::columns::{ColumnDescriptor, Columns};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than a case-insensitive `"desc"` sorts ascending.
    fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some(raw) if raw.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub field: String,
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Requested ordering: a single `{field, direction}` object or a list of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct SortInput(pub Vec<SortEntry>);

impl SortInput {
    pub fn entries(&self) -> &[SortEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for SortInput {
    fn from(value: Value) -> Self {
        let entries = match &value {
            Value::Object(_) => entry_from_value(&value).into_iter().collect(),
            Value::Array(items) => items.iter().filter_map(entry_from_value).collect(),
            _ => Vec::new(),
        };
        Self(entries)
    }
}

fn entry_from_value(value: &Value) -> Option<SortEntry> {
    let field = value.get("field")?.as_str()?;
    Some(SortEntry::new(
        field,
        SortDirection::from_value(value.get("direction")),
    ))
}

/// One resolved `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static ColumnDescriptor,
    pub direction: SortDirection,
}

/// Resolve sort entries against a registry, dropping unknown fields.
pub fn compile_sort(input: &SortInput, columns: Columns) -> Vec<OrderBy> {
    input
        .entries()
        .iter()
        .filter_map(|entry| match columns.get(&entry.field) {
            Some(column) => Some(OrderBy {
                column,
                direction: entry.direction,
            }),
            None => {
                debug!(field = %entry.field, "ignoring sort on unknown field");
                None
            }
        })
        .collect()
}

/// Append ` ORDER BY ...`, falling back to `default_order` when `order` is empty.
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, order: &[OrderBy], default_order: &str) {
    if order.is_empty() {
        if !default_order.is_empty() {
            qb.push(" ORDER BY ").push(default_order);
        }
        return;
    }

    qb.push(" ORDER BY ");
    for (i, term) in order.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(term.column.expr)
            .push(" ")
            .push(term.direction.as_sql());
    }
}
