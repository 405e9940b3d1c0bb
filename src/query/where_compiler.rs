use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::columns::{ColumnDescriptor, Columns};
use super::operators::{contains_pattern, FilterValue, Operator, OperatorBag};
use super::predicate::Predicate;

/// Default bound on how deep nested `and` / `or` groups are followed.
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 4;

/// Client filter shape: field name -> operator bag, plus optional nested
/// `and` / `or` groups.
///
/// Any JSON value is accepted; parts that do not fit the shape are dropped
/// instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct FilterInput {
    pub fields: BTreeMap<String, OperatorBag>,
    pub and: Vec<FilterInput>,
    pub or: Vec<FilterInput>,
}

impl FilterInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, bag: OperatorBag) -> Self {
        self.fields.insert(name.into(), bag);
        self
    }

    pub fn and_group(mut self, group: Vec<FilterInput>) -> Self {
        self.and = group;
        self
    }

    pub fn or_group(mut self, group: Vec<FilterInput>) -> Self {
        self.or = group;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_empty() && self.or.is_empty()
    }
}

impl From<Value> for FilterInput {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let mut input = Self::default();
        for (key, entry) in map {
            match key.as_str() {
                "and" => input.and = nested_group(entry),
                "or" => input.or = nested_group(entry),
                _ => {
                    input.fields.insert(key, OperatorBag::from(&entry));
                }
            }
        }
        input
    }
}

fn nested_group(value: Value) -> Vec<FilterInput> {
    match value {
        Value::Array(items) => items.into_iter().map(FilterInput::from).collect(),
        _ => Vec::new(),
    }
}

/// Compiles a [`FilterInput`] against one table's column registry.
#[derive(Debug, Clone, Copy)]
pub struct WhereCompiler {
    columns: Columns,
    max_depth: usize,
}

impl WhereCompiler {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            max_depth: DEFAULT_MAX_FILTER_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compose every applicable condition with AND.
    ///
    /// `None` means "match all rows".
    pub fn compile(&self, input: &FilterInput) -> Option<Predicate> {
        Predicate::all(self.collect(input, 0))
    }

    fn collect(&self, input: &FilterInput, depth: usize) -> Vec<Predicate> {
        let mut conditions = Vec::new();

        for (field, bag) in &input.fields {
            self.push_field(&mut conditions, field, bag);
        }

        if input.and.is_empty() && input.or.is_empty() {
            return conditions;
        }

        if depth >= self.max_depth {
            debug!(depth, "ignoring filter groups nested beyond the configured depth");
            return conditions;
        }

        let and_conditions = input
            .and
            .iter()
            .flat_map(|group| self.collect(group, depth + 1));
        if let Some(group) = Predicate::all(and_conditions) {
            conditions.push(group);
        }

        let or_conditions = input
            .or
            .iter()
            .flat_map(|group| self.collect(group, depth + 1));
        if let Some(group) = Predicate::any(or_conditions) {
            conditions.push(group);
        }

        conditions
    }

    fn push_field(&self, out: &mut Vec<Predicate>, field: &str, bag: &OperatorBag) {
        let Some(column) = self.columns.get(field) else {
            debug!(field, "ignoring filter on unknown field");
            return;
        };

        for (operator, operand) in bag.iter() {
            if !operator.applies_to(column.kind) {
                debug!(field, operator = operator.as_str(), "operator does not apply to field type");
                continue;
            }

            let before = out.len();
            push_operator(out, column, operator, operand);
            if out.len() == before {
                debug!(field, operator = operator.as_str(), "operand rejected");
            }
        }
    }
}

fn push_operator(
    out: &mut Vec<Predicate>,
    column: &ColumnDescriptor,
    operator: Operator,
    operand: &Value,
) {
    let expr = column.expr;
    let kind = column.kind;
    let single = || FilterValue::coerce(operand, kind);

    match operator {
        Operator::Eq => out.extend(single().map(|v| Predicate::eq(expr, v))),
        Operator::NotEq => out.extend(single().map(|v| Predicate::ne(expr, v))),
        Operator::Gt => out.extend(single().map(|v| Predicate::gt(expr, v))),
        Operator::Gte => out.extend(single().map(|v| Predicate::gte(expr, v))),
        Operator::Lt => out.extend(single().map(|v| Predicate::lt(expr, v))),
        Operator::Lte => out.extend(single().map(|v| Predicate::lte(expr, v))),
        Operator::Contains => out.extend(
            operand
                .as_str()
                .map(|needle| Predicate::like(expr, contains_pattern(needle))),
        ),
        Operator::NotContains => out.extend(
            operand
                .as_str()
                .map(|needle| Predicate::not_like(expr, contains_pattern(needle))),
        ),
        Operator::Between => {
            let Some([lo, hi]) = operand.as_array().map(Vec::as_slice).and_then(|pair| match pair {
                [lo, hi] => Some([lo, hi]),
                _ => None,
            }) else {
                return;
            };
            if let (Some(lo), Some(hi)) = (
                FilterValue::coerce(lo, kind),
                FilterValue::coerce(hi, kind),
            ) {
                out.push(Predicate::gte(expr, lo));
                out.push(Predicate::lte(expr, hi));
            }
        }
        Operator::In => out.extend(
            FilterValue::coerce_list(operand, kind).map(|values| Predicate::in_list(expr, values)),
        ),
        Operator::NotIn => out.extend(
            FilterValue::coerce_list(operand, kind)
                .map(|values| Predicate::not_in_list(expr, values)),
        ),
        Operator::IsNull => {
            if operand.as_bool() == Some(true) {
                out.push(Predicate::is_null(expr));
            }
        }
        Operator::IsNotNull => {
            if operand.as_bool() == Some(true) {
                out.push(Predicate::is_not_null(expr));
            }
        }
    }
}

/// Compile `input` against `columns` with the default nesting bound.
pub fn compile_where(input: &FilterInput, columns: Columns) -> Option<Predicate> {
    WhereCompiler::new(columns).compile(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::operators::FieldType;
    use serde_json::json;

    static COLUMNS: &[ColumnDescriptor] = &[
        ColumnDescriptor::new("title", "c.title", FieldType::String),
        ColumnDescriptor::new("isIncome", "c.is_income", FieldType::Boolean),
        ColumnDescriptor::new("createdAt", "c.created_at", FieldType::Date),
    ];

    fn compile(value: serde_json::Value) -> Option<Predicate> {
        compile_where(&FilterInput::from(value), Columns::new(COLUMNS))
    }

    #[test]
    fn test_from_value_splits_groups_and_fields() {
        let input = FilterInput::from(json!({
            "title": { "eq": "Food" },
            "and": [{ "isIncome": { "eq": false } }],
            "or": "not-a-list"
        }));
        assert_eq!(input.fields.len(), 1);
        assert_eq!(input.and.len(), 1);
        assert!(input.or.is_empty());
    }

    #[test]
    fn test_non_object_input_is_empty() {
        assert!(FilterInput::from(json!(42)).is_empty());
        assert_eq!(compile(json!(null)), None);
    }

    #[test]
    fn test_boolean_eq() {
        assert_eq!(
            compile(json!({ "isIncome": { "eq": true } })),
            Some(Predicate::eq("c.is_income", FilterValue::Boolean(true)))
        );
    }

    #[test]
    fn test_wrong_operand_type_is_dropped() {
        assert_eq!(compile(json!({ "isIncome": { "eq": "yes" } })), None);
        assert_eq!(compile(json!({ "createdAt": { "gt": "soon" } })), None);
    }

    #[test]
    fn test_between_needs_exactly_two_values() {
        assert_eq!(
            compile(json!({ "createdAt": { "between": ["2024-01-01"] } })),
            None
        );
        assert!(compile(json!({ "createdAt": { "between": ["2024-01-01", "2024-02-01"] } })).is_some());
    }

    #[test]
    fn test_depth_limit_drops_deeper_groups() {
        let input = FilterInput::from(json!({
            "and": [{
                "title": { "eq": "Rent" },
                "or": [{ "isIncome": { "eq": true } }]
            }]
        }));

        let shallow = WhereCompiler::new(Columns::new(COLUMNS))
            .with_max_depth(1)
            .compile(&input);
        assert_eq!(
            shallow,
            Some(Predicate::eq("c.title", FilterValue::Text("Rent".to_string())))
        );

        let none = WhereCompiler::new(Columns::new(COLUMNS))
            .with_max_depth(0)
            .compile(&input);
        assert_eq!(none, None);
    }
}
