use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Semantic type of a queryable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
}

/// The fixed operator vocabulary accepted inside an operator bag.
///
/// Declaration order is the order in which operators of one bag are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(Operator::Eq),
            "notEq" => Some(Operator::NotEq),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "contains" | "like" => Some(Operator::Contains),
            "notContains" | "notLike" => Some(Operator::NotContains),
            "between" => Some(Operator::Between),
            "in" => Some(Operator::In),
            "notIn" => Some(Operator::NotIn),
            "isNull" => Some(Operator::IsNull),
            "isNotNull" => Some(Operator::IsNotNull),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::NotEq => "notEq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::IsNull => "isNull",
            Operator::IsNotNull => "isNotNull",
        }
    }

    /// Whether this operator can produce a predicate on a column of `kind`.
    pub fn applies_to(&self, kind: FieldType) -> bool {
        match self {
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Between => {
                matches!(kind, FieldType::Number | FieldType::Date)
            }
            Operator::Contains | Operator::NotContains => kind == FieldType::String,
            Operator::Eq
            | Operator::NotEq
            | Operator::In
            | Operator::NotIn
            | Operator::IsNull
            | Operator::IsNotNull => true,
        }
    }
}

/// Operator name -> raw operand, as supplied by the client.
///
/// Unknown operator names are discarded while reading; operands stay untyped
/// until the bag is compiled against a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorBag {
    operands: BTreeMap<Operator, Value>,
}

impl OperatorBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, operator: Operator, operand: Value) -> Self {
        self.operands.insert(operator, operand);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operator, &Value)> {
        self.operands.iter().map(|(op, value)| (*op, value))
    }
}

impl From<&Value> for OperatorBag {
    fn from(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let operands = map
            .iter()
            .filter(|(_, operand)| !operand.is_null())
            .filter_map(|(key, operand)| Operator::from_key(key).map(|op| (op, operand.clone())))
            .collect();

        Self { operands }
    }
}

/// An operand that has been checked against a column's semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    /// Only produced by services, never by client operand coercion
    Uuid(Uuid),
}

impl FilterValue {
    /// Coerce a raw JSON operand for a column of `kind`.
    ///
    /// Returns `None` when the operand does not fit the column, in which case
    /// the operator contributes nothing.
    pub fn coerce(value: &Value, kind: FieldType) -> Option<Self> {
        match (kind, value) {
            (FieldType::String, Value::String(s)) => Some(FilterValue::Text(s.clone())),
            (FieldType::Number, Value::Number(n)) => match n.as_i64() {
                Some(i) => Some(FilterValue::Integer(i)),
                None => n.as_f64().map(FilterValue::Float),
            },
            (FieldType::Date, Value::String(s)) => parse_date(s).map(FilterValue::Timestamp),
            (FieldType::Date, Value::Number(n)) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(FilterValue::Timestamp),
            (FieldType::Boolean, Value::Bool(b)) => Some(FilterValue::Boolean(*b)),
            _ => None,
        }
    }

    /// Coerce every element of a JSON array; any miss rejects the whole list.
    pub fn coerce_list(value: &Value, kind: FieldType) -> Option<Vec<Self>> {
        value
            .as_array()?
            .iter()
            .map(|item| Self::coerce(item, kind))
            .collect()
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build a `LIKE` pattern that matches `needle` as a literal substring.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_like_is_an_alias_of_contains() {
        assert_eq!(Operator::from_key("like"), Some(Operator::Contains));
        assert_eq!(Operator::from_key("notLike"), Some(Operator::NotContains));
        assert_eq!(Operator::from_key("startsWith"), None);
    }

    #[test]
    fn test_range_operators_only_apply_to_ordered_types() {
        for op in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte, Operator::Between] {
            assert!(op.applies_to(FieldType::Number));
            assert!(op.applies_to(FieldType::Date));
            assert!(!op.applies_to(FieldType::String));
            assert!(!op.applies_to(FieldType::Boolean));
        }
        assert!(Operator::Contains.applies_to(FieldType::String));
        assert!(!Operator::Contains.applies_to(FieldType::Number));
        assert!(Operator::Eq.applies_to(FieldType::Boolean));
    }

    #[test]
    fn test_bag_skips_unknown_and_null_operators() {
        let bag = OperatorBag::from(&json!({ "eq": 3, "approx": 4, "gt": null }));
        let ops: Vec<Operator> = bag.iter().map(|(op, _)| op).collect();
        assert_eq!(ops, vec![Operator::Eq]);
    }

    #[test]
    fn test_bag_from_non_object_is_empty() {
        assert!(OperatorBag::from(&json!("amount")).is_empty());
        assert!(OperatorBag::from(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_coerce_number_prefers_integer() {
        assert_eq!(
            FilterValue::coerce(&json!(500), FieldType::Number),
            Some(FilterValue::Integer(500))
        );
        assert_eq!(
            FilterValue::coerce(&json!(2.5), FieldType::Number),
            Some(FilterValue::Float(2.5))
        );
        assert_eq!(FilterValue::coerce(&json!("500"), FieldType::Number), None);
    }

    #[test]
    fn test_coerce_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FilterValue::coerce(&json!("2024-03-01"), FieldType::Date),
            Some(FilterValue::Timestamp(expected))
        );
        assert_eq!(
            FilterValue::coerce(&json!("2024-03-01T00:00:00Z"), FieldType::Date),
            Some(FilterValue::Timestamp(expected))
        );
        assert_eq!(
            FilterValue::coerce(&json!(expected.timestamp_millis()), FieldType::Date),
            Some(FilterValue::Timestamp(expected))
        );
        assert_eq!(FilterValue::coerce(&json!("yesterday"), FieldType::Date), None);
    }

    #[test]
    fn test_coerce_list_rejects_mixed_items() {
        assert_eq!(
            FilterValue::coerce_list(&json!(["a", "b"]), FieldType::String),
            Some(vec![
                FilterValue::Text("a".to_string()),
                FilterValue::Text("b".to_string())
            ])
        );
        assert_eq!(FilterValue::coerce_list(&json!(["a", 1]), FieldType::String), None);
        assert_eq!(FilterValue::coerce_list(&json!("a"), FieldType::String), None);
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("food"), "%food%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
