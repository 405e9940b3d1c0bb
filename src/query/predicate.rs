//! Predicate tree produced by the compilers and rendered into a
//! parameterized Postgres query.
//!
//! Every operand is pushed through [`QueryBuilder::push_bind`]; only column
//! expressions coming from the static registries are written into the SQL text.

use sqlx::{Postgres, QueryBuilder};

use super::operators::FilterValue;

/// Binary comparison used by [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => " = ",
            Comparison::NotEq => " <> ",
            Comparison::Gt => " > ",
            Comparison::Gte => " >= ",
            Comparison::Lt => " < ",
            Comparison::Lte => " <= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: Comparison,
        value: FilterValue,
    },
    Like {
        column: &'static str,
        pattern: String,
        negated: bool,
    },
    In {
        column: &'static str,
        values: Vec<FilterValue>,
        negated: bool,
    },
    Null {
        column: &'static str,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    pub fn ne(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::NotEq, value)
    }

    pub fn gt(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::Gt, value)
    }

    pub fn gte(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::Gte, value)
    }

    pub fn lt(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::Lt, value)
    }

    pub fn lte(column: &'static str, value: FilterValue) -> Self {
        Self::compare(column, Comparison::Lte, value)
    }

    pub fn compare(column: &'static str, op: Comparison, value: FilterValue) -> Self {
        Predicate::Compare { column, op, value }
    }

    pub fn like(column: &'static str, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            column,
            pattern: pattern.into(),
            negated: false,
        }
    }

    pub fn not_like(column: &'static str, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            column,
            pattern: pattern.into(),
            negated: true,
        }
    }

    pub fn in_list(column: &'static str, values: Vec<FilterValue>) -> Self {
        Predicate::In {
            column,
            values,
            negated: false,
        }
    }

    pub fn not_in_list(column: &'static str, values: Vec<FilterValue>) -> Self {
        Predicate::In {
            column,
            values,
            negated: true,
        }
    }

    pub fn is_null(column: &'static str) -> Self {
        Predicate::Null {
            column,
            negated: false,
        }
    }

    pub fn is_not_null(column: &'static str) -> Self {
        Predicate::Null {
            column,
            negated: true,
        }
    }

    /// AND of all predicates; `None` when there are none, the predicate itself
    /// when there is exactly one.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        let mut predicates: Vec<Predicate> = predicates.into_iter().collect();
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }

    /// OR of all predicates, with the same collapsing rules as [`Predicate::all`].
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        let mut predicates: Vec<Predicate> = predicates.into_iter().collect();
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::Or(predicates)),
        }
    }

    /// Number of bind parameters this predicate renders.
    pub fn bind_count(&self) -> usize {
        match self {
            Predicate::Compare { .. } | Predicate::Like { .. } => 1,
            Predicate::In { values, .. } => values.len(),
            Predicate::Null { .. } => 0,
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().map(Predicate::bind_count).sum()
            }
        }
    }

    /// Append this predicate's SQL to `qb`, binding every operand.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::Compare { column, op, value } => {
                qb.push(*column).push(op.as_sql());
                push_value(qb, value);
            }
            Predicate::Like {
                column,
                pattern,
                negated,
            } => {
                qb.push(*column)
                    .push(if *negated { " NOT LIKE " } else { " LIKE " })
                    .push_bind(pattern.clone());
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // x IN () never matches, x NOT IN () always does
                    qb.push(if *negated { "TRUE" } else { "FALSE" });
                    return;
                }
                qb.push(*column)
                    .push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_value(qb, value);
                }
                qb.push(")");
            }
            Predicate::Null { column, negated } => {
                qb.push(*column)
                    .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(children) => push_group(qb, children, " AND ", "TRUE"),
            Predicate::Or(children) => push_group(qb, children, " OR ", "FALSE"),
        }
    }
}

/// Append ` WHERE <predicate>` when there is a predicate.
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicate: Option<&Predicate>) {
    if let Some(predicate) = predicate {
        qb.push(" WHERE ");
        predicate.push_sql(qb);
    }
}

fn push_group(
    qb: &mut QueryBuilder<'_, Postgres>,
    children: &[Predicate],
    separator: &str,
    identity: &str,
) {
    if children.is_empty() {
        qb.push(identity);
        return;
    }

    qb.push("(");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        child.push_sql(qb);
    }
    qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(s) => qb.push_bind(s.clone()),
        FilterValue::Integer(i) => qb.push_bind(*i),
        FilterValue::Float(f) => qb.push_bind(*f),
        FilterValue::Timestamp(ts) => qb.push_bind(*ts),
        FilterValue::Boolean(b) => qb.push_bind(*b),
        FilterValue::Uuid(id) => qb.push_bind(*id),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        predicate.push_sql(&mut qb);
        qb.sql().to_string()
    }

    fn text(s: &str) -> FilterValue {
        FilterValue::Text(s.to_string())
    }

    #[test]
    fn test_compare_binds_operand() {
        let sql = render(&Predicate::gte("t.amount", FilterValue::Integer(100)));
        assert_eq!(sql, "t.amount >= $1");
    }

    #[test]
    fn test_like_and_not_like() {
        assert_eq!(render(&Predicate::like("c.title", "%foo%")), "c.title LIKE $1");
        assert_eq!(
            render(&Predicate::not_like("c.title", "%foo%")),
            "c.title NOT LIKE $1"
        );
    }

    #[test]
    fn test_in_list_binds_each_value() {
        let predicate = Predicate::in_list("t.method", vec![text("CASH"), text("YAPE")]);
        assert_eq!(render(&predicate), "t.method IN ($1, $2)");
        assert_eq!(predicate.bind_count(), 2);
    }

    #[test]
    fn test_empty_in_lists() {
        assert_eq!(render(&Predicate::in_list("t.method", vec![])), "FALSE");
        assert_eq!(render(&Predicate::not_in_list("t.method", vec![])), "TRUE");
    }

    #[test]
    fn test_null_checks_have_no_binds() {
        let predicate = Predicate::is_not_null("t.account_id");
        assert_eq!(render(&predicate), "t.account_id IS NOT NULL");
        assert_eq!(predicate.bind_count(), 0);
    }

    #[test]
    fn test_groups_are_parenthesized_and_numbered_in_order() {
        let predicate = Predicate::And(vec![
            Predicate::eq("t.transaction_type", text("EXPENSE")),
            Predicate::Or(vec![
                Predicate::lt("t.amount", FilterValue::Integer(10)),
                Predicate::gt("t.amount", FilterValue::Integer(90)),
            ]),
        ]);
        assert_eq!(
            render(&predicate),
            "(t.transaction_type = $1 AND (t.amount < $2 OR t.amount > $3))"
        );
        assert_eq!(predicate.bind_count(), 3);
    }

    #[test]
    fn test_all_and_any_collapse() {
        assert_eq!(Predicate::all(Vec::new()), None);
        assert_eq!(Predicate::any(Vec::new()), None);

        let single = Predicate::is_null("t.account_id");
        assert_eq!(Predicate::all(vec![single.clone()]), Some(single.clone()));
        assert_eq!(
            Predicate::any(vec![single.clone(), single.clone()]),
            Some(Predicate::Or(vec![single.clone(), single]))
        );
    }

    #[test]
    fn test_push_where_skips_missing_predicate() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM tags g");
        push_where(&mut qb, None);
        assert_eq!(qb.sql(), "SELECT 1 FROM tags g");

        push_where(&mut qb, Some(&Predicate::eq("g.title", text("rent"))));
        assert_eq!(qb.sql(), "SELECT 1 FROM tags g WHERE g.title = $1");
    }
}
