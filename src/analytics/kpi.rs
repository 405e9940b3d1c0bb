use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::transaction::models::TransactionType;

use super::models::{CategorySpend, KpiResult, TransactionRow};

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    income: i64,
    expenses: i64,
}

impl Totals {
    fn add(&mut self, row: &TransactionRow) {
        match row.transaction_type {
            TransactionType::Income => self.income = self.income.saturating_add(row.amount),
            TransactionType::Expense => self.expenses = self.expenses.saturating_add(row.amount),
        }
    }
}

/// `(year, month)` of a timestamp in UTC.
pub(crate) fn month_of(date: DateTime<Utc>) -> (i32, u32) {
    (date.year(), date.month())
}

pub(crate) fn previous_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub(crate) fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub(crate) fn first_instant((year, month): (i32, u32)) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

/// Half-open range covering the previous and the current calendar month.
pub fn kpi_window(now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let current = month_of(now);
    Some((
        first_instant(previous_month(current))?,
        first_instant(next_month(current))?,
    ))
}

/// Month-over-month difference as the dashboard has always displayed it.
///
/// Only the previous value is scaled by 100; a zero previous value divides by 1.
pub fn percentage_difference(current: i64, previous: i64) -> f64 {
    let denominator = if previous == 0 { 1 } else { previous };
    (current as f64 - previous as f64 * 100.0) / denominator as f64
}

/// Current vs previous calendar month totals and the top expense category.
///
/// Rows outside those two months are ignored. Among categories with the same
/// spend the smallest category id wins.
pub fn compute_kpis(rows: &[TransactionRow], now: DateTime<Utc>) -> KpiResult {
    let current_month = month_of(now);
    let previous_month = previous_month(current_month);

    let mut current = Totals::default();
    let mut previous = Totals::default();
    let mut spend: BTreeMap<&str, (&str, i64)> = BTreeMap::new();

    for row in rows {
        let month = month_of(row.date);
        if month == current_month {
            current.add(row);
            if row.transaction_type == TransactionType::Expense {
                let entry = spend
                    .entry(row.category_id.as_str())
                    .or_insert((row.category_title.as_str(), 0));
                entry.1 = entry.1.saturating_add(row.amount);
            }
        } else if month == previous_month {
            previous.add(row);
        }
    }

    let mut most_expensive = CategorySpend::default();
    for (category_id, (title, amount)) in spend {
        if amount > most_expensive.amount {
            most_expensive = CategorySpend {
                category_id: category_id.to_string(),
                title: title.to_string(),
                amount,
            };
        }
    }

    KpiResult {
        total_income: current.income,
        total_expenses: current.expenses,
        percentage_income_difference: percentage_difference(current.income, previous.income),
        percentage_expenses_difference: percentage_difference(
            current.expenses,
            previous.expenses,
        ),
        most_expensive_category: most_expensive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_previous_month_wraps_year() {
        assert_eq!(previous_month((2024, 1)), (2023, 12));
        assert_eq!(previous_month((2024, 7)), (2024, 6));
    }

    #[test]
    fn test_percentage_difference_formula() {
        assert_eq!(percentage_difference(500, 0), 500.0);
        assert_eq!(percentage_difference(0, 0), 0.0);
        assert_eq!(percentage_difference(300, 200), (300.0 - 20_000.0) / 200.0);
    }

    #[test]
    fn test_kpi_window_spans_two_months() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let (start, end) = kpi_window(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let december = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let (_, end) = kpi_window(december).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        let huge = TransactionRow {
            id: "t1".to_string(),
            amount: i64::MAX / 2 + 1,
            transaction_type: TransactionType::Expense,
            date: now,
            category_id: "c1".to_string(),
            category_title: "Rent".to_string(),
        };
        let rows = vec![huge.clone(), TransactionRow { id: "t2".to_string(), ..huge }];

        let kpis = compute_kpis(&rows, now);
        assert_eq!(kpis.total_expenses, i64::MAX);
        assert_eq!(kpis.most_expensive_category.amount, i64::MAX);
    }

    #[test]
    fn test_month_of_uses_utc() {
        let late = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        assert_eq!(month_of(late), (2024, 3));
    }
}
