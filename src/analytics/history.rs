use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};

use crate::transaction::models::TransactionType;

use super::kpi::{first_instant, month_of, next_month};
use super::models::{AmountPoint, History, HistoryPoint, Period, TransactionRow};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BucketKey {
    Day(NaiveDate),
    /// Months since year 0
    Month(i64),
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

fn bucket_key(period: Period, date: DateTime<Utc>) -> BucketKey {
    match period {
        Period::Week => BucketKey::Day(date.date_naive()),
        Period::Month => BucketKey::Month(month_index(date.year(), date.month())),
    }
}

/// The calendar buckets ending at `now`, oldest first.
fn buckets(period: Period, now: DateTime<Utc>) -> Vec<(BucketKey, String)> {
    match period {
        Period::Week => {
            let today = now.date_naive();
            (0..7u64)
                .rev()
                .filter_map(|back| today.checked_sub_days(Days::new(back)))
                .map(|day| (BucketKey::Day(day), day.format("%a").to_string()))
                .collect()
        }
        Period::Month => {
            let current = month_index(now.year(), now.month());
            (0..12)
                .rev()
                .map(|back| {
                    let index = current - back;
                    let label = MONTH_LABELS[index.rem_euclid(12) as usize];
                    (BucketKey::Month(index), label.to_string())
                })
                .collect()
        }
    }
}

/// First instant of the storage window that feeds a history of `period`.
pub fn window_start(period: Period, now: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        Period::Week => now - chrono::Duration::days(7),
        Period::Month => now.checked_sub_months(Months::new(12)).unwrap_or(now),
    }
}

/// End of the last bucket of `period`: the start of tomorrow for WEEK, the
/// first instant of next month for MONTH. Exclusive.
pub fn window_end(period: Period, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match period {
        Period::Week => now
            .date_naive()
            .succ_opt()
            .map(|day| day.and_time(NaiveTime::MIN).and_utc()),
        Period::Month => first_instant(next_month(month_of(now))),
    }
}

/// Half-open storage range that feeds a history of `period`.
pub fn history_window(
    period: Period,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((window_start(period, now), window_end(period, now)?))
}

/// Sum `rows` into the buckets of `period`; rows outside every bucket are
/// skipped and empty buckets stay zero.
fn accumulate<'a, S: Default + Clone>(
    rows: impl IntoIterator<Item = &'a TransactionRow>,
    period: Period,
    now: DateTime<Utc>,
    mut add: impl FnMut(&mut S, &TransactionRow),
) -> Vec<(String, S)> {
    let buckets = buckets(period, now);
    let index: HashMap<BucketKey, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, (key, _))| (*key, i))
        .collect();

    let mut sums = vec![S::default(); buckets.len()];
    for row in rows {
        if let Some(&i) = index.get(&bucket_key(period, row.date)) {
            add(&mut sums[i], row);
        }
    }

    buckets
        .into_iter()
        .map(|(_, label)| label)
        .zip(sums)
        .collect()
}

/// Income and expense per bucket.
///
/// `kind` restricts the rows to one transaction type first. The `total` of
/// this series is always zero.
pub fn compute_history(
    rows: &[TransactionRow],
    period: Period,
    kind: Option<TransactionType>,
    now: DateTime<Utc>,
) -> History<HistoryPoint> {
    let matching = rows
        .iter()
        .filter(|row| kind.map_or(true, |kind| row.transaction_type == kind));

    let data = accumulate(matching, period, now, |(income, expense): &mut (i64, i64), row| {
        match row.transaction_type {
            TransactionType::Income => *income = income.saturating_add(row.amount),
            TransactionType::Expense => *expense = expense.saturating_add(row.amount),
        }
    })
    .into_iter()
    .map(|(label, (income, expense))| HistoryPoint {
        label,
        income,
        expense,
    })
    .collect();

    History { data, total: 0 }
}

/// Expense per bucket, with `total` summed over all buckets.
pub fn compute_expense_history(
    rows: &[TransactionRow],
    period: Period,
    now: DateTime<Utc>,
) -> History<AmountPoint> {
    let expenses = rows
        .iter()
        .filter(|row| row.transaction_type == TransactionType::Expense);

    let data: Vec<AmountPoint> = accumulate(expenses, period, now, |amount: &mut i64, row| {
        *amount = amount.saturating_add(row.amount)
    })
    .into_iter()
    .map(|(label, amount)| AmountPoint { label, amount })
    .collect();

    let total = data
        .iter()
        .fold(0i64, |total, point| total.saturating_add(point.amount));
    History { data, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_buckets_cross_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap();
        let labels: Vec<String> = buckets(Period::Month, now)
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(
            labels,
            vec!["Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]
        );
    }

    #[test]
    fn test_week_buckets_end_today() {
        // 2024-05-15 is a Wednesday
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 8, 30, 0).unwrap();
        let keys: Vec<BucketKey> = buckets(Period::Week, now)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys.len(), 7);
        assert_eq!(
            keys.first(),
            Some(&BucketKey::Day(NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()))
        );
        assert_eq!(
            keys.last(),
            Some(&BucketKey::Day(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()))
        );
    }

    #[test]
    fn test_window_end_covers_rest_of_last_bucket() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        assert_eq!(
            window_end(Period::Week, now),
            Some(Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap())
        );
        assert_eq!(
            window_end(Period::Month, now),
            Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap())
        );

        let new_year_eve = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let (start, end) = history_window(Period::Month, new_year_eve).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_row_later_today_lands_in_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();
        let (start, end) = history_window(Period::Week, now).unwrap();
        assert!(start <= evening && evening < end);

        let row = TransactionRow {
            id: "t1".to_string(),
            amount: 900,
            transaction_type: TransactionType::Expense,
            date: evening,
            category_id: "c1".to_string(),
            category_title: "Food".to_string(),
        };
        let history = compute_history(&[row], Period::Week, None, now);
        assert_eq!(history.data.last().map(|p| p.expense), Some(900));
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let huge = TransactionRow {
            id: "t1".to_string(),
            amount: i64::MAX / 2 + 1,
            transaction_type: TransactionType::Expense,
            date: now,
            category_id: "c1".to_string(),
            category_title: "Rent".to_string(),
        };
        let rows = vec![huge.clone(), TransactionRow { id: "t2".to_string(), ..huge }];

        let history = compute_history(&rows, Period::Month, None, now);
        assert_eq!(history.data.last().map(|p| p.expense), Some(i64::MAX));

        let expenses = compute_expense_history(&rows, Period::Month, now);
        assert_eq!(expenses.total, i64::MAX);
    }

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(
            window_start(Period::Week, now),
            Utc.with_ymd_and_hms(2024, 2, 22, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window_start(Period::Month, now),
            Utc.with_ymd_and_hms(2023, 2, 28, 0, 0, 0).unwrap()
        );
    }
}
