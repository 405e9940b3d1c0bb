//! Pure reducers over a caller's transaction rows: month-over-month KPIs and
//! gap-filled daily/monthly histories. All calendar math is done in UTC.

pub mod clock;
pub mod history;
pub mod kpi;
pub mod models;

pub use clock::{Clock, FixedClock, SystemClock};
pub use history::{
    compute_expense_history, compute_history, history_window, window_end, window_start,
};
pub use kpi::{compute_kpis, kpi_window, percentage_difference};
pub use models::{
    AmountPoint, CategorySpend, History, HistoryPoint, KpiResult, Period, TransactionRow,
};
