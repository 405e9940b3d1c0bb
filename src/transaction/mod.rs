pub mod handlers;
pub mod models;
mod service;

pub use handlers::{
    create_transaction, delete_transaction, get_expense_history, get_history, get_kpis,
    get_transaction, list_transactions, query_transactions, update_transaction,
};
pub use models::TRANSACTIONS;
