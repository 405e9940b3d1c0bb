pub mod handlers;
pub mod models;
mod service;

pub use handlers::{
    create_account, delete_account, get_account, list_accounts, query_accounts, update_account,
};
pub use models::ACCOUNTS;
