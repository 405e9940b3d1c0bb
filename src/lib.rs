pub mod account;
pub mod analytics;
pub mod auth;
pub mod category;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod openapi;
pub mod query;
pub mod tag;
pub mod transaction;

use actix_web::web;

use crate::query::{RegistryError, Table};

/// Every table exposed through a `POST /{entity}/query` endpoint
pub const QUERYABLE_TABLES: [&Table; 4] = [
    &account::ACCOUNTS,
    &category::CATEGORIES,
    &tag::TAGS,
    &transaction::TRANSACTIONS,
];

/// Check every column registry; the server refuses to start on a bad one.
pub fn validate_registries() -> Result<(), (&'static str, RegistryError)> {
    for table in QUERYABLE_TABLES {
        table.columns.validate().map_err(|e| (table.name, e))?;
    }
    Ok(())
}

/// Authenticated routes. Specific paths are registered before `{id}` paths.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::me)
        // Accounts
        .service(account::list_accounts)
        .service(account::query_accounts)
        .service(account::get_account)
        .service(account::create_account)
        .service(account::update_account)
        .service(account::delete_account)
        // Categories
        .service(category::list_categories)
        .service(category::query_categories)
        .service(category::get_category)
        .service(category::create_category)
        .service(category::update_category)
        .service(category::delete_category)
        // Tags
        .service(tag::list_tags)
        .service(tag::query_tags)
        .service(tag::get_tag)
        .service(tag::create_tag)
        .service(tag::update_tag)
        .service(tag::delete_tag)
        // Transactions
        .service(transaction::list_transactions)
        .service(transaction::query_transactions)
        .service(transaction::get_kpis)
        .service(transaction::get_history)
        .service(transaction::get_expense_history)
        .service(transaction::get_transaction)
        .service(transaction::create_transaction)
        .service(transaction::update_transaction)
        .service(transaction::delete_transaction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_registries_valid() {
        assert!(validate_registries().is_ok());
    }
}
