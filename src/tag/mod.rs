pub mod handlers;
pub mod models;
mod service;

pub use handlers::{create_tag, delete_tag, get_tag, list_tags, query_tags, update_tag};
pub use models::TAGS;
