//! Categories label transactions as a particular type of income or expense.

mod db;
mod domain;
mod endpoints;

pub use db::{
    count_transactions, create_category, create_category_table, delete_category, get_category,
    list_categories, update_category,
};
pub use domain::{Category, DEFAULT_COLOR, Kind};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
