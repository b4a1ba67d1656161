//! Transactions record money spent or earned, tied to a category and
//! optionally a shared group.

mod db;
mod domain;
mod endpoints;

pub use db::{
    NewTransaction, SortField, SortOrder, TransactionFilter, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, list_transactions,
    list_transactions_for_month, update_transaction,
};
pub use domain::{RecurringFrequency, Transaction};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint, transaction_calendar_endpoint, update_transaction_endpoint,
};
