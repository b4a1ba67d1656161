//! Budgets cap spending on an expense category over a weekly or monthly
//! window and report progress against the cap.

mod db;
mod domain;
mod endpoints;

pub use db::{
    build_report, create_budget, create_budget_table, delete_budget, get_budget, list_budgets,
    sum_expenses_between, sum_expenses_in_month, update_budget,
};
pub use domain::{Budget, BudgetPeriod, BudgetReport};
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint, list_budgets_endpoint,
    update_budget_endpoint,
};
