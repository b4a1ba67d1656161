//! Read-only reports over the user's transactions: summaries, category
//! breakdowns, trends, and rule-based insights.

mod db;
mod domain;
mod endpoints;
mod insights;

pub use db::{amounts_by_date, spending_by_category, totals_by_kind};
pub use domain::{
    CategorySpending, Insight, Severity, Summary, Totals, TrendInterval, TrendPoint, WindowPeriod,
};
pub use endpoints::{
    by_category_endpoint, insights_endpoint, summary_endpoint, trend_endpoint,
};
pub use insights::{BudgetUsage, generate_insights};
