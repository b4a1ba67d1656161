//! Defines the paths for the REST API.
//!
//! Paths that contain a placeholder such as `{category_id}` can be filled in
//! with [format_endpoint].

pub const HEALTH: &str = "/api/v1/health";

pub const REGISTER: &str = "/api/v1/auth/register";
pub const LOG_IN: &str = "/api/v1/auth/login";
pub const ME: &str = "/api/v1/auth/me";

pub const CATEGORIES: &str = "/api/v1/categories";
pub const CATEGORY: &str = "/api/v1/categories/{category_id}";

pub const TRANSACTIONS: &str = "/api/v1/transactions";
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
pub const TRANSACTION_CALENDAR: &str = "/api/v1/transactions/calendar";

pub const BUDGETS: &str = "/api/v1/budgets";
pub const BUDGET: &str = "/api/v1/budgets/{budget_id}";

pub const GOALS: &str = "/api/v1/goals";
pub const GOAL: &str = "/api/v1/goals/{goal_id}";

pub const GROUPS: &str = "/api/v1/groups";
pub const GROUP: &str = "/api/v1/groups/{group_id}";
pub const GROUP_MEMBERS: &str = "/api/v1/groups/{group_id}/members";
pub const GROUP_MEMBER: &str = "/api/v1/groups/{group_id}/members/{user_id}";

pub const ANALYTICS_SUMMARY: &str = "/api/v1/analytics/summary";
pub const ANALYTICS_BY_CATEGORY: &str = "/api/v1/analytics/by-category";
pub const ANALYTICS_TREND: &str = "/api/v1/analytics/trend";
pub const ANALYTICS_INSIGHTS: &str = "/api/v1/analytics/insights";

/// Replace the first `{placeholder}` in `endpoint` with `id`.
///
/// # Panics
/// Panics if `endpoint` does not contain a placeholder, since that indicates
/// a programming error rather than a runtime condition.
pub fn format_endpoint(endpoint: &str, id: i64) -> String {
    let start = endpoint
        .find('{')
        .unwrap_or_else(|| panic!("endpoint {endpoint} has no placeholder"));
    let end = endpoint[start..]
        .find('}')
        .map(|offset| start + offset)
        .unwrap_or_else(|| panic!("endpoint {endpoint} has an unterminated placeholder"));

    format!("{}{}{}", &endpoint[..start], id, &endpoint[end + 1..])
}
