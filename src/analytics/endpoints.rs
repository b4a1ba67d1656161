//! Route handlers for the analytics reports.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use time::{Date, Month, OffsetDateTime};

use crate::{
    AppState, Error,
    analytics::{
        db,
        domain::{Summary, TrendInterval, TrendPoint, WindowPeriod},
        insights::{BudgetUsage, generate_insights},
    },
    budget::{self, BudgetPeriod},
    category::{self, Kind},
    date_format::{date_text, parse_date},
    user::UserID,
    validation::FieldErrors,
};

/// The longest window the daily trend will bucket, to keep responses sane.
const MAX_DAILY_TREND_DAYS: i64 = 366;

/// The query parameters shared by the analytics endpoints. When no window is
/// given the reports cover the current month (or, with `period=year`, the
/// current year) up to today.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub period: Option<WindowPeriod>,
}

impl WindowParams {
    fn resolve(&self) -> Result<(Date, Date), Error> {
        let mut errors = FieldErrors::new();

        let start = match self.start_date.as_deref() {
            Some(value) => match parse_date(value) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("start_date", "Date must be in YYYY-MM-DD format");
                    None
                }
            },
            None => None,
        };
        let end = match self.end_date.as_deref() {
            Some(value) => match parse_date(value) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("end_date", "Date must be in YYYY-MM-DD format");
                    None
                }
            },
            None => None,
        };

        let today = OffsetDateTime::now_utc().date();
        let implicit_start = match self.period.unwrap_or_default() {
            WindowPeriod::Month => today.replace_day(1).unwrap_or(today),
            WindowPeriod::Year => {
                Date::from_calendar_date(today.year(), Month::January, 1).unwrap_or(today)
            }
        };
        let start = start.unwrap_or(implicit_start);
        let end = end.unwrap_or(today);
        if start > end {
            errors.add("start_date", "Start date must not be after end date");
        }

        errors.finish()?;

        Ok((start, end))
    }
}

/// The query parameters for `GET /analytics/trend`.
///
/// The window fields are repeated rather than flattened in: serde_urlencoded
/// does not handle `#[serde(flatten)]` reliably.
#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub period: Option<WindowPeriod>,
    #[serde(default)]
    pub interval: Option<TrendInterval>,
}

impl TrendParams {
    fn window(&self) -> WindowParams {
        WindowParams {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            period: self.period,
        }
    }
}

/// A route handler for the income/expense summary over a window.
pub async fn summary_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<WindowParams>,
) -> Result<Response, Error> {
    let (start, end) = params.resolve()?;

    let connection = state.lock_connection()?;
    let totals = db::totals_by_kind(user_id, start, end, &connection)?;

    Ok(Json(json!({
        "start_date": date_text(start),
        "end_date": date_text(end),
        "summary": Summary::new(totals),
    }))
    .into_response())
}

/// A route handler for spending grouped by category over a window.
pub async fn by_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<WindowParams>,
) -> Result<Response, Error> {
    let (start, end) = params.resolve()?;

    let connection = state.lock_connection()?;
    let spending = db::spending_by_category(user_id, start, end, &connection)?;

    Ok(Json(json!({
        "start_date": date_text(start),
        "end_date": date_text(end),
        "spending": spending,
    }))
    .into_response())
}

/// A route handler for the income/expense trend over a window, bucketed
/// daily or monthly. Empty buckets are zero-filled.
pub async fn trend_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<TrendParams>,
) -> Result<Response, Error> {
    let (start, end) = params.window().resolve()?;
    let interval = params.interval.unwrap_or_default();

    if interval == TrendInterval::Daily && (end - start).whole_days() >= MAX_DAILY_TREND_DAYS {
        let mut errors = FieldErrors::new();
        errors.add("interval", "Daily trends are limited to a year of data");
        errors.finish()?;
    }

    let connection = state.lock_connection()?;
    let rows = db::amounts_by_date(user_id, start, end, &connection)?;

    let mut buckets: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    match interval {
        TrendInterval::Daily => {
            let mut day = start;
            while day <= end {
                buckets.insert(date_text(day), (Decimal::ZERO, Decimal::ZERO));
                let Some(next) = day.next_day() else { break };
                day = next;
            }
        }
        TrendInterval::Monthly => {
            let (mut year, mut month) = (start.year(), start.month());
            loop {
                buckets.insert(month_label(year, month), (Decimal::ZERO, Decimal::ZERO));
                if (year, month) == (end.year(), end.month()) {
                    break;
                }
                if month == Month::December {
                    year += 1;
                }
                month = month.next();
            }
        }
    }

    for (date, kind, amount) in rows {
        let key = match interval {
            TrendInterval::Daily => date_text(date),
            TrendInterval::Monthly => month_label(date.year(), date.month()),
        };
        if let Some((income, expense)) = buckets.get_mut(&key) {
            match kind {
                Kind::Income => *income += amount,
                Kind::Expense => *expense += amount,
            }
        }
    }

    let trend: Vec<TrendPoint> = buckets
        .into_iter()
        .map(|(period, (income, expense))| TrendPoint {
            period,
            income,
            expense,
            net: income - expense,
        })
        .collect();

    Ok(Json(json!({
        "start_date": date_text(start),
        "end_date": date_text(end),
        "interval": match interval {
            TrendInterval::Daily => "daily",
            TrendInterval::Monthly => "monthly",
        },
        "trend": trend,
    }))
    .into_response())
}

fn month_label(year: i32, month: Month) -> String {
    format!("{year:04}-{:02}", u8::from(month))
}

/// A route handler for rule-based insights about the current month.
pub async fn insights_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = OffsetDateTime::now_utc().date();
    let start = today.replace_day(1).unwrap_or(today);

    let connection = state.lock_connection()?;
    let totals = db::totals_by_kind(user_id, start, today, &connection)?;
    let summary = Summary::new(totals);

    let mut usages = Vec::new();
    for stored in budget::list_budgets(user_id, &connection)? {
        // Only budgets covering the current window say anything useful.
        let current = match stored.period {
            BudgetPeriod::Weekly => true,
            BudgetPeriod::Monthly => {
                stored.month == Some(u8::from(today.month())) && stored.year == Some(today.year())
            }
        };
        if !current {
            continue;
        }

        let category = category::get_category(stored.category_id, user_id, &connection)?;
        let report = budget::build_report(stored, &connection)?;
        usages.push(BudgetUsage {
            category_name: category.name,
            percentage_used: report.percentage_used,
        });
    }

    Ok(Json(json!({"insights": generate_insights(&summary, &usages)})).into_response())
}

#[cfg(test)]
mod analytics_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, endpoints, pagination::PaginationConfig, routing::build_router,
    };

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(db_connection, "foobar", PaginationConfig::default())
            .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn register_user(server: &TestServer, username: &str, email: &str) -> String {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": username,
                "email": email,
                "password": "averysafeandsecurepassword",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["access_token"]
            .as_str()
            .expect("register response should contain a token")
            .to_owned()
    }

    async fn create_category(server: &TestServer, token: &str, name: &str, kind: &str) -> i64 {
        let response = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": name, "kind": kind}))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["category"]["id"]
            .as_i64()
            .expect("category id should be a number")
    }

    async fn add_transaction(
        server: &TestServer,
        token: &str,
        category_id: i64,
        kind: &str,
        amount: &str,
        date: &str,
    ) {
        server
            .post(endpoints::TRANSACTIONS)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({
                "amount": amount,
                "description": "Test",
                "date": date,
                "kind": kind,
                "category_id": category_id,
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn summary_reports_totals_balance_and_savings_rate() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;
        let salary = create_category(&server, &token, "Salary", "income").await;
        let food = create_category(&server, &token, "Food", "expense").await;

        add_transaction(&server, &token, salary, "income", "1000.00", "2026-08-01").await;
        add_transaction(&server, &token, food, "expense", "300.00", "2026-08-05").await;
        add_transaction(&server, &token, food, "expense", "200.00", "2026-08-10").await;

        let body = server
            .get(&format!(
                "{}?start_date=2026-08-01&end_date=2026-08-31",
                endpoints::ANALYTICS_SUMMARY
            ))
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        assert_eq!(body["summary"]["total_income"], json!("1000.00"));
        assert_eq!(body["summary"]["total_expense"], json!("500.00"));
        assert_eq!(body["summary"]["balance"], json!("500.00"));
        assert_eq!(body["summary"]["savings_rate"], json!(0.5));
        assert_eq!(body["summary"]["transaction_count"], json!(3));
        assert_eq!(body["summary"]["income_count"], json!(1));
        assert_eq!(body["summary"]["expense_count"], json!(2));
    }

    #[tokio::test]
    async fn year_period_widens_the_implicit_window() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let body = server
            .get(&format!("{}?period=year", endpoints::ANALYTICS_SUMMARY))
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        let start = body["start_date"]
            .as_str()
            .expect("start_date should be a string");
        assert!(start.ends_with("-01-01"));
    }

    #[tokio::test]
    async fn summary_only_counts_the_requesting_user() {
        let server = get_test_server();
        let alice = register_user(&server, "alice", "alice@example.com").await;
        let bob = register_user(&server, "bob", "bob@example.com").await;
        let food = create_category(&server, &alice, "Food", "expense").await;

        add_transaction(&server, &alice, food, "expense", "300.00", "2026-08-05").await;

        let body = server
            .get(&format!(
                "{}?start_date=2026-08-01&end_date=2026-08-31",
                endpoints::ANALYTICS_SUMMARY
            ))
            .add_header("authorization", format!("Bearer {bob}"))
            .await
            .json::<Value>();

        assert_eq!(body["summary"]["total_expense"], json!("0"));
    }

    #[tokio::test]
    async fn by_category_reports_shares() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "expense").await;
        let rent = create_category(&server, &token, "Rent", "expense").await;

        add_transaction(&server, &token, food, "expense", "200.00", "2026-08-01").await;
        add_transaction(&server, &token, rent, "expense", "600.00", "2026-08-02").await;

        let body = server
            .get(&format!(
                "{}?start_date=2026-08-01&end_date=2026-08-31",
                endpoints::ANALYTICS_BY_CATEGORY
            ))
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        let spending = body["spending"]
            .as_array()
            .expect("spending should be an array");
        assert_eq!(spending.len(), 2);
        assert_eq!(spending[0]["name"], json!("Rent"));
        assert_eq!(spending[0]["percentage"], json!(75.0));
        assert_eq!(spending[0]["transaction_count"], json!(1));
    }

    #[tokio::test]
    async fn monthly_trend_zero_fills_quiet_months() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "expense").await;

        add_transaction(&server, &token, food, "expense", "100.00", "2026-06-15").await;
        add_transaction(&server, &token, food, "expense", "50.00", "2026-08-01").await;

        let body = server
            .get(&format!(
                "{}?start_date=2026-06-01&end_date=2026-08-31&interval=monthly",
                endpoints::ANALYTICS_TREND
            ))
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        let trend = body["trend"].as_array().expect("trend should be an array");
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0]["period"], json!("2026-06"));
        assert_eq!(trend[0]["expense"], json!("100.00"));
        assert_eq!(trend[0]["net"], json!("-100.00"));
        assert_eq!(trend[1]["period"], json!("2026-07"));
        assert_eq!(trend[1]["expense"], json!("0"));
        assert_eq!(trend[2]["expense"], json!("50.00"));
    }

    #[tokio::test]
    async fn daily_trend_rejects_a_window_over_a_year() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(&format!(
                "{}?start_date=2024-01-01&end_date=2026-08-01&interval=daily",
                endpoints::ANALYTICS_TREND
            ))
            .add_header("authorization", format!("Bearer {token}"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn insights_prompt_when_there_is_no_activity() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let body = server
            .get(endpoints::ANALYTICS_INSIGHTS)
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        let insights = body["insights"]
            .as_array()
            .expect("insights should be an array");
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0]["severity"], json!("info"));
    }

    #[tokio::test]
    async fn malformed_window_dates_are_rejected() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(&format!(
                "{}?start_date=yesterday",
                endpoints::ANALYTICS_SUMMARY
            ))
            .add_header("authorization", format!("Bearer {token}"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["messages"]["start_date"].is_array());
    }
}
