//! Route handlers for budgets and their progress reports.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, DatabaseID, Error,
    budget::{
        db::{self, build_report},
        domain::BudgetPeriod,
    },
    category::{self, Kind},
    user::UserID,
    validation::{FieldErrors, check_positive_amount, check_range},
};

/// The JSON body for `POST /budgets`.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetInput {
    pub category_id: DatabaseID,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl CreateBudgetInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        check_positive_amount(&mut errors, "amount", self.amount);
        check_period_fields(&mut errors, self.period, self.month, self.year);

        errors.finish()
    }
}

/// The JSON body for `PUT /budgets/{budget_id}`. Absent fields are left
/// unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetInput {
    #[serde(default)]
    pub category_id: Option<DatabaseID>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub period: Option<BudgetPeriod>,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Monthly budgets need a month and a year; weekly budgets roll with the
/// calendar and must not carry either.
fn check_period_fields(
    errors: &mut FieldErrors,
    period: BudgetPeriod,
    month: Option<i32>,
    year: Option<i32>,
) {
    match period {
        BudgetPeriod::Monthly => {
            match month {
                Some(month) => check_range(errors, "month", month, 1, 12),
                None => errors.add("month", "Monthly budgets require a month"),
            }
            match year {
                Some(year) => check_range(errors, "year", year, 2000, 2100),
                None => errors.add("year", "Monthly budgets require a year"),
            }
        }
        BudgetPeriod::Weekly => {
            if month.is_some() || year.is_some() {
                errors.add("period", "Weekly budgets do not take a month or year");
            }
        }
    }
}

/// Check that the referenced category exists, belongs to the user, and
/// records expenses.
fn check_category(
    category_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let category = category::get_category(category_id, user_id, connection)?;

    if category.kind != Kind::Expense {
        let mut errors = FieldErrors::new();
        errors.add("category_id", "Budgets can only be set for expense categories");
        return errors.finish();
    }

    Ok(())
}

/// A route handler for creating a new budget.
pub async fn create_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<CreateBudgetInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    check_category(input.category_id, user_id, &sql_transaction)?;
    let budget = db::create_budget(
        user_id,
        input.category_id,
        input.amount,
        input.period,
        input.month.map(|month| month as u8),
        input.year,
        &sql_transaction,
    )?;
    let report = build_report(budget, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Budget created successfully",
            "budget": report,
        })),
    )
        .into_response())
}

/// A route handler for listing budgets, each with its progress report.
pub async fn list_budgets_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let reports = db::list_budgets(user_id, &connection)?
        .into_iter()
        .map(|budget| build_report(budget, &connection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({"budgets": reports})).into_response())
}

/// A route handler for fetching a single budget with its progress report.
pub async fn get_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let budget = db::get_budget(budget_id, user_id, &connection)?;
    let report = build_report(budget, &connection)?;

    Ok(Json(json!({"budget": report})).into_response())
}

/// A route handler for updating a budget.
///
/// The month/year rules are re-checked against the merged result, so a
/// request cannot switch a budget to monthly without supplying its month.
pub async fn update_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<DatabaseID>,
    Json(input): Json<UpdateBudgetInput>,
) -> Result<Response, Error> {
    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let mut budget = db::get_budget(budget_id, user_id, &sql_transaction)?;

    if let Some(category_id) = input.category_id {
        budget.category_id = category_id;
    }
    if let Some(amount) = input.amount {
        budget.amount = amount;
    }
    if let Some(period) = input.period {
        budget.period = period;
        if period == BudgetPeriod::Weekly {
            budget.month = None;
            budget.year = None;
        }
    }
    if let Some(month) = input.month {
        budget.month = Some(month as u8);
    }
    if let Some(year) = input.year {
        budget.year = Some(year);
    }

    let mut errors = FieldErrors::new();
    if let Some(amount) = input.amount {
        check_positive_amount(&mut errors, "amount", amount);
    }
    check_period_fields(
        &mut errors,
        budget.period,
        budget.month.map(i32::from),
        budget.year,
    );
    errors.finish()?;

    check_category(budget.category_id, user_id, &sql_transaction)?;

    db::update_budget(&budget, &sql_transaction)?;
    let budget = db::get_budget(budget_id, user_id, &sql_transaction)?;
    let report = build_report(budget, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Budget updated successfully",
        "budget": report,
    }))
    .into_response())
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    db::delete_budget(budget_id, user_id, &connection)?;

    Ok(Json(json!({"message": "Budget deleted successfully"})).into_response())
}
