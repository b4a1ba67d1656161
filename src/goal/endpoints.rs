//! Route handlers for savings goals.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, DatabaseID, Error,
    date_format::parse_date,
    goal::{
        db,
        domain::{DEFAULT_COLOR, DEFAULT_ICON, GoalReport, GoalStatus, SavingsGoal},
    },
    user::UserID,
    validation::{
        FieldErrors, check_hex_color, check_length, check_non_negative_amount,
        check_positive_amount,
    },
};

/// The JSON body for `POST /goals`.
#[derive(Debug, Deserialize)]
pub struct CreateGoalInput {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CreateGoalInput {
    fn validate(&self) -> Result<Option<Date>, Error> {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "name", &self.name, 1, 200);
        check_positive_amount(&mut errors, "target_amount", self.target_amount);
        if let Some(current_amount) = self.current_amount {
            check_non_negative_amount(&mut errors, "current_amount", current_amount);
        }
        if let Some(icon) = &self.icon {
            check_length(&mut errors, "icon", icon, 1, 50);
        }
        if let Some(color) = &self.color {
            check_hex_color(&mut errors, "color", color);
        }
        let target_date = parse_target_date(&mut errors, self.target_date.as_deref());

        errors.finish()?;

        Ok(target_date)
    }
}

/// The JSON body for `PUT /goals/{goal_id}`. Absent fields are left
/// unchanged; an explicit `null` target date clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateGoalInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub target_date: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl UpdateGoalInput {
    fn validate(&self) -> Result<Option<Option<Date>>, Error> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            check_length(&mut errors, "name", name, 1, 200);
        }
        if let Some(target_amount) = self.target_amount {
            check_positive_amount(&mut errors, "target_amount", target_amount);
        }
        if let Some(current_amount) = self.current_amount {
            check_non_negative_amount(&mut errors, "current_amount", current_amount);
        }
        if let Some(icon) = &self.icon {
            check_length(&mut errors, "icon", icon, 1, 50);
        }
        if let Some(color) = &self.color {
            check_hex_color(&mut errors, "color", color);
        }
        let target_date = match &self.target_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(value)) => parse_target_date(&mut errors, Some(value.as_str())).map(Some),
        };

        errors.finish()?;

        Ok(target_date)
    }
}

fn parse_target_date(errors: &mut FieldErrors, value: Option<&str>) -> Option<Date> {
    let value = value?;

    match parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add("target_date", "Date must be in YYYY-MM-DD format");
            None
        }
    }
}

/// Flip an active goal to completed once it is funded, and back if funds are
/// withdrawn. Cancelled goals stay cancelled until the user says otherwise.
fn reconcile_status(goal: &mut SavingsGoal) {
    match goal.status {
        GoalStatus::Active if goal.is_reached() => goal.status = GoalStatus::Completed,
        GoalStatus::Completed if !goal.is_reached() => goal.status = GoalStatus::Active,
        _ => {}
    }
}

/// A route handler for creating a new savings goal.
pub async fn create_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<CreateGoalInput>,
) -> Result<Response, Error> {
    let target_date = input.validate()?;

    let mut goal = SavingsGoal {
        id: 0,
        user_id,
        name: input.name,
        target_amount: input.target_amount,
        current_amount: input.current_amount.unwrap_or(Decimal::ZERO),
        target_date,
        status: GoalStatus::Active,
        icon: input.icon.unwrap_or_else(|| DEFAULT_ICON.to_owned()),
        color: input.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        created_at: String::new(),
    };
    reconcile_status(&mut goal);

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;
    goal.id = db::create_goal(&goal, &sql_transaction)?;
    let goal = db::get_goal(goal.id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Savings goal created successfully",
            "goal": GoalReport::new(goal),
        })),
    )
        .into_response())
}

/// A route handler for listing the user's savings goals with their progress.
pub async fn list_goals_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let goals: Vec<GoalReport> = db::list_goals(user_id, &connection)?
        .into_iter()
        .map(GoalReport::new)
        .collect();

    Ok(Json(json!({"goals": goals})).into_response())
}

/// A route handler for fetching a single savings goal with its progress.
pub async fn get_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let goal = db::get_goal(goal_id, user_id, &connection)?;

    Ok(Json(json!({"goal": GoalReport::new(goal)})).into_response())
}

/// A route handler for updating a savings goal.
///
/// Reaching the target through an update marks the goal completed.
pub async fn update_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseID>,
    Json(input): Json<UpdateGoalInput>,
) -> Result<Response, Error> {
    let target_date = input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let mut goal = db::get_goal(goal_id, user_id, &sql_transaction)?;

    if let Some(name) = input.name {
        goal.name = name;
    }
    if let Some(target_amount) = input.target_amount {
        goal.target_amount = target_amount;
    }
    if let Some(current_amount) = input.current_amount {
        goal.current_amount = current_amount;
    }
    if let Some(target_date) = target_date {
        goal.target_date = target_date;
    }
    if let Some(status) = input.status {
        goal.status = status;
    }
    if let Some(icon) = input.icon {
        goal.icon = icon;
    }
    if let Some(color) = input.color {
        goal.color = color;
    }
    reconcile_status(&mut goal);

    db::update_goal(&goal, &sql_transaction)?;
    let goal = db::get_goal(goal_id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Savings goal updated successfully",
        "goal": GoalReport::new(goal),
    }))
    .into_response())
}

/// A route handler for deleting a savings goal.
pub async fn delete_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    db::delete_goal(goal_id, user_id, &connection)?;

    Ok(Json(json!({"message": "Savings goal deleted successfully"})).into_response())
}
