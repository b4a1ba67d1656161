//! Defines savings goals and their progress reporting.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{DatabaseID, user::UserID};

/// The icon assigned to goals created without an explicit one.
pub const DEFAULT_ICON: &str = "target";

/// The color assigned to goals created without an explicit one.
pub const DEFAULT_COLOR: &str = "#10b981";

/// Where a savings goal stands.
///
/// A goal completes automatically the moment its saved amount reaches the
/// target. Cancelling is a manual, reversible choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Cancelled => "cancelled",
        }
    }
}

impl ToSql for GoalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for GoalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "cancelled" => Ok(GoalStatus::Cancelled),
            other => Err(FromSqlError::Other(
                format!("invalid goal status '{other}'").into(),
            )),
        }
    }
}

/// A pot of money a user is saving towards, such as a holiday or an
/// emergency fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsGoal {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    #[serde(with = "crate::date_format::option")]
    pub target_date: Option<Date>,
    pub status: GoalStatus,
    pub icon: String,
    pub color: String,
    pub created_at: String,
}

impl SavingsGoal {
    /// Whether the saved amount has reached the target.
    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// A savings goal together with how far along it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalReport {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    pub remaining: Decimal,
    pub percentage_saved: f64,
}

impl GoalReport {
    pub fn new(goal: SavingsGoal) -> Self {
        use rust_decimal::prelude::ToPrimitive;

        let remaining = (goal.target_amount - goal.current_amount).max(Decimal::ZERO);
        let percentage_saved = if goal.target_amount.is_zero() {
            0.0
        } else {
            (goal.current_amount / goal.target_amount * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
                .round_dp(1)
                .to_f64()
                .unwrap_or(0.0)
        };

        Self {
            goal,
            remaining,
            percentage_saved,
        }
    }
}
