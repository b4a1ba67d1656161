//! Defines spending budgets and their progress reporting.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DatabaseID, user::UserID};

/// The window of time a budget limits spending over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            other => Err(FromSqlError::Other(
                format!("invalid budget period '{other}'").into(),
            )),
        }
    }
}

/// A spending limit for one expense category.
///
/// Monthly budgets are pinned to a month and year. Weekly budgets roll with
/// the calendar, so they carry no month or year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub category_id: DatabaseID,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub created_at: String,
}

/// A budget together with how much of it has been spent.
///
/// `percentage_used` can exceed 100 when the budget is blown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: f64,
}

impl BudgetReport {
    /// Derive the spent/remaining/percentage fields from the raw spend total.
    pub fn new(budget: Budget, spent: Decimal) -> Self {
        use rust_decimal::prelude::ToPrimitive;

        let remaining = budget.amount - spent;
        let percentage_used = if budget.amount.is_zero() {
            0.0
        } else {
            (spent / budget.amount * Decimal::ONE_HUNDRED)
                .round_dp(1)
                .to_f64()
                .unwrap_or(0.0)
        };

        Self {
            budget,
            spent,
            remaining,
            percentage_used,
        }
    }
}

#[cfg(test)]
mod budget_report_tests {
    use rust_decimal::Decimal;

    use crate::user::UserID;

    use super::{Budget, BudgetPeriod, BudgetReport};

    fn budget(amount: &str) -> Budget {
        Budget {
            id: 1,
            user_id: UserID::new(1),
            category_id: 2,
            amount: amount.parse::<Decimal>().expect("Could not parse amount"),
            period: BudgetPeriod::Monthly,
            month: Some(8),
            year: Some(2026),
            created_at: "2026-08-01 12:00:00".to_owned(),
        }
    }

    #[test]
    fn report_derives_remaining_and_percentage() {
        let report = BudgetReport::new(
            budget("200.00"),
            "50.00".parse().expect("Could not parse amount"),
        );

        assert_eq!(report.spent.to_string(), "50.00");
        assert_eq!(report.remaining.to_string(), "150.00");
        assert_eq!(report.percentage_used, 25.0);
    }

    #[test]
    fn overspending_exceeds_one_hundred_percent() {
        let report = BudgetReport::new(
            budget("100.00"),
            "150.00".parse().expect("Could not parse amount"),
        );

        assert_eq!(report.remaining.to_string(), "-50.00");
        assert_eq!(report.percentage_used, 150.0);
    }
}
