//! The report types produced by the analytics endpoints.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::DatabaseID;

/// Raw per-kind sums and row counts for a window, as read from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub income_count: usize,
    pub expense_count: usize,
}

/// Income and spending totals for a window of time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub savings_rate: f64,
    pub transaction_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
}

impl Summary {
    /// Derive the balance and savings rate from the raw totals.
    ///
    /// The savings rate is the fraction of income left over, zero when there
    /// was no income at all.
    pub fn new(totals: Totals) -> Self {
        let balance = totals.income - totals.expense;
        let savings_rate = if totals.income.is_zero() {
            0.0
        } else {
            (balance / totals.income)
                .round_dp(4)
                .to_f64()
                .unwrap_or(0.0)
        };

        Self {
            total_income: totals.income,
            total_expense: totals.expense,
            balance,
            savings_rate,
            transaction_count: totals.income_count + totals.expense_count,
            income_count: totals.income_count,
            expense_count: totals.expense_count,
        }
    }
}

/// One category's share of the window's spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category_id: DatabaseID,
    pub name: String,
    pub icon: Option<String>,
    pub color: String,
    pub amount: Decimal,
    pub transaction_count: usize,
    pub percentage: f64,
}

/// The implied reporting window when no explicit dates are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPeriod {
    #[default]
    Month,
    Year,
}

/// The bucket width for the trend report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendInterval {
    Daily,
    #[default]
    Monthly,
}

/// One bucket of the trend report. Buckets with no transactions are included
/// with zero totals so charts have no gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// How urgent an insight is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A short, human-readable observation about the user's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub severity: Severity,
    pub message: String,
}

#[cfg(test)]
mod summary_tests {
    use rust_decimal::Decimal;

    use super::{Summary, Totals};

    fn amount(value: &str) -> Decimal {
        value.parse().expect("Could not parse amount")
    }

    #[test]
    fn summary_derives_balance_and_savings_rate() {
        let summary = Summary::new(Totals {
            income: amount("1000.00"),
            expense: amount("500.00"),
            income_count: 1,
            expense_count: 2,
        });

        assert_eq!(summary.balance.to_string(), "500.00");
        assert_eq!(summary.savings_rate, 0.5);
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn zero_income_has_a_zero_savings_rate() {
        let summary = Summary::new(Totals {
            expense: amount("100.00"),
            expense_count: 1,
            ..Totals::default()
        });

        assert_eq!(summary.balance.to_string(), "-100.00");
        assert_eq!(summary.savings_rate, 0.0);
    }

    #[test]
    fn overspending_gives_a_negative_savings_rate() {
        let summary = Summary::new(Totals {
            income: amount("100.00"),
            expense: amount("150.00"),
            income_count: 1,
            expense_count: 1,
        });

        assert_eq!(summary.savings_rate, -0.5);
    }

    #[test]
    fn zero_income_with_no_expenses_is_all_zero() {
        let summary = Summary::new(Totals::default());

        assert_eq!(summary.balance, Decimal::ZERO);
        assert_eq!(summary.transaction_count, 0);
    }
}
