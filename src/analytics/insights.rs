//! Rule-based insights derived from the other analytics reports.

use crate::analytics::domain::{Insight, Severity, Summary};

/// A budget's usage paired with its category name, the shape the insight
/// rules need.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUsage {
    pub category_name: String,
    pub percentage_used: f64,
}

/// The budget usage level that triggers a warning before the cap is hit.
const BUDGET_WARNING_THRESHOLD: f64 = 80.0;

/// The savings rate worth celebrating.
const HEALTHY_SAVINGS_RATE: f64 = 0.2;

/// Turn the window's summary and budget usage into a list of observations.
///
/// Rules fire in a fixed order so the output is deterministic: budget
/// breaches first, then cashflow, then encouragement.
pub fn generate_insights(summary: &Summary, budgets: &[BudgetUsage]) -> Vec<Insight> {
    if summary.total_income.is_zero() && summary.total_expense.is_zero() {
        return vec![Insight {
            severity: Severity::Info,
            message: "Add some transactions to see insights about your spending".to_owned(),
        }];
    }

    let mut insights = Vec::new();

    for budget in budgets {
        if budget.percentage_used >= 100.0 {
            insights.push(Insight {
                severity: Severity::Error,
                message: format!("You have exceeded your '{}' budget", budget.category_name),
            });
        } else if budget.percentage_used >= BUDGET_WARNING_THRESHOLD {
            insights.push(Insight {
                severity: Severity::Warning,
                message: format!(
                    "You have used {:.0}% of your '{}' budget",
                    budget.percentage_used, budget.category_name
                ),
            });
        }
    }

    if summary.total_expense > summary.total_income {
        insights.push(Insight {
            severity: Severity::Warning,
            message: "You spent more than you earned this period".to_owned(),
        });
    }

    if summary.savings_rate >= HEALTHY_SAVINGS_RATE {
        insights.push(Insight {
            severity: Severity::Success,
            message: format!(
                "Great job! You saved {:.0}% of your income this period",
                summary.savings_rate * 100.0
            ),
        });
    }

    if insights.is_empty() {
        insights.push(Insight {
            severity: Severity::Info,
            message: "Your spending is within your budgets this period".to_owned(),
        });
    }

    insights
}
