//! Database functions for budgets and their spend totals.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    DatabaseID, Error,
    budget::domain::{Budget, BudgetPeriod, BudgetReport},
    date_format::{date_text, now_timestamp},
    db::{amount_text, decimal_from_row},
    user::UserID,
};

/// Create the SQL table for budgets.
///
/// SQLite treats NULLs as distinct in UNIQUE constraints, so any number of
/// weekly budgets would collide only on the category. The month and year are
/// part of the key so each month gets its own monthly budget per category.
///
/// # Errors
/// Returns an error if the table cannot be created.
pub fn create_budget_table(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            period TEXT NOT NULL,
            month INTEGER,
            year INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, category_id, period, month, year)
        )",
        (),
    )?;

    Ok(())
}

const BUDGET_COLUMNS: &str = "id, user_id, category_id, amount, period, month, year, created_at";

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: decimal_from_row(row, 3)?,
        period: row.get(4)?,
        month: row.get(5)?,
        year: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Create a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::Conflict] if an equivalent budget already exists, or
/// [Error::NotFound] if the referenced category does not exist.
pub fn create_budget(
    user_id: UserID,
    category_id: DatabaseID,
    amount: Decimal,
    period: BudgetPeriod,
    month: Option<u8>,
    year: Option<i32>,
    connection: &Connection,
) -> Result<Budget, Error> {
    let amount_text = amount_text(amount);
    let created_at = now_timestamp();

    connection.execute(
        "INSERT INTO budget (user_id, category_id, amount, period, month, year, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id,
            category_id,
            &amount_text,
            period,
            month,
            year,
            &created_at,
        ),
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        category_id,
        amount: amount_text.parse().unwrap_or(amount),
        period,
        month,
        year,
        created_at,
    })
}

/// Retrieve one of `user_id`'s budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to
/// another user.
pub fn get_budget(
    budget_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((budget_id, user_id), map_row)?;

    Ok(budget)
}

/// Retrieve all of `user_id`'s budgets, newest period first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let budgets = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1
             ORDER BY year DESC, month DESC, id ASC"
        ))?
        .query_map((user_id,), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(budgets)
}

/// Overwrite the stored fields of a budget.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to
/// another user, or [Error::Conflict] if the change collides with another
/// budget.
pub fn update_budget(budget: &Budget, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE budget SET category_id = ?1, amount = ?2, period = ?3, month = ?4, year = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            budget.category_id,
            amount_text(budget.amount),
            budget.period,
            budget.month,
            budget.year,
            budget.id,
            budget.user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete one of `user_id`'s budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to
/// another user.
pub fn delete_budget(
    budget_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Attach the spend total for the budget's current window.
///
/// Monthly budgets count the expenses of their pinned month. Weekly budgets
/// count the running week, Monday through today.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn build_report(budget: Budget, connection: &Connection) -> Result<BudgetReport, Error> {
    let spent = match (budget.period, budget.month, budget.year) {
        (BudgetPeriod::Monthly, Some(month), Some(year)) => {
            sum_expenses_in_month(budget.user_id, budget.category_id, month, year, connection)?
        }
        (BudgetPeriod::Weekly, _, _) => {
            let today = OffsetDateTime::now_utc().date();
            let monday =
                today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
            sum_expenses_between(budget.user_id, budget.category_id, monday, today, connection)?
        }
        // Validation never lets a monthly budget in without a month and
        // year, so a bare monthly row has nothing to report against.
        (BudgetPeriod::Monthly, _, _) => Decimal::ZERO,
    };

    Ok(BudgetReport::new(budget, spent))
}

/// Sum the user's expenses for a category over a calendar month.
///
/// Amounts are summed in Rust so the totals stay exact.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn sum_expenses_in_month(
    user_id: UserID,
    category_id: DatabaseID,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let amounts = connection
        .prepare(
            "SELECT amount FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND kind = 'expense'
               AND CAST(strftime('%m', date) AS INTEGER) = ?3
               AND CAST(strftime('%Y', date) AS INTEGER) = ?4",
        )?
        .query_map((user_id, category_id, month, year), |row| {
            decimal_from_row(row, 0)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(amounts.iter().sum())
}

/// Sum the user's expenses for a category between two dates, inclusive.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn sum_expenses_between(
    user_id: UserID,
    category_id: DatabaseID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let amounts = connection
        .prepare(
            "SELECT amount FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND kind = 'expense'
               AND date >= ?3 AND date <= ?4",
        )?
        .query_map(
            (user_id, category_id, date_text(start), date_text(end)),
            |row| decimal_from_row(row, 0),
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(amounts.iter().sum())
}
