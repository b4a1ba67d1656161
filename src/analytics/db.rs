//! Read queries backing the analytics reports.
//!
//! Amounts come back as TEXT and are folded into [Decimal] totals in Rust so
//! the arithmetic stays exact.

use std::collections::BTreeMap;

use rusqlite::Connection;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use time::Date;

use crate::{
    Error,
    analytics::domain::{CategorySpending, Totals},
    category::Kind,
    date_format::date_text,
    db::decimal_from_row,
    user::UserID,
};

/// Total income and expense for the window, with per-kind row counts.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn totals_by_kind(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Totals, Error> {
    let rows = connection
        .prepare(
            "SELECT kind, amount FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
        )?
        .query_map((user_id, date_text(start), date_text(end)), |row| {
            Ok((row.get::<_, Kind>(0)?, decimal_from_row(row, 1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut totals = Totals::default();
    for (kind, amount) in rows {
        match kind {
            Kind::Income => {
                totals.income += amount;
                totals.income_count += 1;
            }
            Kind::Expense => {
                totals.expense += amount;
                totals.expense_count += 1;
            }
        }
    }

    Ok(totals)
}

/// The window's spending grouped by category, largest first, with each
/// category's share of the total.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn spending_by_category(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    let rows = connection
        .prepare(
            "SELECT c.id, c.name, c.icon, c.color, t.amount
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND t.kind = 'expense'
               AND t.date >= ?2 AND t.date <= ?3",
        )?
        .query_map((user_id, date_text(start), date_text(end)), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                decimal_from_row(row, 4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut totals: BTreeMap<i64, (String, Option<String>, String, Decimal, usize)> =
        BTreeMap::new();
    let mut grand_total = Decimal::ZERO;
    for (category_id, name, icon, color, amount) in rows {
        grand_total += amount;
        totals
            .entry(category_id)
            .and_modify(|(_, _, _, total, count)| {
                *total += amount;
                *count += 1;
            })
            .or_insert((name, icon, color, amount, 1));
    }

    let mut spending: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(category_id, (name, icon, color, amount, transaction_count))| {
            let percentage = if grand_total.is_zero() {
                0.0
            } else {
                (amount / grand_total * Decimal::ONE_HUNDRED)
                    .round_dp(1)
                    .to_f64()
                    .unwrap_or(0.0)
            };

            CategorySpending {
                category_id,
                name,
                icon,
                color,
                amount,
                transaction_count,
                percentage,
            }
        })
        .collect();
    spending.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category_id.cmp(&b.category_id)));

    Ok(spending)
}

/// Every transaction in the window as `(date, kind, amount)`, for the trend
/// report to bucket.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn amounts_by_date(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<(Date, Kind, Decimal)>, Error> {
    let rows = connection
        .prepare(
            "SELECT date, kind, amount FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?
        .query_map((user_id, date_text(start), date_text(end)), |row| {
            Ok((
                row.get::<_, Date>(0)?,
                row.get::<_, Kind>(1)?,
                decimal_from_row(row, 2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
