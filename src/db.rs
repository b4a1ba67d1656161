//! Database initialization and helpers shared by the feature modules.

use rusqlite::{
    Connection, Row,
    types::Type,
};
use rust_decimal::Decimal;

use crate::{
    Error, budget, category, goal, group, transaction, user,
};

/// Create the database tables for the application's domain models.
///
/// Tables are only created if they do not already exist, so it is safe to
/// call this on a database that has been initialized before.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    user::create_user_table(connection)?;
    category::create_category_table(connection)?;
    group::create_group_tables(connection)?;
    transaction::create_transaction_table(connection)?;
    budget::create_budget_table(connection)?;
    goal::create_savings_goal_table(connection)?;

    Ok(())
}

/// Read a monetary amount stored as TEXT from a query result row.
///
/// Amounts are stored as decimal strings rather than REAL so that values
/// like 0.10 survive the round trip exactly.
pub(crate) fn decimal_from_row(row: &Row, index: usize) -> rusqlite::Result<Decimal> {
    let text = row.get::<_, String>(index)?;

    text.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Render a monetary amount as the TEXT stored in the database.
///
/// Amounts are normalized to two decimal places so that string equality and
/// display both behave as currency.
pub(crate) fn amount_text(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount.to_string()
}
