//! Database functions for creating and querying transactions.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    DatabaseID, Error,
    category::Kind,
    date_format::{date_text, now_timestamp},
    db::{amount_text, decimal_from_row},
    pagination::{Page, PageRequest},
    transaction::domain::{RecurringFrequency, Transaction},
    user::UserID,
};

/// Create the SQL table for transactions.
///
/// `transaction` is an SQL keyword so the table name is quoted everywhere.
///
/// # Errors
/// Returns an error if the table cannot be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            kind TEXT NOT NULL,
            category_id INTEGER NOT NULL REFERENCES category(id),
            group_id INTEGER REFERENCES \"group\"(id) ON DELETE SET NULL,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            recurring_frequency TEXT,
            recurring_end_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, user_id, amount, description, date, kind, category_id, \
                                   group_id, is_recurring, recurring_frequency, \
                                   recurring_end_date, created_at";

fn map_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: decimal_from_row(row, 2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        kind: row.get(5)?,
        category_id: row.get(6)?,
        group_id: row.get(7)?,
        is_recurring: row.get(8)?,
        recurring_frequency: row.get(9)?,
        recurring_end_date: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// The optional filters accepted by the transaction list query.
#[derive(Debug, Default)]
pub struct TransactionFilter {
    pub kind: Option<Kind>,
    pub category_id: Option<DatabaseID>,
    pub group_id: Option<DatabaseID>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub month: Option<u8>,
    pub year: Option<i32>,
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Render the filter as SQL conditions and their bound values.
    ///
    /// The caller prepends the user scoping condition, so placeholders start
    /// at `?2`.
    fn to_conditions(&self) -> (Vec<&'static str>, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(kind) = self.kind {
            conditions.push("kind = ?");
            values.push(Value::from(kind.as_str().to_owned()));
        }
        if let Some(category_id) = self.category_id {
            conditions.push("category_id = ?");
            values.push(Value::from(category_id));
        }
        if let Some(group_id) = self.group_id {
            conditions.push("group_id = ?");
            values.push(Value::from(group_id));
        }
        if let Some(start_date) = self.start_date {
            conditions.push("date >= ?");
            values.push(Value::from(date_text(start_date)));
        }
        if let Some(end_date) = self.end_date {
            conditions.push("date <= ?");
            values.push(Value::from(date_text(end_date)));
        }
        if let Some(month) = self.month {
            conditions.push("CAST(strftime('%m', date) AS INTEGER) = ?");
            values.push(Value::from(i64::from(month)));
        }
        if let Some(year) = self.year {
            conditions.push("CAST(strftime('%Y', date) AS INTEGER) = ?");
            values.push(Value::from(i64::from(year)));
        }
        if let Some(search) = &self.search {
            conditions.push("lower(description) LIKE '%' || lower(?) || '%'");
            values.push(Value::from(search.clone()));
        }

        (conditions, values)
    }
}

/// The column a transaction listing can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Description,
}

impl SortField {
    /// The ORDER BY expression for the field.
    ///
    /// Amounts are stored as TEXT, so sorting casts them to REAL. The cast is
    /// only used for ordering, never for arithmetic.
    fn as_sql(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "CAST(amount AS REAL)",
            SortField::Description => "lower(description)",
        }
    }
}

/// The direction a transaction listing is sorted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// The fields stored for a new transaction.
#[derive(Debug)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: String,
    pub date: Date,
    pub kind: Kind,
    pub category_id: DatabaseID,
    pub group_id: Option<DatabaseID>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub recurring_end_date: Option<Date>,
}

/// Create a transaction owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the referenced category or group does not
/// exist.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount_text = amount_text(new_transaction.amount);
    let created_at = now_timestamp();

    connection.execute(
        "INSERT INTO \"transaction\" (user_id, amount, description, date, kind, category_id,
                                      group_id, is_recurring, recurring_frequency,
                                      recurring_end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            user_id,
            &amount_text,
            &new_transaction.description,
            new_transaction.date,
            new_transaction.kind,
            new_transaction.category_id,
            new_transaction.group_id,
            new_transaction.is_recurring,
            new_transaction.recurring_frequency,
            new_transaction.recurring_end_date,
            &created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        user_id,
        amount: amount_text.parse().unwrap_or(new_transaction.amount),
        description: new_transaction.description,
        date: new_transaction.date,
        kind: new_transaction.kind,
        category_id: new_transaction.category_id,
        group_id: new_transaction.group_id,
        is_recurring: new_transaction.is_recurring,
        recurring_frequency: new_transaction.recurring_frequency,
        recurring_end_date: new_transaction.recurring_end_date,
        created_at,
    })
}

/// Retrieve one of `user_id`'s transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn get_transaction(
    transaction_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((transaction_id, user_id), map_row)?;

    Ok(transaction)
}

/// Retrieve a page of `user_id`'s transactions matching `filter`, along with
/// the total number of matches.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    sort_by: SortField,
    order: SortOrder,
    page_request: PageRequest,
    connection: &Connection,
) -> Result<Page<Transaction>, Error> {
    let (conditions, values) = filter.to_conditions();
    let where_clause = if conditions.is_empty() {
        "user_id = ?".to_owned()
    } else {
        format!("user_id = ? AND {}", conditions.join(" AND "))
    };

    let mut count_values = vec![Value::from(user_id.as_i64())];
    count_values.extend(values.iter().cloned());

    // rusqlite reads COUNT(*) as i64; Page wants u64.
    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM \"transaction\" WHERE {where_clause}"),
        params_from_iter(count_values.iter()),
        |row| row.get(0),
    )?;
    let total = total as u64;

    let mut page_values = count_values;
    page_values.push(Value::from(page_request.per_page as i64));
    page_values.push(Value::from(page_request.offset() as i64));

    let items = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {where_clause}
             ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
            sort_by.as_sql(),
            order.as_sql(),
        ))?
        .query_map(params_from_iter(page_values.iter()), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(items, total, page_request))
}

/// Retrieve all of `user_id`'s transactions in a calendar month, ordered by
/// date.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_transactions_for_month(
    user_id: UserID,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
               AND CAST(strftime('%m', date) AS INTEGER) = ?2
               AND CAST(strftime('%Y', date) AS INTEGER) = ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id, month, year), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Overwrite the stored fields of a transaction.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn update_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount = ?1, description = ?2, date = ?3, kind = ?4, category_id = ?5,
             group_id = ?6, is_recurring = ?7, recurring_frequency = ?8,
             recurring_end_date = ?9
         WHERE id = ?10 AND user_id = ?11",
        (
            amount_text(transaction.amount),
            &transaction.description,
            transaction.date,
            transaction.kind,
            transaction.category_id,
            transaction.group_id,
            transaction.is_recurring,
            transaction.recurring_frequency,
            transaction.recurring_end_date,
            transaction.id,
            transaction.user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete one of `user_id`'s transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn delete_transaction(
    transaction_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
