//! Defines transactions, the core record of money moving in or out.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{DatabaseID, category::Kind, user::UserID};

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringFrequency::Daily => "daily",
            RecurringFrequency::Weekly => "weekly",
            RecurringFrequency::Monthly => "monthly",
            RecurringFrequency::Yearly => "yearly",
        }
    }
}

impl ToSql for RecurringFrequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RecurringFrequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "daily" => Ok(RecurringFrequency::Daily),
            "weekly" => Ok(RecurringFrequency::Weekly),
            "monthly" => Ok(RecurringFrequency::Monthly),
            "yearly" => Ok(RecurringFrequency::Yearly),
            other => Err(FromSqlError::Other(
                format!("invalid recurring frequency '{other}'").into(),
            )),
        }
    }
}

/// An amount of money that a user spent or earned on a given date.
///
/// The amount is always positive; [Kind] records the direction. It must match
/// the kind of the referenced category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub amount: Decimal,
    pub description: String,
    #[serde(with = "crate::date_format")]
    pub date: Date,
    pub kind: Kind,
    pub category_id: DatabaseID,
    pub group_id: Option<DatabaseID>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(with = "crate::date_format::option")]
    pub recurring_end_date: Option<Date>,
    pub created_at: String,
}

#[cfg(test)]
mod transaction_domain_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{category::Kind, user::UserID};

    use super::Transaction;

    #[test]
    fn transaction_serializes_amount_and_date_as_strings() {
        let transaction = Transaction {
            id: 1,
            user_id: UserID::new(1),
            amount: "12.50".parse::<Decimal>().expect("Could not parse amount"),
            description: "Weekly shop".to_owned(),
            date: date!(2026 - 08 - 01),
            kind: Kind::Expense,
            category_id: 3,
            group_id: None,
            is_recurring: false,
            recurring_frequency: None,
            recurring_end_date: Some(date!(2027 - 01 - 01)),
            created_at: "2026-08-01 12:00:00".to_owned(),
        };

        let value = serde_json::to_value(&transaction).expect("Could not serialize transaction");

        assert_eq!(value["amount"], serde_json::json!("12.50"));
        assert_eq!(value["date"], serde_json::json!("2026-08-01"));
        assert_eq!(value["recurring_end_date"], serde_json::json!("2027-01-01"));
    }
}
