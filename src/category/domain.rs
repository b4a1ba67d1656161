//! Defines categories and the income/expense kind shared with transactions.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{DatabaseID, user::UserID};

/// The color assigned to categories created without an explicit one.
pub const DEFAULT_COLOR: &str = "#6366f1";

/// Whether a category or transaction records money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl ToSql for Kind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Kind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid kind '{other}'").into(),
            )),
        }
    }
}

/// A label that groups transactions, such as "Groceries" or "Salary".
///
/// Each user has their own set of categories. The same name may be used once
/// per kind, so "Gifts" can exist as both an income and an expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: DatabaseID,
    pub user_id: UserID,
    pub name: String,
    pub kind: Kind,
    pub color: String,
    pub icon: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod kind_tests {
    use super::Kind;

    #[test]
    fn kind_serializes_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&Kind::Income).expect("Could not serialize kind"),
            "\"income\""
        );
        assert_eq!(
            serde_json::to_string(&Kind::Expense).expect("Could not serialize kind"),
            "\"expense\""
        );
    }

    #[test]
    fn kind_rejects_unknown_values() {
        assert!(serde_json::from_str::<Kind>("\"transfer\"").is_err());
    }
}
