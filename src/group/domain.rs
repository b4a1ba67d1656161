//! Defines shared groups and their membership roles.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{DatabaseID, user::UserID};

/// The role a user holds within a group.
///
/// The group's owner always holds the admin role in addition to the
/// owner-only privileges tied to `Group::owner_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }
}

impl ToSql for GroupRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for GroupRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            other => Err(FromSqlError::Other(
                format!("invalid group role '{other}'").into(),
            )),
        }
    }
}

/// A group of users who share expenses, such as a household or a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: DatabaseID,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserID,
    pub created_at: String,
}

/// A group seen from one member's perspective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupWithRole {
    #[serde(flatten)]
    pub group: Group,
    pub role: GroupRole,
}

/// A user's membership in a group, joined with their public profile fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub user_id: UserID,
    pub username: String,
    pub email: String,
    pub role: GroupRole,
    pub joined_at: String,
}
