//! Database functions for groups and their memberships.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    DatabaseID, Error,
    date_format::now_timestamp,
    group::domain::{Group, GroupMember, GroupRole, GroupWithRole},
    user::UserID,
};

/// Create the SQL tables for groups and group memberships.
///
/// `group` is an SQL keyword so the table name is quoted everywhere.
///
/// # Errors
/// Returns an error if the tables cannot be created.
pub fn create_group_tables(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"group\" (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            owner_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS group_member (
            id INTEGER PRIMARY KEY,
            group_id INTEGER NOT NULL REFERENCES \"group\"(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            joined_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(group_id, user_id)
        )",
        (),
    )?;

    Ok(())
}

fn map_group_row(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Create a group owned by `owner_id`, adding the owner as an admin member.
///
/// Callers should run this inside an SQL transaction so the group and the
/// owner's membership land together.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_group(
    owner_id: UserID,
    name: &str,
    description: Option<&str>,
    connection: &Connection,
) -> Result<Group, Error> {
    let created_at = now_timestamp();

    connection.execute(
        "INSERT INTO \"group\" (name, description, owner_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        (name, description, owner_id, &created_at),
    )?;
    let id = connection.last_insert_rowid();

    connection.execute(
        "INSERT INTO group_member (group_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
        (id, owner_id, GroupRole::Admin, &created_at),
    )?;

    Ok(Group {
        id,
        name: name.to_owned(),
        description: description.map(str::to_owned),
        owner_id,
        created_at,
    })
}

/// Retrieve a group that `user_id` is a member of, along with their role.
///
/// # Errors
/// Returns [Error::NotFound] if the group does not exist or the user is not
/// a member, so non-members cannot tell the two cases apart.
pub fn get_group(
    group_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<GroupWithRole, Error> {
    let role = get_member(group_id, user_id, connection)?;
    let group = connection.query_row(
        "SELECT id, name, description, owner_id, created_at FROM \"group\" WHERE id = ?1",
        (group_id,),
        map_group_row,
    )?;

    Ok(GroupWithRole { group, role })
}

/// The role `user_id` holds in a group.
///
/// # Errors
/// Returns [Error::NotFound] if the user is not a member of the group.
pub fn get_member(
    group_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<GroupRole, Error> {
    let role = connection.query_row(
        "SELECT role FROM group_member WHERE group_id = ?1 AND user_id = ?2",
        (group_id, user_id),
        |row| row.get(0),
    )?;

    Ok(role)
}

/// Retrieve every group `user_id` is a member of, ordered by name.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_groups(user_id: UserID, connection: &Connection) -> Result<Vec<GroupWithRole>, Error> {
    let groups = connection
        .prepare(
            "SELECT g.id, g.name, g.description, g.owner_id, g.created_at, gm.role
             FROM \"group\" g
             INNER JOIN group_member gm ON gm.group_id = g.id
             WHERE gm.user_id = ?1
             ORDER BY g.name ASC, g.id ASC",
        )?
        .query_map((user_id,), |row| {
            Ok(GroupWithRole {
                group: map_group_row(row)?,
                role: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(groups)
}

/// Retrieve every member of a group, owner first, then by username.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_members(
    group_id: DatabaseID,
    connection: &Connection,
) -> Result<Vec<GroupMember>, Error> {
    let members = connection
        .prepare(
            "SELECT u.id, u.username, u.email, gm.role, gm.joined_at
             FROM group_member gm
             INNER JOIN user u ON u.id = gm.user_id
             INNER JOIN \"group\" g ON g.id = gm.group_id
             WHERE gm.group_id = ?1
             ORDER BY (u.id = g.owner_id) DESC, u.username ASC",
        )?
        .query_map((group_id,), |row| {
            Ok(GroupMember {
                user_id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                joined_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(members)
}

/// Overwrite a group's name and description.
///
/// # Errors
/// Returns [Error::NotFound] if the group does not exist.
pub fn update_group(group: &Group, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"group\" SET name = ?1, description = ?2 WHERE id = ?3",
        (&group.name, group.description.as_deref(), group.id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a group. Memberships cascade, and transactions that referenced the
/// group keep their other fields with the group link cleared.
///
/// # Errors
/// Returns [Error::NotFound] if the group does not exist.
pub fn delete_group(group_id: DatabaseID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"group\" WHERE id = ?1", (group_id,))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Add the user with the given email to a group.
///
/// # Errors
/// Returns [Error::NotFound] if no user has that email, or [Error::Conflict]
/// if they are already a member.
pub fn add_member_by_email(
    group_id: DatabaseID,
    email: &str,
    role: GroupRole,
    connection: &Connection,
) -> Result<GroupMember, Error> {
    let member = connection
        .query_row(
            "SELECT id, username, email FROM user WHERE email = ?1",
            (email,),
            |row| {
                Ok((
                    row.get::<_, UserID>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?
        .ok_or(Error::NotFound)?;

    let joined_at = now_timestamp();
    connection.execute(
        "INSERT INTO group_member (group_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
        (group_id, member.0, role, &joined_at),
    )?;

    Ok(GroupMember {
        user_id: member.0,
        username: member.1,
        email: member.2,
        role,
        joined_at,
    })
}

/// Remove a user from a group.
///
/// # Errors
/// Returns [Error::NotFound] if the user is not a member of the group.
pub fn remove_member(
    group_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM group_member WHERE group_id = ?1 AND user_id = ?2",
        (group_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
