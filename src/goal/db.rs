//! Database functions for savings goals.

use rusqlite::Connection;

use crate::{
    DatabaseID, Error,
    date_format::{date_text, now_timestamp},
    db::{amount_text, decimal_from_row},
    goal::domain::SavingsGoal,
    user::UserID,
};

/// Create the SQL table for savings goals.
///
/// # Errors
/// Returns an error if the table cannot be created.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            target_amount TEXT NOT NULL,
            current_amount TEXT NOT NULL,
            target_date TEXT,
            status TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT 'target',
            color TEXT NOT NULL DEFAULT '#10b981',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )?;

    Ok(())
}

const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, target_date, \
                            status, icon, color, created_at";

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<SavingsGoal> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: decimal_from_row(row, 3)?,
        current_amount: decimal_from_row(row, 4)?,
        target_date: row.get(5)?,
        status: row.get(6)?,
        icon: row.get(7)?,
        color: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a savings goal. The caller decides the status, so reaching the
/// target on create is already reflected. The stored `created_at` is
/// generated here; the caller's value is ignored.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_goal(goal: &SavingsGoal, connection: &Connection) -> Result<DatabaseID, Error> {
    connection.execute(
        "INSERT INTO savings_goal (user_id, name, target_amount, current_amount, target_date,
                                   status, icon, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            goal.user_id,
            &goal.name,
            amount_text(goal.target_amount),
            amount_text(goal.current_amount),
            goal.target_date.map(date_text),
            goal.status,
            &goal.icon,
            &goal.color,
            now_timestamp(),
        ),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Retrieve one of `user_id`'s savings goals.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to
/// another user.
pub fn get_goal(
    goal_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((goal_id, user_id), map_row)?;

    Ok(goal)
}

/// Retrieve all of `user_id`'s savings goals, active goals first, nearest
/// deadline first within each status.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    let goals = connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal WHERE user_id = ?1
             ORDER BY (status != 'active'), target_date IS NULL, target_date ASC, id ASC"
        ))?
        .query_map((user_id,), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(goals)
}

/// Overwrite the stored fields of a savings goal.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to
/// another user.
pub fn update_goal(goal: &SavingsGoal, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal
         SET name = ?1, target_amount = ?2, current_amount = ?3, target_date = ?4, status = ?5,
             icon = ?6, color = ?7
         WHERE id = ?8 AND user_id = ?9",
        (
            &goal.name,
            amount_text(goal.target_amount),
            amount_text(goal.current_amount),
            goal.target_date.map(date_text),
            goal.status,
            &goal.icon,
            &goal.color,
            goal.id,
            goal.user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete one of `user_id`'s savings goals.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to
/// another user.
pub fn delete_goal(
    goal_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (goal_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod goal_db_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        goal::domain::{GoalStatus, SavingsGoal},
        user::{Theme, UserID, create_user},
    };

    use super::{create_goal, delete_goal, get_goal, list_goals, update_goal};

    fn get_test_connection() -> (Connection, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");

        let user = create_user(
            "alice",
            "alice@example.com",
            "hash",
            Theme::Light,
            &connection,
        )
        .expect("Could not create test user.");

        (connection, user.id)
    }

    fn goal(user_id: UserID, name: &str) -> SavingsGoal {
        SavingsGoal {
            id: 0,
            user_id,
            name: name.to_owned(),
            target_amount: "1000.00".parse::<Decimal>().expect("Could not parse amount"),
            current_amount: Decimal::ZERO,
            target_date: Some(date!(2027 - 06 - 01)),
            status: GoalStatus::Active,
            icon: "target".to_owned(),
            color: "#10b981".to_owned(),
            created_at: String::new(),
        }
    }

    #[test]
    fn create_and_get_round_trips() {
        let (connection, user_id) = get_test_connection();

        let mut expected = goal(user_id, "Holiday");
        expected.id = create_goal(&expected, &connection).expect("Could not create goal.");

        let fetched = get_goal(expected.id, user_id, &connection).expect("Could not get goal.");

        assert_eq!(fetched.name, "Holiday");
        assert_eq!(fetched.target_amount.to_string(), "1000.00");
        assert_eq!(fetched.current_amount.to_string(), "0.00");
        assert_eq!(fetched.target_date, expected.target_date);
        assert_eq!(fetched.icon, "target");
        assert_eq!(fetched.color, "#10b981");
        assert!(!fetched.created_at.is_empty());
    }

    #[test]
    fn goals_are_scoped_to_their_owner() {
        let (connection, user_id) = get_test_connection();
        let other = create_user("bob", "bob@example.com", "hash", Theme::Light, &connection)
            .expect("Could not create second user.");

        let id = create_goal(&goal(user_id, "Holiday"), &connection)
            .expect("Could not create goal.");

        assert_eq!(get_goal(id, other.id, &connection), Err(Error::NotFound));
        assert_eq!(delete_goal(id, other.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn active_goals_list_before_finished_ones() {
        let (connection, user_id) = get_test_connection();

        let mut cancelled = goal(user_id, "Old dream");
        cancelled.status = GoalStatus::Cancelled;
        create_goal(&cancelled, &connection).expect("Could not create goal.");
        create_goal(&goal(user_id, "Holiday"), &connection).expect("Could not create goal.");

        let goals = list_goals(user_id, &connection).expect("Could not list goals.");

        assert_eq!(goals[0].name, "Holiday");
        assert_eq!(goals[1].name, "Old dream");
    }

    #[test]
    fn update_persists_new_fields() {
        let (connection, user_id) = get_test_connection();

        let mut stored = goal(user_id, "Holiday");
        stored.id = create_goal(&stored, &connection).expect("Could not create goal.");

        stored.current_amount = "400.00".parse().expect("Could not parse amount");
        stored.status = GoalStatus::Cancelled;
        update_goal(&stored, &connection).expect("Could not update goal.");

        let fetched = get_goal(stored.id, user_id, &connection).expect("Could not get goal.");
        assert_eq!(fetched.current_amount.to_string(), "400.00");
        assert_eq!(fetched.status, GoalStatus::Cancelled);
    }
}
