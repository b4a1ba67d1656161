//! Database functions for creating and managing categories.

use rusqlite::{Connection, Row};

use crate::{
    DatabaseID, Error,
    category::domain::{Category, Kind},
    date_format::now_timestamp,
    user::UserID,
};

/// Create the SQL table for categories.
///
/// # Errors
/// Returns an error if the table cannot be created.
pub fn create_category_table(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            color TEXT NOT NULL,
            icon TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, name, kind)
        )",
        (),
    )?;

    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, color, icon, created_at";

fn map_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Create a category owned by `user_id`.
///
/// # Errors
/// Returns [Error::Conflict] if the user already has a category with the
/// same name and kind.
pub fn create_category(
    user_id: UserID,
    name: &str,
    kind: Kind,
    color: &str,
    icon: Option<&str>,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = now_timestamp();

    connection.execute(
        "INSERT INTO category (user_id, name, kind, color, icon, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (user_id, name, kind, color, icon, &created_at),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name: name.to_owned(),
        kind,
        color: color.to_owned(),
        icon: icon.map(str::to_owned),
        created_at,
    })
}

/// Retrieve one of `user_id`'s categories.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    category_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((category_id, user_id), map_row)?;

    Ok(category)
}

/// Retrieve all of `user_id`'s categories, optionally restricted to one kind,
/// ordered by name.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_categories(
    user_id: UserID,
    kind: Option<Kind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let categories = match kind {
        Some(kind) => connection
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM category
                 WHERE user_id = ?1 AND kind = ?2 ORDER BY name ASC, id ASC"
            ))?
            .query_map((user_id, kind), map_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => connection
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM category
                 WHERE user_id = ?1 ORDER BY name ASC, id ASC"
            ))?
            .query_map((user_id,), map_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(categories)
}

/// Overwrite the stored fields of a category.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user, or [Error::Conflict] if the new name and kind collide with
/// another of the user's categories.
pub fn update_category(category: &Category, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, kind = ?2, color = ?3, icon = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            &category.name,
            category.kind,
            &category.color,
            category.icon.as_deref(),
            category.id,
            category.user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The number of transactions that reference a category.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn count_transactions(
    category_id: DatabaseID,
    connection: &Connection,
) -> Result<u64, Error> {
    // rusqlite reads COUNT(*) as i64.
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM \"transaction\" WHERE category_id = ?1",
        (category_id,),
        |row| row.get(0),
    )?;

    Ok(count as u64)
}

/// Delete one of `user_id`'s categories.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user, or [Error::CategoryInUse] if transactions still reference
/// the category.
pub fn delete_category(
    category_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    // Confirm ownership before the guard so another user's category id does
    // not leak its transaction count.
    get_category(category_id, user_id, connection)?;

    let transaction_count = count_transactions(category_id, connection)?;
    if transaction_count > 0 {
        return Err(Error::CategoryInUse { transaction_count });
    }

    connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id),
    )?;

    Ok(())
}

#[cfg(test)]
mod category_db_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        category::domain::{DEFAULT_COLOR, Kind},
        db::initialize,
        user::{Theme, UserID, create_user},
    };

    use super::{
        create_category, delete_category, get_category, list_categories, update_category,
    };

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

    #[test]
    fn create_and_get_category() {
        let (connection, user_id) = get_test_connection();

        let created = create_category(
            user_id,
            "Groceries",
            Kind::Expense,
            DEFAULT_COLOR,
            Some("cart"),
            &connection,
        )
        .expect("Could not create category.");

        let fetched =
            get_category(created.id, user_id, &connection).expect("Could not get category.");

        assert_eq!(created, fetched);
    }

    #[test]
    fn duplicate_name_and_kind_conflicts() {
        let (connection, user_id) = get_test_connection();

        create_category(user_id, "Gifts", Kind::Expense, DEFAULT_COLOR, None, &connection)
            .expect("Could not create category.");

        let duplicate =
            create_category(user_id, "Gifts", Kind::Expense, DEFAULT_COLOR, None, &connection);

        assert!(matches!(duplicate, Err(Error::Conflict(_))));
    }

    #[test]
    fn same_name_with_different_kind_is_allowed() {
        let (connection, user_id) = get_test_connection();

        create_category(user_id, "Gifts", Kind::Expense, DEFAULT_COLOR, None, &connection)
            .expect("Could not create expense category.");
        create_category(user_id, "Gifts", Kind::Income, DEFAULT_COLOR, None, &connection)
            .expect("Could not create income category with the same name.");
    }

    #[test]
    fn categories_are_scoped_to_their_owner() {
        let (connection, user_id) = get_test_connection();
        let other = create_user(
            "bob",
            "bob@example.com",
            "hash",
            Theme::Light,
            &connection,
        )
        .expect("Could not create second user.");

        let category = create_category(
            user_id,
            "Groceries",
            Kind::Expense,
            DEFAULT_COLOR,
            None,
            &connection,
        )
        .expect("Could not create category.");

        assert_eq!(
            get_category(category.id, other.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            list_categories(other.id, None, &connection)
                .expect("Could not list categories.")
                .len(),
            0
        );
    }

    #[test]
    fn list_filters_by_kind_and_sorts_by_name() {
        let (connection, user_id) = get_test_connection();

        create_category(user_id, "Rent", Kind::Expense, DEFAULT_COLOR, None, &connection)
            .expect("Could not create category.");
        create_category(user_id, "Groceries", Kind::Expense, DEFAULT_COLOR, None, &connection)
            .expect("Could not create category.");
        create_category(user_id, "Salary", Kind::Income, DEFAULT_COLOR, None, &connection)
            .expect("Could not create category.");

        let expenses = list_categories(user_id, Some(Kind::Expense), &connection)
            .expect("Could not list categories.");

        let names: Vec<&str> = expenses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);
    }

    #[test]
    fn update_persists_new_fields() {
        let (connection, user_id) = get_test_connection();

        let mut category = create_category(
            user_id,
            "Groceries",
            Kind::Expense,
            DEFAULT_COLOR,
            None,
            &connection,
        )
        .expect("Could not create category.");

        category.name = "Food".to_owned();
        category.color = "#ff0000".to_owned();
        update_category(&category, &connection).expect("Could not update category.");

        let fetched =
            get_category(category.id, user_id, &connection).expect("Could not get category.");
        assert_eq!(fetched.name, "Food");
        assert_eq!(fetched.color, "#ff0000");
    }

    #[test]
    fn delete_removes_the_category() {
        let (connection, user_id) = get_test_connection();

        let category = create_category(
            user_id,
            "Groceries",
            Kind::Expense,
            DEFAULT_COLOR,
            None,
            &connection,
        )
        .expect("Could not create category.");

        delete_category(category.id, user_id, &connection).expect("Could not delete category.");

        assert_eq!(
            get_category(category.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }
}
