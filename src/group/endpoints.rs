//! Route handlers for shared groups and their members.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, DatabaseID, Error,
    group::{
        db,
        domain::{GroupRole, GroupWithRole},
    },
    user::UserID,
    validation::{FieldErrors, check_length},
};

/// The JSON body for `POST /groups`.
#[derive(Debug, Deserialize)]
pub struct CreateGroupInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateGroupInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "name", &self.name, 1, 200);
        if let Some(description) = &self.description {
            check_length(&mut errors, "description", description, 0, 500);
        }

        errors.finish()
    }
}

/// The JSON body for `PUT /groups/{group_id}`. Absent fields are left
/// unchanged; an explicit `null` description clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateGroupInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub description: Option<Option<String>>,
}

impl UpdateGroupInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            check_length(&mut errors, "name", name, 1, 200);
        }
        if let Some(Some(description)) = &self.description {
            check_length(&mut errors, "description", description, 0, 500);
        }

        errors.finish()
    }
}

/// The JSON body for `POST /groups/{group_id}/members`.
#[derive(Debug, Deserialize)]
pub struct AddMemberInput {
    pub email: String,
    #[serde(default)]
    pub role: Option<GroupRole>,
}

/// Look up the caller's role and require the admin tier.
fn require_admin(
    group_id: DatabaseID,
    user_id: UserID,
    connection: &rusqlite::Connection,
) -> Result<(), Error> {
    let role = db::get_member(group_id, user_id, connection)?;

    if role != GroupRole::Admin {
        return Err(Error::Forbidden("Admin access required"));
    }

    Ok(())
}

/// A route handler for creating a new group.
///
/// The creator becomes the group's owner and its first admin member, in the
/// same database transaction.
pub async fn create_group_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<CreateGroupInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;
    let group = db::create_group(
        user_id,
        &input.name,
        input.description.as_deref(),
        &sql_transaction,
    )?;
    sql_transaction.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Group created successfully",
            "group": GroupWithRole {
                group,
                role: GroupRole::Admin,
            },
        })),
    )
        .into_response())
}

/// A route handler for listing the groups the user belongs to.
pub async fn list_groups_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let groups = db::list_groups(user_id, &connection)?;

    Ok(Json(json!({"groups": groups})).into_response())
}

/// A route handler for fetching a group and its member list.
///
/// Non-members receive a 404 rather than a 403 so they cannot confirm the
/// group exists.
pub async fn get_group_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let group = db::get_group(group_id, user_id, &connection)?;
    let members = db::list_members(group_id, &connection)?;

    Ok(Json(json!({"group": group, "members": members})).into_response())
}

/// A route handler for listing a group's members. Owner or member only;
/// outsiders get a not found, the same as the group itself.
pub async fn list_members_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    db::get_group(group_id, user_id, &connection)?;
    let members = db::list_members(group_id, &connection)?;

    Ok(Json(json!({"members": members})).into_response())
}

/// A route handler for updating a group's name and description. Only the
/// owner may do this.
pub async fn update_group_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<DatabaseID>,
    Json(input): Json<UpdateGroupInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let mut with_role = db::get_group(group_id, user_id, &sql_transaction)?;
    if with_role.group.owner_id != user_id {
        return Err(Error::Forbidden("Only the group owner can update the group"));
    }

    if let Some(name) = input.name {
        with_role.group.name = name;
    }
    if let Some(description) = input.description {
        with_role.group.description = description;
    }

    db::update_group(&with_role.group, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Group updated successfully",
        "group": with_role,
    }))
    .into_response())
}

/// A route handler for deleting a group. Only the owner may do this.
pub async fn delete_group_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let with_role = db::get_group(group_id, user_id, &sql_transaction)?;
    if with_role.group.owner_id != user_id {
        return Err(Error::Forbidden("Only the group owner can delete the group"));
    }

    db::delete_group(group_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({"message": "Group deleted successfully"})).into_response())
}

/// A route handler for adding a member to a group by email. Requires the
/// admin tier.
pub async fn add_member_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<DatabaseID>,
    Json(input): Json<AddMemberInput>,
) -> Result<Response, Error> {
    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    require_admin(group_id, user_id, &sql_transaction)?;
    let member = db::add_member_by_email(
        group_id,
        &input.email,
        input.role.unwrap_or(GroupRole::Member),
        &sql_transaction,
    )?;
    sql_transaction.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Member added successfully",
            "member": member,
        })),
    )
        .into_response())
}

/// A route handler for removing a member from a group.
///
/// Admins can remove anyone except the owner; a member can always remove
/// themself to leave the group.
pub async fn remove_member_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path((group_id, member_id)): Path<(DatabaseID, i64)>,
) -> Result<Response, Error> {
    let member_id = UserID::new(member_id);

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let with_role = db::get_group(group_id, user_id, &sql_transaction)?;
    if with_role.group.owner_id == member_id {
        return Err(Error::Conflict("the group owner cannot be removed"));
    }
    if member_id != user_id {
        require_admin(group_id, user_id, &sql_transaction)?;
    }

    db::remove_member(group_id, member_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({"message": "Member removed successfully"})).into_response())
}
