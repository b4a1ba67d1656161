//! Route handlers for creating, querying, and managing transactions.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, DatabaseID, Error,
    category::{self, Kind},
    date_format::parse_date,
    group,
    pagination::PageParams,
    transaction::{
        db::{
            self, NewTransaction, SortField, SortOrder, TransactionFilter,
        },
        domain::{RecurringFrequency, Transaction},
    },
    user::UserID,
    validation::{FieldErrors, check_length, check_positive_amount, check_range},
};

/// The JSON body for `POST /transactions`.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub amount: Decimal,
    pub description: String,
    pub date: String,
    pub kind: Kind,
    pub category_id: DatabaseID,
    #[serde(default)]
    pub group_id: Option<DatabaseID>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub recurring_end_date: Option<String>,
}

impl CreateTransactionInput {
    fn validate(&self) -> Result<(Date, Option<Date>), Error> {
        let mut errors = FieldErrors::new();

        check_positive_amount(&mut errors, "amount", self.amount);
        check_length(&mut errors, "description", &self.description, 1, 200);
        let date = check_date(&mut errors, "date", &self.date);
        // The end date of a recurring schedule is usually in the future, so
        // it only gets the format check.
        let recurring_end_date = parse_date_param(
            &mut errors,
            "recurring_end_date",
            self.recurring_end_date.as_deref(),
        );
        if self.is_recurring && self.recurring_frequency.is_none() {
            errors.add(
                "recurring_frequency",
                "Recurring frequency is required for recurring transactions",
            );
        }

        errors.finish()?;

        // The date is only absent when errors were recorded for it, and
        // finish already returned them.
        let date = date.ok_or(Error::NotFound)?;
        Ok((date, recurring_end_date))
    }
}

/// Parse a date field, rejecting malformed values and dates in the future.
fn check_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Date> {
    let Ok(date) = parse_date(value) else {
        errors.add(field, "Date must be in YYYY-MM-DD format");
        return None;
    };

    if date > OffsetDateTime::now_utc().date() {
        errors.add(field, "Date cannot be in the future");
        return None;
    }

    Some(date)
}

/// The JSON body for `PUT /transactions/{transaction_id}`. Absent fields are
/// left unchanged; nullable fields can be cleared by sending an explicit
/// `null`.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionInput {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub category_id: Option<DatabaseID>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub group_id: Option<Option<DatabaseID>>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub recurring_frequency: Option<Option<RecurringFrequency>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub recurring_end_date: Option<Option<String>>,
}

impl UpdateTransactionInput {
    fn validate(&self) -> Result<(Option<Date>, Option<Option<Date>>), Error> {
        let mut errors = FieldErrors::new();

        if let Some(amount) = self.amount {
            check_positive_amount(&mut errors, "amount", amount);
        }
        if let Some(description) = &self.description {
            check_length(&mut errors, "description", description, 1, 200);
        }
        let date = self
            .date
            .as_deref()
            .and_then(|value| check_date(&mut errors, "date", value));
        let recurring_end_date = match &self.recurring_end_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(value)) => {
                parse_date_param(&mut errors, "recurring_end_date", Some(value.as_str())).map(Some)
            }
        };

        errors.finish()?;

        Ok((date, recurring_end_date))
    }
}

/// The query parameters for `GET /transactions`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsParams {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
    #[serde(default)]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub category_id: Option<DatabaseID>,
    #[serde(default)]
    pub group_id: Option<DatabaseID>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl ListTransactionsParams {
    fn to_filter(&self) -> Result<TransactionFilter, Error> {
        let mut errors = FieldErrors::new();

        let start_date = parse_date_param(&mut errors, "start_date", self.start_date.as_deref());
        let end_date = parse_date_param(&mut errors, "end_date", self.end_date.as_deref());
        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            errors.add("start_date", "Start date must not be after end date");
        }
        if let Some(month) = self.month {
            check_range(&mut errors, "month", month, 1, 12);
        }
        if let Some(year) = self.year {
            check_range(&mut errors, "year", year, 1900, 2100);
        }

        errors.finish()?;

        Ok(TransactionFilter {
            kind: self.kind,
            category_id: self.category_id,
            group_id: self.group_id,
            start_date,
            end_date,
            month: self.month.map(|month| month as u8),
            year: self.year,
            search: self.search.clone(),
        })
    }
}

fn parse_date_param(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<Date> {
    let value = value?;

    match parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Date must be in YYYY-MM-DD format");
            None
        }
    }
}

/// The query parameters for `GET /transactions/calendar`.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl CalendarParams {
    fn validate(&self) -> Result<(u8, i32), Error> {
        let mut errors = FieldErrors::new();

        match self.month {
            Some(month) => check_range(&mut errors, "month", month, 1, 12),
            None => errors.add("month", "This field is required"),
        }
        match self.year {
            Some(year) => check_range(&mut errors, "year", year, 1900, 2100),
            None => errors.add("year", "This field is required"),
        }

        errors.finish()?;

        // finish bailed out unless both fields were present and in range.
        Ok((self.month.unwrap_or(1) as u8, self.year.unwrap_or(1900)))
    }
}

/// Check that the referenced category exists, belongs to the user, and has
/// the same kind as the transaction.
fn check_category(
    category_id: DatabaseID,
    kind: Kind,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let category = category::get_category(category_id, user_id, connection)?;

    if category.kind != kind {
        let mut errors = FieldErrors::new();
        errors.add("kind", "Transaction kind must match the category kind");
        return errors.finish();
    }

    Ok(())
}

/// Check that the referenced group exists and the user is a member of it.
fn check_group(
    group_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    group::get_member(group_id, user_id, connection).map(|_| ())
}

/// A route handler for creating a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<CreateTransactionInput>,
) -> Result<Response, Error> {
    let (date, recurring_end_date) = input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    check_category(input.category_id, input.kind, user_id, &sql_transaction)?;
    if let Some(group_id) = input.group_id {
        check_group(group_id, user_id, &sql_transaction)?;
    }

    let transaction = db::create_transaction(
        user_id,
        NewTransaction {
            amount: input.amount,
            description: input.description,
            date,
            kind: input.kind,
            category_id: input.category_id,
            group_id: input.group_id,
            is_recurring: input.is_recurring,
            recurring_frequency: input.recurring_frequency.filter(|_| input.is_recurring),
            recurring_end_date: recurring_end_date.filter(|_| input.is_recurring),
        },
        &sql_transaction,
    )?;
    sql_transaction.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaction created successfully",
            "transaction": transaction,
        })),
    )
        .into_response())
}

/// A route handler for listing transactions with filtering, sorting, and
/// pagination.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<ListTransactionsParams>,
) -> Result<Response, Error> {
    let filter = params.to_filter()?;
    let page_request = PageParams {
        page: params.page,
        per_page: params.per_page,
    }
    .resolve(&state.pagination_config);

    let connection = state.lock_connection()?;
    let page = db::list_transactions(
        user_id,
        &filter,
        params.sort_by.unwrap_or_default(),
        params.order.unwrap_or_default(),
        page_request,
        &connection,
    )?;

    Ok(Json(page).into_response())
}

/// A route handler for the calendar view: every transaction in a month,
/// grouped by day.
pub async fn transaction_calendar_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<CalendarParams>,
) -> Result<Response, Error> {
    let (month, year) = params.validate()?;

    let connection = state.lock_connection()?;
    let transactions = db::list_transactions_for_month(user_id, month, year, &connection)?;

    let mut calendar: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();
    for transaction in transactions {
        let day = crate::date_format::date_text(transaction.date);
        calendar.entry(day).or_default().push(transaction);
    }

    Ok(Json(json!({
        "month": month,
        "year": year,
        "calendar": calendar,
    }))
    .into_response())
}

/// A route handler for fetching a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let transaction = db::get_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({"transaction": transaction})).into_response())
}

/// A route handler for updating a transaction.
///
/// The kind/category match is re-checked against the merged result, so a
/// request cannot sneak a mismatch in by changing only one side.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
    Json(input): Json<UpdateTransactionInput>,
) -> Result<Response, Error> {
    let (date, recurring_end_date) = input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let mut transaction = db::get_transaction(transaction_id, user_id, &sql_transaction)?;

    if let Some(amount) = input.amount {
        transaction.amount = amount;
    }
    if let Some(description) = input.description {
        transaction.description = description;
    }
    if let Some(date) = date {
        transaction.date = date;
    }
    if let Some(kind) = input.kind {
        transaction.kind = kind;
    }
    if let Some(category_id) = input.category_id {
        transaction.category_id = category_id;
    }
    if let Some(group_id) = input.group_id {
        transaction.group_id = group_id;
    }
    if let Some(is_recurring) = input.is_recurring {
        transaction.is_recurring = is_recurring;
    }
    if let Some(recurring_frequency) = input.recurring_frequency {
        transaction.recurring_frequency = recurring_frequency;
    }
    if let Some(recurring_end_date) = recurring_end_date {
        transaction.recurring_end_date = recurring_end_date;
    }
    if !transaction.is_recurring {
        transaction.recurring_frequency = None;
        transaction.recurring_end_date = None;
    } else if transaction.recurring_frequency.is_none() {
        let mut errors = FieldErrors::new();
        errors.add(
            "recurring_frequency",
            "Recurring frequency is required for recurring transactions",
        );
        errors.finish()?;
    }

    check_category(
        transaction.category_id,
        transaction.kind,
        user_id,
        &sql_transaction,
    )?;
    if let Some(Some(group_id)) = input.group_id {
        check_group(group_id, user_id, &sql_transaction)?;
    }

    db::update_transaction(&transaction, &sql_transaction)?;

    // Amounts are normalized to two decimal places when stored, so re-read
    // the row to echo the stored form back.
    let transaction = db::get_transaction(transaction_id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Transaction updated successfully",
        "transaction": transaction,
    }))
    .into_response())
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    db::delete_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({"message": "Transaction deleted successfully"})).into_response())
}
