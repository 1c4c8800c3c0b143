// ABOUTME: CRUD pages for registered models: table view, add, edit, delete, delete all, CSV upload
// ABOUTME: Reports outcomes as flash messages and attaches history actions to successful changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Model routes
//!
//! Every handler resolves the model from the path first, so an unknown model is
//! a 404 before any form is read. Write failures caused by the data (missing
//! fields, bad values, constraint violations) are reported as flash messages
//! on the re-rendered page, never as error responses.

use super::{render_page, with_history};
use crate::context::AdminContext;
use crate::csv_import::upload_csv;
use crate::database::{ConstraintViolation, SearchFilter};
use crate::errors::AppError;
use crate::flash::Flashes;
use crate::logging::AppLogger;
use crate::middleware::{AdminUser, HistoryAction};
use crate::schema::TableDetails;
use crate::utils::{
    correct_id_types, correct_types, extract_obj_id_from_query, get_changes,
    get_obj_id_from_row, not_filled, retain_changed, reverse_hash_names, rowid_alias, Params,
};
use crate::views::{model_form, model_table, FormMode, TablePage};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Extension, Form, Router,
};
use crud_admin_core::coercion::coerce_identity;
use crud_admin_core::models::{FieldValue, ObjectId, Row};
use serde::Deserialize;
use tracing::{info, warn};

/// Table view query string
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Column to search in
    pub field: Option<String>,
    /// Text to search for
    pub search: Option<String>,
}

/// Edit form query string
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    /// JSON encoded object id
    #[serde(rename = "_id")]
    pub id: String,
}

/// Model CRUD routes
pub struct ModelRoutes;

impl ModelRoutes {
    /// Create the per-model routes
    pub fn routes() -> Router<AdminContext> {
        Router::new()
            .route("/:model_id", get(Self::handle_table))
            .route(
                "/:model_id/add",
                get(Self::handle_add_form).post(Self::handle_add),
            )
            .route(
                "/:model_id/edit",
                get(Self::handle_edit_form).post(Self::handle_edit),
            )
            .route("/:model_id/delete", post(Self::handle_delete))
            .route("/:model_id/delete_all", post(Self::handle_delete_all))
            .route("/:model_id/upload", post(Self::handle_upload))
    }

    async fn handle_table(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Query(query): Query<TableQuery>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        table_response(&ctx, &user, details, &query, &Flashes::new()).await
    }

    async fn handle_add_form(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        Ok(form_response(&ctx, &user, details, FormMode::Add, None, &Flashes::new()))
    }

    async fn handle_add(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Form(params): Form<Params>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let mut flashes = Flashes::new();
        let mut history = None;

        let missing = not_filled(details, &params);
        if missing.is_empty() {
            match prepare_row(&ctx, details, params) {
                Err(message) => {
                    AppLogger::log_rejected_write(&model_id, "add", &message);
                    flashes.error(message);
                }
                Ok(mut row) => match ctx.database.insert_row(details, &row).await {
                    Ok(rowid) => {
                        if let Some(alias) = rowid_alias(details) {
                            if row.get(alias).map_or(true, FieldValue::is_null) {
                                row.insert(alias.to_owned(), FieldValue::Integer(rowid));
                            }
                        }
                        let object_id = get_obj_id_from_row(details, &row);
                        let message = format!("Object with {object_id} was added.");
                        AppLogger::log_admin_change(
                            user.name(),
                            &model_id,
                            "add",
                            &object_id.to_string(),
                        );
                        history = Some(HistoryAction::for_model(
                            &model_id,
                            &message,
                            object_id.to_string(),
                        ));
                        flashes.success(message);
                    }
                    Err(e) => {
                        let violation = ConstraintViolation::classify(&e);
                        AppLogger::log_rejected_write(&model_id, "add", &violation.to_string());
                        flashes.error(violation.user_message(&model_id));
                    }
                },
            }
        } else {
            flashes.error(format!("Fields {missing:?} required. Please fill it"));
        }

        Ok(with_history(
            form_response(&ctx, &user, details, FormMode::Add, None, &flashes),
            history,
        ))
    }

    async fn handle_edit_form(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Query(query): Query<EditQuery>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let object_id = match parse_object_id(details, &query.id) {
            Ok(object_id) => object_id,
            Err(message) => return table_with_error(&ctx, &user, details, message).await,
        };

        match ctx.database.get_by_params(details, &object_id).await? {
            Some(row) => Ok(form_response(
                &ctx,
                &user,
                details,
                FormMode::Edit(&object_id),
                Some(&row),
                &Flashes::new(),
            )),
            None => {
                table_with_error(&ctx, &user, details, format!("Object with id {object_id} not found"))
                    .await
            }
        }
    }

    async fn handle_edit(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Query(query): Query<EditQuery>,
        Form(params): Form<Params>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let previous_id = match parse_object_id(details, &query.id) {
            Ok(object_id) => object_id,
            Err(message) => return table_with_error(&ctx, &user, details, message).await,
        };
        let Some(old_row) = ctx.database.get_by_params(details, &previous_id).await? else {
            return table_with_error(
                &ctx,
                &user,
                details,
                format!("Object with id {previous_id} not found"),
            )
            .await;
        };

        let mut flashes = Flashes::new();
        let missing: Vec<String> = not_filled(details, &params)
            .into_iter()
            .filter(|name| !details.is_hashed(name))
            .collect();
        if !missing.is_empty() {
            flashes.error(format!("Fields {missing:?} required. Please fill it"));
            return Ok(form_response(
                &ctx,
                &user,
                details,
                FormMode::Edit(&previous_id),
                Some(&old_row),
                &flashes,
            ));
        }

        let row = match prepare_row(&ctx, details, params) {
            Ok(row) => retain_changed(details, &old_row, row),
            Err(message) => {
                AppLogger::log_rejected_write(&model_id, "edit", &message);
                flashes.error(message);
                return Ok(form_response(
                    &ctx,
                    &user,
                    details,
                    FormMode::Edit(&previous_id),
                    Some(&old_row),
                    &flashes,
                ));
            }
        };

        match ctx.database.update_row(details, &previous_id, &row).await {
            Ok(_) => {
                let mut merged = old_row.clone();
                merged.extend(display_keys(details, row));
                let new_id = get_obj_id_from_row(details, &merged);
                let new_row = ctx
                    .database
                    .get_by_params(details, &new_id)
                    .await?
                    .unwrap_or(merged);
                let changes = get_changes(&old_row, &new_row);
                let message =
                    format!("Object with id {previous_id} was updated. Changes: {changes}");
                AppLogger::log_admin_change(
                    user.name(),
                    &model_id,
                    "edit",
                    &previous_id.to_string(),
                );
                flashes.success(&message);
                let history =
                    HistoryAction::for_model(&model_id, message, previous_id.to_string());
                Ok(with_history(
                    form_response(
                        &ctx,
                        &user,
                        details,
                        FormMode::Edit(&new_id),
                        Some(&new_row),
                        &flashes,
                    ),
                    Some(history),
                ))
            }
            Err(e) => {
                let violation = ConstraintViolation::classify(&e);
                AppLogger::log_rejected_write(&model_id, "edit", &violation.to_string());
                if violation.is_foreign_key() {
                    flashes.error(format!(
                        "ForeignKey error. Impossible to edit {} field for row {previous_id}, because exists objects that depend on it.",
                        details.identity.join(", ")
                    ));
                } else {
                    flashes.error(violation.user_message(&model_id));
                }
                Ok(form_response(
                    &ctx,
                    &user,
                    details,
                    FormMode::Edit(&previous_id),
                    Some(&old_row),
                    &flashes,
                ))
            }
        }
    }

    async fn handle_delete(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Form(params): Form<Params>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let object_id = match delete_target(details, &params) {
            Ok(object_id) => object_id,
            Err(message) => return table_with_error(&ctx, &user, details, message).await,
        };
        if object_id.is_empty() {
            return table_with_error(&ctx, &user, details, "Object id is missing".to_owned())
                .await;
        }

        let mut flashes = Flashes::new();
        let mut history = None;
        match ctx.database.delete_row(details, &object_id).await {
            Ok(0) => flashes.error(format!("Object with {object_id} not found")),
            Ok(_) => {
                let message = format!("Object with {object_id} was deleted");
                AppLogger::log_admin_change(
                    user.name(),
                    &model_id,
                    "delete",
                    &object_id.to_string(),
                );
                history = Some(HistoryAction::for_model(
                    &model_id,
                    &message,
                    object_id.to_string(),
                ));
                flashes.success(message);
            }
            Err(e) => {
                let violation = ConstraintViolation::classify(&e);
                AppLogger::log_rejected_write(&model_id, "delete", &violation.to_string());
                flashes.error(violation.user_message(&model_id));
            }
        }

        let response = table_response(&ctx, &user, details, &TableQuery::default(), &flashes).await?;
        Ok(with_history(response, history))
    }

    async fn handle_delete_all(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let mut flashes = Flashes::new();
        let mut history = None;

        match ctx.database.delete_all_rows(details).await {
            Ok(deleted) => {
                let message = format!("All objects in {model_id} was deleted");
                info!(model = %model_id, deleted, "Deleted all rows");
                AppLogger::log_admin_change(user.name(), &model_id, "delete_all", &model_id);
                history = Some(HistoryAction::for_model(&model_id, &message, &model_id));
                flashes.success(message);
            }
            Err(e) => {
                let violation = ConstraintViolation::classify(&e);
                AppLogger::log_rejected_write(&model_id, "delete_all", &violation.to_string());
                flashes.error(violation.user_message(&model_id));
            }
        }

        let response = table_response(&ctx, &user, details, &TableQuery::default(), &flashes).await?;
        Ok(with_history(response, history))
    }

    async fn handle_upload(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        mut multipart: Multipart,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let mut content = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid_input(format!("Malformed upload: {e}")))?
        {
            if field.name() == Some("file") {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::invalid_input(format!("Malformed upload: {e}")))?;
                content = Some(bytes);
                break;
            }
        }

        let mut flashes = Flashes::new();
        let mut history = None;
        match content {
            None => flashes.error("No file was uploaded"),
            Some(bytes) => match upload_csv(
                &ctx.database,
                details,
                bytes.as_ref(),
                ctx.config.hash_method,
                ctx.config.csv_update_existing,
            )
            .await
            {
                Ok(report) => {
                    let summary = report.summary(&model_id);
                    if report.inserted + report.updated > 0 {
                        AppLogger::log_admin_change(user.name(), &model_id, "upload", &model_id);
                        history = Some(HistoryAction::for_model(&model_id, &summary, &model_id));
                    }
                    if report.is_clean() {
                        flashes.success(summary);
                    } else {
                        flashes.info(summary);
                    }
                    for error in report.errors {
                        flashes.error(error);
                    }
                }
                Err(e) => {
                    warn!(model = %model_id, "CSV upload rejected: {}", e.message);
                    flashes.error(e.message);
                }
            },
        }

        let response = table_response(&ctx, &user, details, &TableQuery::default(), &flashes).await?;
        Ok(with_history(response, history))
    }
}

/// Hash secrets and coerce form values into a typed row
fn prepare_row(ctx: &AdminContext, details: &TableDetails, params: Params) -> Result<Row, String> {
    let params =
        reverse_hash_names(details, params, ctx.config.hash_method).map_err(|e| e.message)?;
    correct_types(&params, details).map_err(|e| e.to_string())
}

fn parse_object_id(details: &TableDetails, raw: &str) -> Result<ObjectId, String> {
    let object_id = extract_obj_id_from_query(raw).map_err(|e| e.message)?;
    correct_id_types(details, object_id).map_err(|e| e.to_string())
}

/// Identity of the row to delete: the JSON `_id` the table view posts, or plain
/// identity columns sent by other clients
fn delete_target(details: &TableDetails, params: &Params) -> Result<ObjectId, String> {
    if let Some(raw) = params.get("_id") {
        return parse_object_id(details, raw);
    }
    details
        .identity
        .iter()
        .filter_map(|name| {
            let column = details.column(name)?;
            let raw = params.get(name).or_else(|| params.get(&column.db_name))?;
            Some(
                coerce_identity(raw, column)
                    .map(|value| (name.clone(), value))
                    .map_err(|e| e.to_string()),
            )
        })
        .collect::<Result<_, _>>()
        .map(ObjectId)
}

/// Re-key a row by display name so it can be merged into a decoded row
fn display_keys(details: &TableDetails, row: Row) -> Row {
    row.into_iter()
        .map(|(key, value)| {
            let key = details
                .column_by_any_name(&key)
                .map_or(key, |column| column.name.clone());
            (key, value)
        })
        .collect()
}

fn form_response(
    ctx: &AdminContext,
    user: &AdminUser,
    details: &TableDetails,
    mode: FormMode<'_>,
    values: Option<&Row>,
    flashes: &Flashes,
) -> Response {
    let title = match mode {
        FormMode::Add => format!("Add {}", details.model_id),
        FormMode::Edit(_) => format!("Edit {}", details.model_id),
    };
    let body = model_form(&ctx.config, details, mode, values);
    render_page(ctx, user, &title, flashes, &body)
}

async fn table_with_error(
    ctx: &AdminContext,
    user: &AdminUser,
    details: &TableDetails,
    message: String,
) -> Result<Response, AppError> {
    let mut flashes = Flashes::new();
    flashes.error(message);
    table_response(ctx, user, details, &TableQuery::default(), &flashes).await
}

async fn table_response(
    ctx: &AdminContext,
    user: &AdminUser,
    details: &TableDetails,
    query: &TableQuery,
    flashes: &Flashes,
) -> Result<Response, AppError> {
    let default_field = details
        .identity
        .first()
        .or_else(|| details.columns_names.first())
        .cloned()
        .unwrap_or_default();
    let filter = SearchFilter::new(
        query.field.clone().unwrap_or(default_field),
        query.search.clone().unwrap_or_default(),
    );

    let page_size = ctx.config.page_size;
    let total = ctx.database.count_rows(details, filter.as_ref()).await?;
    let requested = query
        .page
        .as_deref()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let mut page = TablePage {
        details,
        rows: &[],
        total,
        page: requested,
        page_size,
        search: filter.as_ref(),
    };
    page.page = requested.min(page.page_count());

    let offset = (page.page - 1).saturating_mul(page_size);
    let rows = ctx
        .database
        .select_rows(details, filter.as_ref(), page_size, offset)
        .await?;
    page.rows = &rows;

    let body = model_table(&ctx.config, &page);
    Ok(render_page(ctx, user, &details.model_id, flashes, &body))
}
