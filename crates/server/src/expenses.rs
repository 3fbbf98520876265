//! Expense API endpoints

use api_types::expense::{
    BulkDelete, BulkUpdate, Expense, ExpenseListQuery, ExpenseNew, ExpenseUpdate,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseFilter, ExpenseService};

use crate::{ServerError, server::ServerState};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let filter = ExpenseFilter::from_query(&query)?;
    let expenses = state.service.list(&filter).await?;
    Ok(Json(expenses))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, ServerError> {
    Ok(Json(state.service.get(id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<Expense>), ServerError> {
    let expense = state.service.create(&payload).await?;
    tracing::info!(id = expense.id, "expense created");
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, ServerError> {
    if payload.changes.is_empty() {
        return Err(ServerError::Generic("no changes given".to_string()));
    }
    let expense = state
        .service
        .update(id, &payload.changes, payload.expected_modified_at)
        .await?;
    Ok(Json(expense))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.service.delete(id).await?;
    tracing::info!(id, "expense deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_update(
    State(state): State<ServerState>,
    Json(payload): Json<BulkUpdate>,
) -> Result<StatusCode, ServerError> {
    if payload.ids.is_empty() || payload.changes.is_empty() {
        return Err(ServerError::Generic("ids and changes are required".to_string()));
    }
    state
        .service
        .bulk_update(&payload.ids, &payload.changes)
        .await?;
    tracing::info!(count = payload.ids.len(), "bulk update");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete(
    State(state): State<ServerState>,
    Json(payload): Json<BulkDelete>,
) -> Result<StatusCode, ServerError> {
    if payload.ids.is_empty() {
        return Err(ServerError::Generic("ids are required".to_string()));
    }
    state.service.bulk_delete(&payload.ids).await?;
    tracing::info!(count = payload.ids.len(), "bulk delete");
    Ok(StatusCode::NO_CONTENT)
}
