use api_types::reference::{Category, PaymentMethod};
use axum::{Json, extract::State};
use engine::ExpenseService;

use crate::{ServerError, server::ServerState};

pub async fn categories(
    State(state): State<ServerState>,
) -> Result<Json<Vec<Category>>, ServerError> {
    Ok(Json(state.service.list_categories().await?))
}

pub async fn payment_methods(
    State(state): State<ServerState>,
) -> Result<Json<Vec<PaymentMethod>>, ServerError> {
    Ok(Json(state.service.list_payment_methods().await?))
}
