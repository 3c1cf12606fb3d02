use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::ApiError;
use crate::{
    adapters::inbound::http::InvoiceWithLinesResponse,
    app_state::AppState,
    auth::AuthEmployee,
    domain::models::{InvoiceId, InvoiceStatus},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_invoice))
        .route("/:id/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    status: InvoiceStatus,
}

#[instrument(name = "get_invoice", skip(app_state))]
async fn get_invoice(
    Path(id): Path<InvoiceId>,
    State(app_state): State<AppState>,
) -> Result<Json<InvoiceWithLinesResponse>, ApiError> {
    let invoice = app_state.billing_service.get_invoice(id).await?;

    Ok(Json(invoice.into()))
}

#[instrument(name = "update_invoice_status", skip(app_state))]
async fn update_status(
    employee: AuthEmployee,
    Path(id): Path<InvoiceId>,
    State(app_state): State<AppState>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<StatusCode, ApiError> {
    app_state
        .billing_service
        .update_invoice_status(&employee, id, body.status)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
