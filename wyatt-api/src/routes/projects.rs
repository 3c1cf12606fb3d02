use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::ApiError;
use crate::{
    adapters::inbound::http::{ExpenseReportResponse, InvoiceResponse, TimeEntryResponse},
    app_state::AppState,
    domain::models::{NewExpenseReport, ProjectId},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:project_id/expense-reports",
            get(list_expense_reports).post(create_expense_report),
        )
        .route(
            "/:project_id/pending-time-entries",
            get(list_pending_time_entries),
        )
        .route("/:project_id/invoices", get(list_invoices))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseReportBody {
    name: String,
}

#[instrument(name = "list_expense_reports", skip(app_state))]
async fn list_expense_reports(
    Path(project_id): Path<ProjectId>,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ExpenseReportResponse>>, ApiError> {
    let reports = app_state
        .billing_service
        .list_expense_reports(project_id)
        .await?;

    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

#[instrument(name = "create_expense_report", skip(app_state))]
async fn create_expense_report(
    Path(project_id): Path<ProjectId>,
    State(app_state): State<AppState>,
    Json(body): Json<CreateExpenseReportBody>,
) -> Result<(StatusCode, Json<ExpenseReportResponse>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("expense report name must not be empty"));
    }

    let report = app_state
        .billing_service
        .create_expense_report(NewExpenseReport {
            project_id,
            name: name.to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(report.into())))
}

#[instrument(name = "list_pending_time_entries", skip(app_state))]
async fn list_pending_time_entries(
    Path(project_id): Path<ProjectId>,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<TimeEntryResponse>>, ApiError> {
    let entries = app_state
        .billing_service
        .get_pending_time_entries(project_id)
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[instrument(name = "list_invoices", skip(app_state))]
async fn list_invoices(
    Path(project_id): Path<ProjectId>,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let invoices = app_state.billing_service.list_invoices(project_id).await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}
