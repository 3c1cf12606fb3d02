use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::ApiError;
use crate::{
    adapters::inbound::http::{
        BillingProposalResponse, BudgetLineResponse, ExpenseReportDetailsResponse,
        InvoiceWithLinesResponse,
    },
    app_state::AppState,
    domain::models::{
        BudgetLineId, CustomerId, ExpenseReportId, GenerateInvoiceRequest, InvoiceItem,
        NewBudgetLine, ProjectId, ProposalEdit,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_expense_report))
        .route("/:id/lines", post(add_budget_line))
        .route("/:id/proposal", get(get_proposal).post(revise_proposal))
        .route("/:id/proposal/commit", post(commit_proposal))
        .route("/:id/invoices", post(generate_invoice))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBudgetLineBody {
    task_name: String,
    #[serde(default)]
    estimated_labor_cost: Decimal,
}

/// Operator overrides for proposal lines. Omitted lines keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEditsBody {
    #[serde(default)]
    edits: Vec<ProposalEditBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEditBody {
    budget_line_id: BudgetLineId,
    hours: Option<Decimal>,
    amount: Option<Decimal>,
}

impl From<ProposalEditBody> for ProposalEdit {
    fn from(body: ProposalEditBody) -> Self {
        Self {
            budget_line_id: body.budget_line_id,
            hours: body.hours,
            amount: body.amount,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitProposalBody {
    customer_id: CustomerId,
    jurisdiction: Option<String>,
    #[serde(default)]
    edits: Vec<ProposalEditBody>,
}

/// A committed billing proposal, possibly edited by the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInvoiceBody {
    project_id: ProjectId,
    customer_id: CustomerId,
    subtotal: Decimal,
    jurisdiction: Option<String>,
    items: Vec<InvoiceItemBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemBody {
    budget_line_id: BudgetLineId,
    description: String,
    billed_hours: Decimal,
    billed_labor_amount: Decimal,
}

impl From<InvoiceItemBody> for InvoiceItem {
    fn from(body: InvoiceItemBody) -> Self {
        Self {
            budget_line_id: body.budget_line_id,
            description: body.description,
            billed_hours: body.billed_hours,
            billed_labor_amount: body.billed_labor_amount,
        }
    }
}

#[instrument(name = "get_expense_report", skip(app_state))]
async fn get_expense_report(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
) -> Result<Json<ExpenseReportDetailsResponse>, ApiError> {
    let details = app_state.billing_service.get_expense_report(id).await?;

    Ok(Json(details.into()))
}

#[instrument(name = "add_budget_line", skip(app_state))]
async fn add_budget_line(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
    Json(body): Json<AddBudgetLineBody>,
) -> Result<(StatusCode, Json<BudgetLineResponse>), ApiError> {
    if body.task_name.trim().is_empty() {
        return Err(ApiError::bad_request("task name must not be empty"));
    }

    let line = app_state
        .billing_service
        .add_budget_line(NewBudgetLine {
            expense_report_id: id,
            task_name: body.task_name.trim().to_string(),
            estimated_labor_cost: body.estimated_labor_cost,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(line.into())))
}

#[instrument(name = "get_billing_proposal", skip(app_state))]
async fn get_proposal(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
) -> Result<Json<BillingProposalResponse>, ApiError> {
    let proposal = app_state.billing_service.propose_billing(id).await?;

    Ok(Json(proposal.try_into()?))
}

#[instrument(name = "revise_billing_proposal", skip(app_state, body))]
async fn revise_proposal(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
    Json(body): Json<ProposalEditsBody>,
) -> Result<Json<BillingProposalResponse>, ApiError> {
    let edits = body.edits.into_iter().map(Into::into).collect();
    let proposal = app_state.billing_service.revise_billing(id, edits).await?;

    Ok(Json(proposal.try_into()?))
}

#[instrument(name = "commit_billing_proposal", skip(app_state, body))]
async fn commit_proposal(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
    Json(body): Json<CommitProposalBody>,
) -> Result<(StatusCode, Json<InvoiceWithLinesResponse>), ApiError> {
    let edits = body.edits.into_iter().map(Into::into).collect();
    let invoice = app_state
        .billing_service
        .commit_billing(id, body.customer_id, body.jurisdiction, edits)
        .await?;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

#[instrument(name = "generate_invoice", skip(app_state, body))]
async fn generate_invoice(
    Path(id): Path<ExpenseReportId>,
    State(app_state): State<AppState>,
    Json(body): Json<GenerateInvoiceBody>,
) -> Result<(StatusCode, Json<InvoiceWithLinesResponse>), ApiError> {
    let request = GenerateInvoiceRequest {
        project_id: body.project_id,
        expense_report_id: id,
        customer_id: body.customer_id,
        items: body.items.into_iter().map(Into::into).collect(),
        subtotal: body.subtotal,
        jurisdiction: body.jurisdiction,
    };

    let invoice = app_state.billing_service.generate_invoice(request).await?;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}
