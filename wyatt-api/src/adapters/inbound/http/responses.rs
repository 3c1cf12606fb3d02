//! HTTP response types for billing endpoints.
//!
//! These types serialize to the JSON format expected by the frontend.
//! Decimal amounts serialize as strings to keep cents exact.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{
    models::{
        BillingProposal, BudgetLine, BudgetLineSummary, Employee, ExpenseReport,
        ExpenseReportDetails, ExpenseReportStatus, Invoice, InvoiceLine, InvoiceStatus,
        InvoiceWithLines, ProposalLine, TimeEntry, TimeEntryStatus,
    },
    BillingError,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReportResponse {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub status: ExpenseReportStatus,
}

impl From<ExpenseReport> for ExpenseReportResponse {
    fn from(report: ExpenseReport) -> Self {
        Self {
            id: report.id.as_i32(),
            project_id: report.project_id.as_i32(),
            name: report.name,
            status: report.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineResponse {
    pub id: i32,
    pub expense_report_id: i32,
    pub task_name: String,
    pub estimated_labor_cost: Decimal,
    /// Only present when read through an expense report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billed_hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<i64>,
}

impl From<BudgetLine> for BudgetLineResponse {
    fn from(line: BudgetLine) -> Self {
        Self {
            id: line.id.as_i32(),
            expense_report_id: line.expense_report_id.as_i32(),
            task_name: line.task_name,
            estimated_labor_cost: line.estimated_labor_cost,
            actual_hours: None,
            billed_hours: None,
            entry_count: None,
        }
    }
}

impl From<BudgetLineSummary> for BudgetLineResponse {
    fn from(summary: BudgetLineSummary) -> Self {
        Self {
            actual_hours: Some(summary.actual_hours),
            billed_hours: Some(summary.billed_hours),
            entry_count: Some(summary.entry_count),
            ..summary.line.into()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReportDetailsResponse {
    pub report: ExpenseReportResponse,
    pub lines: Vec<BudgetLineResponse>,
}

impl From<ExpenseReportDetails> for ExpenseReportDetailsResponse {
    fn from(details: ExpenseReportDetails) -> Self {
        Self {
            report: details.report.into(),
            lines: details.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryResponse {
    pub id: i32,
    pub employee_id: i32,
    pub project_id: i32,
    /// Date in YYYY-MM-DD format.
    pub date: String,
    pub hours: Decimal,
    pub task_name: String,
    pub memo: String,
    pub image_url: Option<String>,
    pub status: TimeEntryStatus,
    pub budget_line_id: Option<i32>,
}

impl From<TimeEntry> for TimeEntryResponse {
    fn from(entry: TimeEntry) -> Self {
        Self {
            id: entry.id.as_i32(),
            employee_id: entry.employee_id.as_i32(),
            project_id: entry.project_id.as_i32(),
            date: entry.date.to_string(),
            hours: entry.hours,
            task_name: entry.task_name,
            memo: entry.memo,
            image_url: entry.image_url,
            status: entry.status,
            budget_line_id: entry.budget_line_id.map(|id| id.as_i32()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalLineResponse {
    pub budget_line_id: i32,
    pub description: String,
    pub actual_hours: Decimal,
    pub billed_hours: Decimal,
    pub unbilled_hours: Decimal,
    pub hours_to_bill: Decimal,
    pub amount_to_bill: Decimal,
    pub hourly_rate: Decimal,
}

impl From<ProposalLine> for ProposalLineResponse {
    fn from(line: ProposalLine) -> Self {
        Self {
            hourly_rate: line.hourly_rate(),
            budget_line_id: line.budget_line_id.as_i32(),
            description: line.description,
            actual_hours: line.actual_hours,
            billed_hours: line.billed_hours,
            unbilled_hours: line.unbilled_hours,
            hours_to_bill: line.hours_to_bill,
            amount_to_bill: line.amount_to_bill,
        }
    }
}

/// Default billing proposal for an expense report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingProposalResponse {
    pub project_id: i32,
    pub expense_report_id: i32,
    pub subtotal: Decimal,
    pub lines: Vec<ProposalLineResponse>,
}

impl TryFrom<BillingProposal> for BillingProposalResponse {
    type Error = BillingError;

    fn try_from(proposal: BillingProposal) -> Result<Self, Self::Error> {
        Ok(Self {
            subtotal: proposal.subtotal()?,
            project_id: proposal.project_id.as_i32(),
            expense_report_id: proposal.expense_report_id.as_i32(),
            lines: proposal.lines.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: i32,
    pub project_id: i32,
    pub expense_report_id: i32,
    pub customer_id: i32,
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id.as_i32(),
            project_id: invoice.project_id.as_i32(),
            expense_report_id: invoice.expense_report_id.as_i32(),
            customer_id: invoice.customer_id.as_i32(),
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date.to_string(),
            due_date: invoice.due_date.to_string(),
            subtotal: invoice.subtotal,
            tax_amount: invoice.tax_amount,
            total_amount: invoice.total_amount,
            status: invoice.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineResponse {
    pub id: i32,
    pub budget_line_id: i32,
    pub description: String,
    pub billed_hours: Decimal,
    pub billed_labor_amount: Decimal,
}

impl From<InvoiceLine> for InvoiceLineResponse {
    fn from(line: InvoiceLine) -> Self {
        Self {
            id: line.id,
            budget_line_id: line.budget_line_id.as_i32(),
            description: line.description,
            billed_hours: line.billed_hours,
            billed_labor_amount: line.billed_labor_amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWithLinesResponse {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub lines: Vec<InvoiceLineResponse>,
}

impl From<InvoiceWithLines> for InvoiceWithLinesResponse {
    fn from(invoice: InvoiceWithLines) -> Self {
        Self {
            invoice: invoice.invoice.into(),
            lines: invoice.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub access_level: i16,
    pub can_manage_billing: bool,
}

impl From<&Employee> for EmployeeResponse {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.as_i32(),
            email: employee.email.clone(),
            full_name: employee.full_name.clone(),
            access_level: employee.access_level.as_i16(),
            can_manage_billing: employee.access_level.can_manage_billing(),
        }
    }
}
