use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{BudgetLineId, CustomerId, ExpenseReportId, InvoiceId, ProjectId};
use crate::domain::BillingError;

/// Lifecycle of an invoice.
///
/// Draft → Sent → Paid, with Sent → Overdue once the due date has passed and
/// Overdue → Paid when a late payment arrives.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "invoice_status")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Sent, Paid) | (Sent, Overdue) | (Overdue, Paid)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub project_id: ProjectId,
    pub expense_report_id: ExpenseReportId,
    pub customer_id: CustomerId,
    pub invoice_number: String,
    pub issue_date: Date,
    pub due_date: Date,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
}

/// One billed budget line on an invoice. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub id: i32,
    pub invoice_id: InvoiceId,
    pub budget_line_id: BudgetLineId,
    pub description: String,
    pub billed_hours: Decimal,
    pub billed_labor_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct InvoiceWithLines {
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

/// A line the operator chose to bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceItem {
    pub budget_line_id: BudgetLineId,
    pub description: String,
    pub billed_hours: Decimal,
    pub billed_labor_amount: Decimal,
}

impl InvoiceItem {
    pub fn is_billable(&self) -> bool {
        self.billed_labor_amount > Decimal::ZERO
    }
}

/// Input to invoice generation.
///
/// `subtotal` is taken as given and stored on the header verbatim; it is not
/// recomputed from `items`.
#[derive(Debug, Clone)]
pub struct GenerateInvoiceRequest {
    pub project_id: ProjectId,
    pub expense_report_id: ExpenseReportId,
    pub customer_id: CustomerId,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub jurisdiction: Option<String>,
}

/// Tax and total derived from a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    /// Tax is rounded to cents, half away from zero.
    ///
    /// Fails with `AmountOutOfRange` instead of overflowing.
    pub fn compute(subtotal: Decimal, tax_rate: Decimal) -> Result<Self, BillingError> {
        let out_of_range = || BillingError::AmountOutOfRange(subtotal.to_string());
        let tax_amount = subtotal
            .checked_mul(tax_rate)
            .ok_or_else(out_of_range)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let total_amount = subtotal.checked_add(tax_amount).ok_or_else(out_of_range)?;

        Ok(Self {
            subtotal,
            tax_amount,
            total_amount,
        })
    }
}

/// Invoice header ready to be persisted. The number is assigned by the
/// store inside the creating transaction.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub project_id: ProjectId,
    pub expense_report_id: ExpenseReportId,
    pub customer_id: CustomerId,
    pub issue_date: Date,
    pub due_date: Date,
    pub totals: InvoiceTotals,
    pub items: Vec<InvoiceItem>,
}

/// Formats a value drawn from the invoice number sequence.
pub fn format_invoice_number(sequence: i64) -> String {
    format!("INV-{:06}", sequence)
}
