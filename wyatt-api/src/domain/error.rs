use thiserror::Error;

use super::models::{
    AccessLevel, BudgetLineId, ExpenseReportId, InvoiceId, InvoiceStatus, TimeEntryId,
};

/// Errors that can occur during billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("no billable items: every item has a zero amount")]
    NoBillableItems,
    #[error("hours must be positive, got {0}")]
    InvalidHours(String),
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),
    #[error("time entry {time_entry} belongs to another project than budget line {budget_line}")]
    ProjectMismatch {
        time_entry: TimeEntryId,
        budget_line: BudgetLineId,
    },
    #[error("no tax rate configured for jurisdiction '{0}'")]
    UnknownJurisdiction(String),
    #[error("expense report {0} not found")]
    ExpenseReportNotFound(ExpenseReportId),
    #[error("budget line {0} not found")]
    BudgetLineNotFound(BudgetLineId),
    #[error("time entry {0} not found")]
    TimeEntryNotFound(TimeEntryId),
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),
    #[error("access level {0} may not perform this action")]
    Forbidden(AccessLevel),
    #[error("invoice cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

impl BillingError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", e);
        BillingError::storage(e.to_string())
    }
}
