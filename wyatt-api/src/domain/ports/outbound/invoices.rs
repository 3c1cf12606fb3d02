//! Invoice persistence port (outbound).

use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{Invoice, InvoiceId, InvoiceStatus, InvoiceWithLines, NewInvoice, ProjectId},
    BillingError,
};

/// Outbound port for invoices.
#[async_trait]
pub trait InvoiceRepository: Send + Sync + 'static {
    /// Persist a header and all of its lines atomically.
    ///
    /// Implementations assign the invoice number and must leave no rows
    /// behind if any part fails.
    async fn create_with_lines(&self, invoice: &NewInvoice)
        -> Result<InvoiceWithLines, BillingError>;

    async fn get(&self, id: InvoiceId) -> Result<Option<InvoiceWithLines>, BillingError>;

    /// Invoices of a project, newest first.
    async fn list_for_project(&self, project_id: ProjectId)
        -> Result<Vec<Invoice>, BillingError>;

    /// Move an invoice from `from` to `to` only if it is still in `from`.
    ///
    /// Returns `InvoiceNotFound` when the invoice is missing and
    /// `InvalidStatusTransition` from its actual status when another writer
    /// moved it first.
    async fn update_status(
        &self,
        id: InvoiceId,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<(), BillingError>;

    /// Flip every `Sent` invoice due before `as_of` to `Overdue`.
    ///
    /// Returns the number of invoices changed.
    async fn mark_overdue(&self, as_of: Date) -> Result<u64, BillingError>;
}
