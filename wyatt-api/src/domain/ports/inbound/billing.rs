use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{
        BillingProposal, BudgetLine, BudgetLineId, CustomerId, Employee, ExpenseReport,
        ExpenseReportDetails, ExpenseReportId, GenerateInvoiceRequest, Invoice, InvoiceId,
        InvoiceStatus, InvoiceWithLines, NewBudgetLine, NewExpenseReport, NewTimeEntry,
        ProjectId, ProposalEdit, TimeEntry, TimeEntryId,
    },
    BillingError,
};

/// Inbound port for the progress billing workflow.
///
/// Time entries flow into budget lines, budget lines are aggregated into a
/// proposal, and a committed proposal becomes a draft invoice.
#[async_trait]
pub trait BillingService: Send + Sync + 'static {
    // ========================================================================
    // Expense reports
    // ========================================================================

    /// Report header plus every budget line with derived hour totals.
    async fn get_expense_report(
        &self,
        id: ExpenseReportId,
    ) -> Result<ExpenseReportDetails, BillingError>;

    async fn list_expense_reports(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseReport>, BillingError>;

    async fn create_expense_report(
        &self,
        report: NewExpenseReport,
    ) -> Result<ExpenseReport, BillingError>;

    async fn add_budget_line(&self, line: NewBudgetLine) -> Result<BudgetLine, BillingError>;

    // ========================================================================
    // Time entries
    // ========================================================================

    /// Pending entries not yet linked to a budget line, oldest first.
    async fn get_pending_time_entries(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TimeEntry>, BillingError>;

    async fn submit_time_entry(&self, entry: NewTimeEntry) -> Result<TimeEntry, BillingError>;

    /// Link an entry to a budget line and approve it.
    async fn assign_time_entry(
        &self,
        id: TimeEntryId,
        budget_line_id: BudgetLineId,
    ) -> Result<(), BillingError>;

    /// Admin approval toggle.
    async fn set_time_entry_approval(
        &self,
        actor: &Employee,
        id: TimeEntryId,
        approved: bool,
    ) -> Result<(), BillingError>;

    // ========================================================================
    // Billing
    // ========================================================================

    /// Default proposal: bill every unbilled hour at the configured rate.
    async fn propose_billing(&self, id: ExpenseReportId)
        -> Result<BillingProposal, BillingError>;

    /// Default proposal with operator overrides applied. Nothing is written.
    async fn revise_billing(
        &self,
        id: ExpenseReportId,
        edits: Vec<ProposalEdit>,
    ) -> Result<BillingProposal, BillingError>;

    /// Apply the overrides to a fresh proposal and generate its invoice.
    async fn commit_billing(
        &self,
        id: ExpenseReportId,
        customer_id: CustomerId,
        jurisdiction: Option<String>,
        edits: Vec<ProposalEdit>,
    ) -> Result<InvoiceWithLines, BillingError>;

    /// Create a draft invoice with one line per billable item, atomically.
    async fn generate_invoice(
        &self,
        request: GenerateInvoiceRequest,
    ) -> Result<InvoiceWithLines, BillingError>;

    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceWithLines, BillingError>;

    async fn list_invoices(&self, project_id: ProjectId) -> Result<Vec<Invoice>, BillingError>;

    /// Move an invoice forward in its lifecycle. Requires a manager-level actor.
    async fn update_invoice_status(
        &self,
        actor: &Employee,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<(), BillingError>;

    /// Mark sent invoices past their due date as overdue.
    async fn mark_overdue_invoices(&self, as_of: Date) -> Result<u64, BillingError>;
}
