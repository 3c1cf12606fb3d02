use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use crate::domain::{
    models::{
        BillingProposal, BillingRates, BudgetLine, BudgetLineId, CustomerId, Employee,
        ExpenseReport, ExpenseReportDetails, ExpenseReportId, GenerateInvoiceRequest, Invoice,
        InvoiceId, InvoiceItem, InvoiceStatus, InvoiceTotals, InvoiceWithLines, NewBudgetLine,
        NewExpenseReport, NewInvoice, NewTimeEntry, ProjectId, ProposalEdit, TimeEntry,
        TimeEntryId, TimeEntryStatus,
    },
    ports::{
        inbound::BillingService,
        outbound::{ExpenseReportRepository, InvoiceRepository, TimeEntryRepository},
    },
    BillingError,
};

/// Implementation of the BillingService inbound port.
///
/// Aggregates are always read fresh from the repositories; nothing derived
/// is cached here.
pub struct BillingServiceImpl<T, R, I> {
    time_entries: Arc<T>,
    reports: Arc<R>,
    invoices: Arc<I>,
    rates: BillingRates,
}

impl<T, R, I> BillingServiceImpl<T, R, I> {
    pub fn new(
        time_entries: Arc<T>,
        reports: Arc<R>,
        invoices: Arc<I>,
        rates: BillingRates,
    ) -> Self {
        Self {
            time_entries,
            reports,
            invoices,
            rates,
        }
    }

    fn ensure_manager(actor: &Employee) -> Result<(), BillingError> {
        if actor.access_level.can_manage_billing() {
            Ok(())
        } else {
            tracing::warn!(
                employee_id = %actor.id,
                access_level = %actor.access_level,
                "rejected billing action"
            );
            Err(BillingError::Forbidden(actor.access_level))
        }
    }
}

impl<T, R: ExpenseReportRepository, I> BillingServiceImpl<T, R, I> {
    async fn load_report(&self, id: ExpenseReportId) -> Result<ExpenseReportDetails, BillingError> {
        let report = self
            .reports
            .get_report(id)
            .await?
            .ok_or(BillingError::ExpenseReportNotFound(id))?;
        let lines = self.reports.line_summaries(id).await?;

        Ok(ExpenseReportDetails { report, lines })
    }
}

#[async_trait]
impl<T, R, I> BillingService for BillingServiceImpl<T, R, I>
where
    T: TimeEntryRepository,
    R: ExpenseReportRepository,
    I: InvoiceRepository,
{
    async fn get_expense_report(
        &self,
        id: ExpenseReportId,
    ) -> Result<ExpenseReportDetails, BillingError> {
        self.load_report(id).await
    }

    async fn list_expense_reports(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseReport>, BillingError> {
        self.reports.list_for_project(project_id).await
    }

    async fn create_expense_report(
        &self,
        report: NewExpenseReport,
    ) -> Result<ExpenseReport, BillingError> {
        self.reports.create_report(&report).await
    }

    async fn add_budget_line(&self, line: NewBudgetLine) -> Result<BudgetLine, BillingError> {
        if self.reports.get_report(line.expense_report_id).await?.is_none() {
            return Err(BillingError::ExpenseReportNotFound(line.expense_report_id));
        }

        self.reports.add_line(&line).await
    }

    async fn get_pending_time_entries(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TimeEntry>, BillingError> {
        self.time_entries.pending_unassigned(project_id).await
    }

    async fn submit_time_entry(&self, entry: NewTimeEntry) -> Result<TimeEntry, BillingError> {
        if entry.hours <= Decimal::ZERO {
            return Err(BillingError::InvalidHours(entry.hours.to_string()));
        }

        self.time_entries.create(&entry).await
    }

    async fn assign_time_entry(
        &self,
        id: TimeEntryId,
        budget_line_id: BudgetLineId,
    ) -> Result<(), BillingError> {
        let entry = self
            .time_entries
            .get(id)
            .await?
            .ok_or(BillingError::TimeEntryNotFound(id))?;
        let line = self
            .reports
            .get_budget_line(budget_line_id)
            .await?
            .ok_or(BillingError::BudgetLineNotFound(budget_line_id))?;
        let report = self
            .reports
            .get_report(line.expense_report_id)
            .await?
            .ok_or(BillingError::ExpenseReportNotFound(line.expense_report_id))?;
        if report.project_id != entry.project_id {
            tracing::warn!(
                time_entry_id = %id,
                %budget_line_id,
                entry_project = %entry.project_id,
                line_project = %report.project_id,
                "rejected cross-project assignment"
            );
            return Err(BillingError::ProjectMismatch {
                time_entry: id,
                budget_line: budget_line_id,
            });
        }

        self.time_entries
            .assign_to_budget_line(id, budget_line_id)
            .await?;

        tracing::debug!(time_entry_id = %id, %budget_line_id, "assigned time entry");
        Ok(())
    }

    async fn set_time_entry_approval(
        &self,
        actor: &Employee,
        id: TimeEntryId,
        approved: bool,
    ) -> Result<(), BillingError> {
        Self::ensure_manager(actor)?;

        let status = if approved {
            TimeEntryStatus::Approved
        } else {
            TimeEntryStatus::Pending
        };
        self.time_entries.set_status(id, status).await
    }

    async fn propose_billing(
        &self,
        id: ExpenseReportId,
    ) -> Result<BillingProposal, BillingError> {
        let details = self.load_report(id).await?;
        BillingProposal::from_report(&details, self.rates.default_hourly_rate)
    }

    async fn revise_billing(
        &self,
        id: ExpenseReportId,
        edits: Vec<ProposalEdit>,
    ) -> Result<BillingProposal, BillingError> {
        let mut proposal = self.propose_billing(id).await?;
        proposal.apply(&edits)?;
        Ok(proposal)
    }

    async fn commit_billing(
        &self,
        id: ExpenseReportId,
        customer_id: CustomerId,
        jurisdiction: Option<String>,
        edits: Vec<ProposalEdit>,
    ) -> Result<InvoiceWithLines, BillingError> {
        let proposal = self.revise_billing(id, edits).await?;
        self.generate_invoice(proposal.into_request(customer_id, jurisdiction)?)
            .await
    }

    async fn generate_invoice(
        &self,
        request: GenerateInvoiceRequest,
    ) -> Result<InvoiceWithLines, BillingError> {
        let items: Vec<InvoiceItem> = request
            .items
            .into_iter()
            .filter(InvoiceItem::is_billable)
            .collect();
        if items.is_empty() {
            return Err(BillingError::NoBillableItems);
        }

        let tax_rate = self.rates.tax_rate(request.jurisdiction.as_deref())?;

        let details = self.load_report(request.expense_report_id).await?;
        if details.report.project_id != request.project_id {
            return Err(BillingError::ExpenseReportNotFound(request.expense_report_id));
        }
        if let Some(stray) = items
            .iter()
            .find(|item| details.line(item.budget_line_id).is_none())
        {
            return Err(BillingError::BudgetLineNotFound(stray.budget_line_id));
        }

        let issue_date = OffsetDateTime::now_utc().date();
        let new_invoice = NewInvoice {
            project_id: request.project_id,
            expense_report_id: request.expense_report_id,
            customer_id: request.customer_id,
            issue_date,
            due_date: issue_date + Duration::days(self.rates.payment_terms_days),
            totals: InvoiceTotals::compute(request.subtotal, tax_rate)?,
            items,
        };

        let created = self.invoices.create_with_lines(&new_invoice).await?;

        tracing::info!(
            invoice_number = %created.invoice.invoice_number,
            subtotal = %created.invoice.subtotal,
            total = %created.invoice.total_amount,
            lines = created.lines.len(),
            "generated draft invoice"
        );
        Ok(created)
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceWithLines, BillingError> {
        self.invoices
            .get(id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(id))
    }

    async fn list_invoices(&self, project_id: ProjectId) -> Result<Vec<Invoice>, BillingError> {
        self.invoices.list_for_project(project_id).await
    }

    async fn update_invoice_status(
        &self,
        actor: &Employee,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<(), BillingError> {
        Self::ensure_manager(actor)?;

        let current = self.get_invoice(id).await?.invoice.status;
        if current == status {
            return Ok(());
        }
        if !current.can_transition_to(status) {
            return Err(BillingError::InvalidStatusTransition {
                from: current,
                to: status,
            });
        }

        // Conditional on `current`, so a concurrent change is not overwritten.
        self.invoices.update_status(id, current, status).await?;

        tracing::info!(
            invoice_id = %id,
            employee_id = %actor.id,
            from = %current,
            to = %status,
            "invoice status changed"
        );
        Ok(())
    }

    async fn mark_overdue_invoices(&self, as_of: Date) -> Result<u64, BillingError> {
        let count = self.invoices.mark_overdue(as_of).await?;
        if count > 0 {
            tracing::info!(count, %as_of, "marked invoices overdue");
        }
        Ok(count)
    }
}
