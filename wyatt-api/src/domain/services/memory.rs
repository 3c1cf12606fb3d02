//! In-memory repositories for service tests.

use std::sync::{
    atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering},
    Arc, RwLock,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::Date;

use crate::domain::{
    models::{
        format_invoice_number, BudgetLine, BudgetLineId, BudgetLineSummary, ExpenseReport,
        ExpenseReportId, ExpenseReportStatus, Invoice, InvoiceId, InvoiceLine, InvoiceStatus,
        InvoiceWithLines, NewBudgetLine, NewExpenseReport, NewInvoice, NewTimeEntry, ProjectId,
        TimeEntry, TimeEntryId, TimeEntryStatus,
    },
    ports::outbound::{ExpenseReportRepository, InvoiceRepository, TimeEntryRepository},
    BillingError,
};

#[derive(Default)]
struct Tables {
    time_entries: Vec<TimeEntry>,
    reports: Vec<ExpenseReport>,
    budget_lines: Vec<BudgetLine>,
    invoices: Vec<Invoice>,
    invoice_lines: Vec<InvoiceLine>,
}

/// Shared in-memory store implementing every billing repository port.
///
/// Clones share the same tables, so one store can be handed to the service
/// three times and inspected afterwards.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    next_id: Arc<AtomicI32>,
    invoice_sequence: Arc<AtomicI64>,
    fail_line_inserts: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make the next invoice line insert fail, as a constraint violation would.
    pub fn fail_line_inserts(&self, fail: bool) {
        self.fail_line_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn seed_report(&self, project_id: ProjectId, name: &str) -> ExpenseReportId {
        let id = ExpenseReportId::new(self.allocate_id());
        self.tables.write().unwrap().reports.push(ExpenseReport {
            id,
            project_id,
            name: name.to_string(),
            status: ExpenseReportStatus::Approved,
        });
        id
    }

    pub fn seed_line(&self, report_id: ExpenseReportId, task_name: &str) -> BudgetLineId {
        let id = BudgetLineId::new(self.allocate_id());
        self.tables.write().unwrap().budget_lines.push(BudgetLine {
            id,
            expense_report_id: report_id,
            task_name: task_name.to_string(),
            estimated_labor_cost: Decimal::new(10_000, 0),
        });
        id
    }

    pub fn seed_entry(&self, mut entry: TimeEntry) -> TimeEntryId {
        entry.id = TimeEntryId::new(self.allocate_id());
        let id = entry.id;
        self.tables.write().unwrap().time_entries.push(entry);
        id
    }

    pub fn seed_invoice_line(&self, budget_line_id: BudgetLineId, hours: Decimal) {
        let id = self.allocate_id();
        self.tables.write().unwrap().invoice_lines.push(InvoiceLine {
            id,
            invoice_id: InvoiceId::new(0),
            budget_line_id,
            description: "earlier invoice".to_string(),
            billed_hours: hours,
            billed_labor_amount: Decimal::ZERO,
        });
    }

    pub fn time_entry(&self, id: TimeEntryId) -> Option<TimeEntry> {
        let tables = self.tables.read().unwrap();
        tables.time_entries.iter().find(|e| e.id == id).cloned()
    }

    pub fn invoice_count(&self) -> usize {
        self.tables.read().unwrap().invoices.len()
    }

    pub fn invoice_line_count(&self) -> usize {
        self.tables.read().unwrap().invoice_lines.len()
    }

    pub fn set_invoice_status(&self, id: InvoiceId, status: InvoiceStatus) {
        let mut tables = self.tables.write().unwrap();
        if let Some(invoice) = tables.invoices.iter_mut().find(|i| i.id == id) {
            invoice.status = status;
        }
    }

    pub fn set_invoice_due_date(&self, id: InvoiceId, due_date: Date) {
        let mut tables = self.tables.write().unwrap();
        if let Some(invoice) = tables.invoices.iter_mut().find(|i| i.id == id) {
            invoice.due_date = due_date;
        }
    }
}

#[async_trait]
impl TimeEntryRepository for MemoryStore {
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, BillingError> {
        let created = TimeEntry {
            id: TimeEntryId::new(self.allocate_id()),
            employee_id: entry.employee_id,
            project_id: entry.project_id,
            date: entry.date,
            hours: entry.hours,
            task_name: entry.task_name.clone(),
            memo: entry.memo.clone(),
            image_url: entry.image_url.clone(),
            status: TimeEntryStatus::Pending,
            budget_line_id: None,
        };
        self.tables
            .write()
            .unwrap()
            .time_entries
            .push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, BillingError> {
        Ok(self.time_entry(id))
    }

    async fn pending_unassigned(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TimeEntry>, BillingError> {
        let tables = self.tables.read().unwrap();
        let mut entries: Vec<TimeEntry> = tables
            .time_entries
            .iter()
            .filter(|e| {
                e.project_id == project_id
                    && e.status == TimeEntryStatus::Pending
                    && e.budget_line_id.is_none()
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.date, e.id));
        Ok(entries)
    }

    async fn assign_to_budget_line(
        &self,
        id: TimeEntryId,
        budget_line_id: BudgetLineId,
    ) -> Result<(), BillingError> {
        let mut tables = self.tables.write().unwrap();
        let entry = tables
            .time_entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(BillingError::TimeEntryNotFound(id))?;
        entry.budget_line_id = Some(budget_line_id);
        entry.status = TimeEntryStatus::Approved;
        Ok(())
    }

    async fn set_status(
        &self,
        id: TimeEntryId,
        status: TimeEntryStatus,
    ) -> Result<(), BillingError> {
        let mut tables = self.tables.write().unwrap();
        let entry = tables
            .time_entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(BillingError::TimeEntryNotFound(id))?;
        entry.status = status;
        Ok(())
    }
}

#[async_trait]
impl ExpenseReportRepository for MemoryStore {
    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseReport>, BillingError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .reports
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_report(
        &self,
        id: ExpenseReportId,
    ) -> Result<Option<ExpenseReport>, BillingError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn line_summaries(
        &self,
        id: ExpenseReportId,
    ) -> Result<Vec<BudgetLineSummary>, BillingError> {
        let tables = self.tables.read().unwrap();
        let summaries = tables
            .budget_lines
            .iter()
            .filter(|line| line.expense_report_id == id)
            .map(|line| {
                let linked = tables
                    .time_entries
                    .iter()
                    .filter(|e| e.budget_line_id == Some(line.id));
                BudgetLineSummary {
                    line: line.clone(),
                    actual_hours: linked.clone().map(|e| e.hours).sum(),
                    entry_count: linked.count() as i64,
                    billed_hours: tables
                        .invoice_lines
                        .iter()
                        .filter(|l| l.budget_line_id == line.id)
                        .map(|l| l.billed_hours)
                        .sum(),
                }
            })
            .collect();
        Ok(summaries)
    }

    async fn get_budget_line(
        &self,
        id: BudgetLineId,
    ) -> Result<Option<BudgetLine>, BillingError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.budget_lines.iter().find(|l| l.id == id).cloned())
    }

    async fn create_report(
        &self,
        report: &NewExpenseReport,
    ) -> Result<ExpenseReport, BillingError> {
        let id = self.seed_report(report.project_id, &report.name);
        let mut tables = self.tables.write().unwrap();
        let created = tables
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BillingError::ExpenseReportNotFound(id))?;
        created.status = ExpenseReportStatus::Draft;
        Ok(created.clone())
    }

    async fn add_line(&self, line: &NewBudgetLine) -> Result<BudgetLine, BillingError> {
        let created = BudgetLine {
            id: BudgetLineId::new(self.allocate_id()),
            expense_report_id: line.expense_report_id,
            task_name: line.task_name.clone(),
            estimated_labor_cost: line.estimated_labor_cost,
        };
        self.tables
            .write()
            .unwrap()
            .budget_lines
            .push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn create_with_lines(
        &self,
        new_invoice: &NewInvoice,
    ) -> Result<InvoiceWithLines, BillingError> {
        // Stage everything first and publish only when all rows succeed.
        let sequence = self.invoice_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let invoice = Invoice {
            id: InvoiceId::new(self.allocate_id()),
            project_id: new_invoice.project_id,
            expense_report_id: new_invoice.expense_report_id,
            customer_id: new_invoice.customer_id,
            invoice_number: format_invoice_number(sequence),
            issue_date: new_invoice.issue_date,
            due_date: new_invoice.due_date,
            subtotal: new_invoice.totals.subtotal,
            tax_amount: new_invoice.totals.tax_amount,
            total_amount: new_invoice.totals.total_amount,
            status: InvoiceStatus::Draft,
        };

        let mut lines = Vec::with_capacity(new_invoice.items.len());
        for item in &new_invoice.items {
            if self.fail_line_inserts.load(Ordering::SeqCst) {
                return Err(BillingError::storage("invoice line insert failed"));
            }
            lines.push(InvoiceLine {
                id: self.allocate_id(),
                invoice_id: invoice.id,
                budget_line_id: item.budget_line_id,
                description: item.description.clone(),
                billed_hours: item.billed_hours,
                billed_labor_amount: item.billed_labor_amount,
            });
        }

        let mut tables = self.tables.write().unwrap();
        tables.invoices.push(invoice.clone());
        tables.invoice_lines.extend(lines.iter().cloned());

        Ok(InvoiceWithLines { invoice, lines })
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<InvoiceWithLines>, BillingError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .invoices
            .iter()
            .find(|i| i.id == id)
            .map(|invoice| InvoiceWithLines {
                invoice: invoice.clone(),
                lines: tables
                    .invoice_lines
                    .iter()
                    .filter(|l| l.invoice_id == id)
                    .cloned()
                    .collect(),
            }))
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Invoice>, BillingError> {
        let tables = self.tables.read().unwrap();
        let mut invoices: Vec<Invoice> = tables
            .invoices
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(invoices)
    }

    async fn update_status(
        &self,
        id: InvoiceId,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<(), BillingError> {
        let mut tables = self.tables.write().unwrap();
        let invoice = tables
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BillingError::InvoiceNotFound(id))?;
        if invoice.status != from {
            return Err(BillingError::InvalidStatusTransition {
                from: invoice.status,
                to,
            });
        }
        invoice.status = to;
        Ok(())
    }

    async fn mark_overdue(&self, as_of: Date) -> Result<u64, BillingError> {
        let mut tables = self.tables.write().unwrap();
        let mut count = 0;
        for invoice in tables
            .invoices
            .iter_mut()
            .filter(|i| i.status == InvoiceStatus::Sent && i.due_date < as_of)
        {
            invoice.status = InvoiceStatus::Overdue;
            count += 1;
        }
        Ok(count)
    }
}
