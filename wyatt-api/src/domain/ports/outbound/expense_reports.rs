//! Expense report and budget line port (outbound).

use async_trait::async_trait;

use crate::domain::{
    models::{
        BudgetLine, BudgetLineId, BudgetLineSummary, ExpenseReport, ExpenseReportId,
        NewBudgetLine, NewExpenseReport, ProjectId,
    },
    BillingError,
};

/// Outbound port for expense reports and their budget lines.
#[async_trait]
pub trait ExpenseReportRepository: Send + Sync + 'static {
    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseReport>, BillingError>;

    async fn get_report(&self, id: ExpenseReportId)
        -> Result<Option<ExpenseReport>, BillingError>;

    /// Every line of the report with `actual_hours`, `billed_hours` and
    /// `entry_count` computed from the current time entries and invoice lines.
    async fn line_summaries(
        &self,
        id: ExpenseReportId,
    ) -> Result<Vec<BudgetLineSummary>, BillingError>;

    async fn get_budget_line(&self, id: BudgetLineId)
        -> Result<Option<BudgetLine>, BillingError>;

    async fn create_report(&self, report: &NewExpenseReport)
        -> Result<ExpenseReport, BillingError>;

    async fn add_line(&self, line: &NewBudgetLine) -> Result<BudgetLine, BillingError>;
}
