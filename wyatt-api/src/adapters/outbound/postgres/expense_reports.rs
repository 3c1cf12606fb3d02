//! PostgreSQL implementation of the ExpenseReportRepository port.
//!
//! Line aggregates are summed in the query on every read and never stored.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{
    models::{
        BudgetLine, BudgetLineId, BudgetLineSummary, ExpenseReport, ExpenseReportId,
        ExpenseReportStatus, NewBudgetLine, NewExpenseReport, ProjectId,
    },
    ports::outbound::ExpenseReportRepository,
    BillingError,
};

#[derive(Debug, sqlx::FromRow)]
struct ExpenseReportRow {
    id: i32,
    project_id: i32,
    name: String,
    status: ExpenseReportStatus,
}

impl From<ExpenseReportRow> for ExpenseReport {
    fn from(row: ExpenseReportRow) -> Self {
        Self {
            id: ExpenseReportId::new(row.id),
            project_id: ProjectId::new(row.project_id),
            name: row.name,
            status: row.status,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BudgetLineRow {
    id: i32,
    expense_report_id: i32,
    task_name: String,
    estimated_labor_cost: Decimal,
}

impl From<BudgetLineRow> for BudgetLine {
    fn from(row: BudgetLineRow) -> Self {
        Self {
            id: BudgetLineId::new(row.id),
            expense_report_id: ExpenseReportId::new(row.expense_report_id),
            task_name: row.task_name,
            estimated_labor_cost: row.estimated_labor_cost,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BudgetLineSummaryRow {
    #[sqlx(flatten)]
    line: BudgetLineRow,
    actual_hours: Decimal,
    billed_hours: Decimal,
    entry_count: i64,
}

#[derive(Clone)]
pub struct PostgresExpenseReportRepository {
    pool: PgPool,
}

impl PostgresExpenseReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseReportRepository for PostgresExpenseReportRepository {
    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseReport>, BillingError> {
        let rows = sqlx::query_as::<_, ExpenseReportRow>(
            r#"
            SELECT id, project_id, name, status
            FROM expense_reports
            WHERE project_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExpenseReport::from).collect())
    }

    async fn get_report(
        &self,
        id: ExpenseReportId,
    ) -> Result<Option<ExpenseReport>, BillingError> {
        let row = sqlx::query_as::<_, ExpenseReportRow>(
            "SELECT id, project_id, name, status FROM expense_reports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ExpenseReport::from))
    }

    async fn line_summaries(
        &self,
        id: ExpenseReportId,
    ) -> Result<Vec<BudgetLineSummary>, BillingError> {
        let rows = sqlx::query_as::<_, BudgetLineSummaryRow>(
            r#"
            SELECT
                l.id,
                l.expense_report_id,
                l.task_name,
                l.estimated_labor_cost,
                COALESCE(t.actual_hours, 0) AS actual_hours,
                COALESCE(t.entry_count, 0) AS entry_count,
                COALESCE(b.billed_hours, 0) AS billed_hours
            FROM expense_report_lines l
            LEFT JOIN (
                SELECT budget_line_id, SUM(hours) AS actual_hours, COUNT(*) AS entry_count
                FROM time_entries
                WHERE budget_line_id IS NOT NULL
                GROUP BY budget_line_id
            ) t ON t.budget_line_id = l.id
            LEFT JOIN (
                SELECT budget_line_id, SUM(billed_hours) AS billed_hours
                FROM invoice_lines
                GROUP BY budget_line_id
            ) b ON b.budget_line_id = l.id
            WHERE l.expense_report_id = $1
            ORDER BY l.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BudgetLineSummary {
                line: row.line.into(),
                actual_hours: row.actual_hours,
                billed_hours: row.billed_hours,
                entry_count: row.entry_count,
            })
            .collect())
    }

    async fn get_budget_line(
        &self,
        id: BudgetLineId,
    ) -> Result<Option<BudgetLine>, BillingError> {
        let row = sqlx::query_as::<_, BudgetLineRow>(
            r#"
            SELECT id, expense_report_id, task_name, estimated_labor_cost
            FROM expense_report_lines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BudgetLine::from))
    }

    async fn create_report(
        &self,
        report: &NewExpenseReport,
    ) -> Result<ExpenseReport, BillingError> {
        let row = sqlx::query_as::<_, ExpenseReportRow>(
            r#"
            INSERT INTO expense_reports (project_id, name)
            VALUES ($1, $2)
            RETURNING id, project_id, name, status
            "#,
        )
        .bind(report.project_id)
        .bind(&report.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn add_line(&self, line: &NewBudgetLine) -> Result<BudgetLine, BillingError> {
        let row = sqlx::query_as::<_, BudgetLineRow>(
            r#"
            INSERT INTO expense_report_lines (expense_report_id, task_name, estimated_labor_cost)
            VALUES ($1, $2, $3)
            RETURNING id, expense_report_id, task_name, estimated_labor_cost
            "#,
        )
        .bind(line.expense_report_id)
        .bind(&line.task_name)
        .bind(line.estimated_labor_cost)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
