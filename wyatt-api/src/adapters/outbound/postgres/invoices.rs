//! PostgreSQL implementation of the InvoiceRepository port.

use std::collections::BTreeSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use crate::domain::{
    models::{
        format_invoice_number, BudgetLineId, CustomerId, ExpenseReportId, Invoice, InvoiceId,
        InvoiceItem, InvoiceLine, InvoiceStatus, InvoiceWithLines, NewInvoice, ProjectId,
    },
    ports::outbound::InvoiceRepository,
    BillingError,
};

const INVOICE_COLUMNS: &str = r#"
    id, project_id, expense_report_id, customer_id, invoice_number, issue_date, due_date,
    subtotal, tax_amount, total_amount, status
"#;

const INVOICE_LINE_COLUMNS: &str =
    "id, invoice_id, budget_line_id, description, billed_hours, billed_labor_amount";

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: i32,
    project_id: i32,
    expense_report_id: i32,
    customer_id: i32,
    invoice_number: String,
    issue_date: Date,
    due_date: Date,
    subtotal: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    status: InvoiceStatus,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            id: InvoiceId::new(row.id),
            project_id: ProjectId::new(row.project_id),
            expense_report_id: ExpenseReportId::new(row.expense_report_id),
            customer_id: CustomerId::new(row.customer_id),
            invoice_number: row.invoice_number,
            issue_date: row.issue_date,
            due_date: row.due_date,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            total_amount: row.total_amount,
            status: row.status,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceLineRow {
    id: i32,
    invoice_id: i32,
    budget_line_id: i32,
    description: String,
    billed_hours: Decimal,
    billed_labor_amount: Decimal,
}

impl From<InvoiceLineRow> for InvoiceLine {
    fn from(row: InvoiceLineRow) -> Self {
        Self {
            id: row.id,
            invoice_id: InvoiceId::new(row.invoice_id),
            budget_line_id: BudgetLineId::new(row.budget_line_id),
            description: row.description,
            billed_hours: row.billed_hours,
            billed_labor_amount: row.billed_labor_amount,
        }
    }
}

#[derive(Clone)]
pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock the budget lines being billed so concurrent generations for the
/// same lines run one after another.
async fn lock_budget_lines(
    tx: &mut Transaction<'_, Postgres>,
    report_id: ExpenseReportId,
    items: &[InvoiceItem],
) -> Result<(), BillingError> {
    let wanted: BTreeSet<i32> = items.iter().map(|i| i.budget_line_id.as_i32()).collect();
    let ids: Vec<i32> = wanted.iter().copied().collect();

    let locked: BTreeSet<i32> = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT id FROM expense_report_lines
        WHERE id = ANY($1) AND expense_report_id = $2
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(&ids)
    .bind(report_id)
    .fetch_all(&mut **tx)
    .await?
    .into_iter()
    .collect();

    match wanted.difference(&locked).next() {
        Some(missing) => Err(BillingError::BudgetLineNotFound(BudgetLineId::new(*missing))),
        None => Ok(()),
    }
}

/// Insert every line in one statement, returned in insertion order.
async fn insert_lines(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: InvoiceId,
    items: &[InvoiceItem],
) -> Result<Vec<InvoiceLine>, BillingError> {
    let budget_line_ids: Vec<i32> = items.iter().map(|i| i.budget_line_id.as_i32()).collect();
    let descriptions: Vec<&str> = items.iter().map(|i| i.description.as_str()).collect();
    let hours: Vec<Decimal> = items.iter().map(|i| i.billed_hours).collect();
    let amounts: Vec<Decimal> = items.iter().map(|i| i.billed_labor_amount).collect();

    let mut rows = sqlx::query_as::<_, InvoiceLineRow>(&format!(
        r#"
        INSERT INTO invoice_lines (
            invoice_id, budget_line_id, description, billed_hours, billed_labor_amount
        )
        SELECT $1, line.*
        FROM UNNEST($2::int4[], $3::text[], $4::numeric[], $5::numeric[]) AS line
        RETURNING {INVOICE_LINE_COLUMNS}
        "#
    ))
    .bind(invoice_id)
    .bind(&budget_line_ids)
    .bind(&descriptions)
    .bind(&hours)
    .bind(&amounts)
    .fetch_all(&mut **tx)
    .await?;

    rows.sort_by_key(|row| row.id);
    Ok(rows.into_iter().map(InvoiceLine::from).collect())
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn create_with_lines(
        &self,
        new_invoice: &NewInvoice,
    ) -> Result<InvoiceWithLines, BillingError> {
        // Dropping the transaction without commit rolls everything back.
        let mut tx = self.pool.begin().await?;

        lock_budget_lines(&mut tx, new_invoice.expense_report_id, &new_invoice.items).await?;

        let sequence: i64 = sqlx::query_scalar("SELECT nextval('invoice_number_seq')")
            .fetch_one(&mut *tx)
            .await?;

        let invoice: Invoice = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices (
                project_id, expense_report_id, customer_id, invoice_number,
                issue_date, due_date, subtotal, tax_amount, total_amount, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Draft')
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(new_invoice.project_id)
        .bind(new_invoice.expense_report_id)
        .bind(new_invoice.customer_id)
        .bind(format_invoice_number(sequence))
        .bind(new_invoice.issue_date)
        .bind(new_invoice.due_date)
        .bind(new_invoice.totals.subtotal)
        .bind(new_invoice.totals.tax_amount)
        .bind(new_invoice.totals.total_amount)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let lines = insert_lines(&mut tx, invoice.id, &new_invoice.items).await?;

        tx.commit().await?;

        Ok(InvoiceWithLines { invoice, lines })
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<InvoiceWithLines>, BillingError> {
        let Some(row) = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, InvoiceLineRow>(&format!(
            "SELECT {INVOICE_LINE_COLUMNS} FROM invoice_lines WHERE invoice_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(InvoiceWithLines {
            invoice: row.into(),
            lines: lines.into_iter().map(InvoiceLine::from).collect(),
        }))
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Invoice>, BillingError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE project_id = $1 ORDER BY id DESC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn update_status(
        &self,
        id: InvoiceId,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<(), BillingError> {
        let result = sqlx::query("UPDATE invoices SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to)
            .bind(id)
            .bind(from)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            let current: Option<InvoiceStatus> =
                sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            return Err(match current {
                Some(current) => BillingError::InvalidStatusTransition { from: current, to },
                None => BillingError::InvoiceNotFound(id),
            });
        }

        Ok(())
    }

    async fn mark_overdue(&self, as_of: Date) -> Result<u64, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'Overdue'
            WHERE status = 'Sent' AND due_date < $1
            "#,
        )
        .bind(as_of)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
