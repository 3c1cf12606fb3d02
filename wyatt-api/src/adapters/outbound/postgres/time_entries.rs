//! PostgreSQL implementation of the TimeEntryRepository port.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use time::Date;

use crate::domain::{
    models::{
        BudgetLineId, EmployeeId, NewTimeEntry, ProjectId, TimeEntry, TimeEntryId,
        TimeEntryStatus,
    },
    ports::outbound::TimeEntryRepository,
    BillingError,
};

const TIME_ENTRY_COLUMNS: &str = r#"
    id, employee_id, project_id, date, hours, task_name, memo, image_url, status, budget_line_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct TimeEntryRow {
    id: i32,
    employee_id: i32,
    project_id: i32,
    date: Date,
    hours: Decimal,
    task_name: String,
    memo: String,
    image_url: Option<String>,
    status: TimeEntryStatus,
    budget_line_id: Option<i32>,
}

impl From<TimeEntryRow> for TimeEntry {
    fn from(row: TimeEntryRow) -> Self {
        Self {
            id: TimeEntryId::new(row.id),
            employee_id: EmployeeId::new(row.employee_id),
            project_id: ProjectId::new(row.project_id),
            date: row.date,
            hours: row.hours,
            task_name: row.task_name,
            memo: row.memo,
            image_url: row.image_url,
            status: row.status,
            budget_line_id: row.budget_line_id.map(BudgetLineId::new),
        }
    }
}

#[derive(Clone)]
pub struct PostgresTimeEntryRepository {
    pool: PgPool,
}

impl PostgresTimeEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimeEntryRepository for PostgresTimeEntryRepository {
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, BillingError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(&format!(
            r#"
            INSERT INTO time_entries (employee_id, project_id, date, hours, task_name, memo, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TIME_ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.employee_id)
        .bind(entry.project_id)
        .bind(entry.date)
        .bind(entry.hours)
        .bind(&entry.task_name)
        .bind(&entry.memo)
        .bind(entry.image_url.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, BillingError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TimeEntry::from))
    }

    async fn pending_unassigned(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TimeEntry>, BillingError> {
        let rows = sqlx::query_as::<_, TimeEntryRow>(&format!(
            r#"
            SELECT {TIME_ENTRY_COLUMNS}
            FROM time_entries
            WHERE project_id = $1 AND status = 'Pending' AND budget_line_id IS NULL
            ORDER BY date ASC, id ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    async fn assign_to_budget_line(
        &self,
        id: TimeEntryId,
        budget_line_id: BudgetLineId,
    ) -> Result<(), BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE time_entries
            SET budget_line_id = $1, status = 'Approved'
            WHERE id = $2
            "#,
        )
        .bind(budget_line_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BillingError::TimeEntryNotFound(id));
        }

        Ok(())
    }

    async fn set_status(
        &self,
        id: TimeEntryId,
        status: TimeEntryStatus,
    ) -> Result<(), BillingError> {
        let result = sqlx::query("UPDATE time_entries SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BillingError::TimeEntryNotFound(id));
        }

        Ok(())
    }
}
