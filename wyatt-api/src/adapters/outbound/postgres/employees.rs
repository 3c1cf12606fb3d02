use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    models::{AccessLevel, Employee, EmployeeId},
    ports::outbound::EmployeeRepository,
    BillingError,
};

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: i32,
    email: String,
    full_name: String,
    access_level: i16,
    session_token: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: EmployeeId::new(row.id),
            email: row.email,
            full_name: row.full_name,
            access_level: AccessLevel::new(row.access_level),
            session_auth_hash: row.session_token,
        }
    }
}

#[derive(Clone)]
pub struct PostgresEmployeeRepository {
    pool: PgPool,
}

impl PostgresEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeRepository {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, BillingError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, email, full_name, access_level, session_token
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn record_login(
        &self,
        email: &str,
        session_token: &str,
    ) -> Result<Option<Employee>, BillingError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            UPDATE employees
            SET session_token = $2, last_login_at = NOW()
            WHERE lower(email) = lower($1)
            RETURNING id, email, full_name, access_level, session_token
            "#,
        )
        .bind(email)
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }
}
