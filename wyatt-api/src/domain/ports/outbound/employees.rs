use async_trait::async_trait;

use crate::domain::{
    models::{Employee, EmployeeId},
    BillingError,
};

/// Outbound port for the employee records that back login sessions.
#[async_trait]
pub trait EmployeeRepository: Send + Sync + 'static {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, BillingError>;

    /// Store a fresh session token for the employee with this email.
    ///
    /// Returns `None` when no employee has the email; employees are never
    /// created through login.
    async fn record_login(
        &self,
        email: &str,
        session_token: &str,
    ) -> Result<Option<Employee>, BillingError>;
}
