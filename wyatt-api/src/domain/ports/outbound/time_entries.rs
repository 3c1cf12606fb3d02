//! Time entry ledger port (outbound).

use async_trait::async_trait;

use crate::domain::{
    models::{BudgetLineId, NewTimeEntry, ProjectId, TimeEntry, TimeEntryId, TimeEntryStatus},
    BillingError,
};

/// Outbound port for the time entry ledger.
///
/// Entries are never deleted; they only gain a budget line link or change
/// approval status.
#[async_trait]
pub trait TimeEntryRepository: Send + Sync + 'static {
    /// Record a new entry as `Pending` and unassigned.
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, BillingError>;

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, BillingError>;

    /// Pending entries for a project with no budget line, oldest first.
    async fn pending_unassigned(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TimeEntry>, BillingError>;

    /// Link an entry to a budget line and mark it approved in one write.
    ///
    /// Returns `TimeEntryNotFound` when no row was updated.
    async fn assign_to_budget_line(
        &self,
        id: TimeEntryId,
        budget_line_id: BudgetLineId,
    ) -> Result<(), BillingError>;

    /// Returns `TimeEntryNotFound` when no row was updated.
    async fn set_status(
        &self,
        id: TimeEntryId,
        status: TimeEntryStatus,
    ) -> Result<(), BillingError>;
}
