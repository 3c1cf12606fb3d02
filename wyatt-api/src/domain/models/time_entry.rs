use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{BudgetLineId, EmployeeId, ProjectId, TimeEntryId};

/// Approval state of a time entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "time_entry_status")]
pub enum TimeEntryStatus {
    Pending,
    Approved,
}

/// Hours worked by an employee on a project, optionally linked to a budget line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub date: Date,
    pub hours: Decimal,
    pub task_name: String,
    pub memo: String,
    pub image_url: Option<String>,
    pub status: TimeEntryStatus,
    pub budget_line_id: Option<BudgetLineId>,
}

/// An employee's time submission. Always recorded as pending and unassigned.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub date: Date,
    pub hours: Decimal,
    pub task_name: String,
    pub memo: String,
    pub image_url: Option<String>,
}

impl NewTimeEntry {
    pub fn new(
        employee_id: EmployeeId,
        project_id: ProjectId,
        date: Date,
        hours: Decimal,
        task_name: impl Into<String>,
    ) -> Self {
        Self {
            employee_id,
            project_id,
            date,
            hours,
            task_name: task_name.into(),
            memo: String::new(),
            image_url: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}
