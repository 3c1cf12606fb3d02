use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{BudgetLineId, ExpenseReportId, ProjectId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "expense_report_status")]
pub enum ExpenseReportStatus {
    Draft,
    Approved,
    Closed,
}

/// Project-scoped container of budget lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseReport {
    pub id: ExpenseReportId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: ExpenseReportStatus,
}

#[derive(Debug, Clone)]
pub struct NewExpenseReport {
    pub project_id: ProjectId,
    pub name: String,
}

/// A planned task or cost category within an expense report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLine {
    pub id: BudgetLineId,
    pub expense_report_id: ExpenseReportId,
    pub task_name: String,
    pub estimated_labor_cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewBudgetLine {
    pub expense_report_id: ExpenseReportId,
    pub task_name: String,
    pub estimated_labor_cost: Decimal,
}

/// A budget line annotated with aggregates derived from time entries and
/// invoice lines at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLineSummary {
    pub line: BudgetLine,
    /// Sum of hours of every linked time entry, regardless of status.
    pub actual_hours: Decimal,
    /// Sum of hours already placed on invoices.
    pub billed_hours: Decimal,
    pub entry_count: i64,
}

impl BudgetLineSummary {
    /// Hours logged but not yet invoiced. Never negative, even when a line
    /// was billed beyond its logged hours.
    pub fn unbilled_hours(&self) -> Decimal {
        (self.actual_hours - self.billed_hours).max(Decimal::ZERO)
    }
}

/// An expense report with its aggregated budget lines.
#[derive(Debug, Clone)]
pub struct ExpenseReportDetails {
    pub report: ExpenseReport,
    pub lines: Vec<BudgetLineSummary>,
}

impl ExpenseReportDetails {
    pub fn line(&self, id: BudgetLineId) -> Option<&BudgetLineSummary> {
        self.lines.iter().find(|summary| summary.line.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary(actual: Decimal, billed: Decimal) -> BudgetLineSummary {
        BudgetLineSummary {
            line: BudgetLine {
                id: BudgetLineId::new(1),
                expense_report_id: ExpenseReportId::new(1),
                task_name: "Drywall".to_string(),
                estimated_labor_cost: dec!(1000),
            },
            actual_hours: actual,
            billed_hours: billed,
            entry_count: 2,
        }
    }

    #[test]
    fn unbilled_hours_is_actual_minus_billed() {
        assert_eq!(summary(dec!(10), dec!(4)).unbilled_hours(), dec!(6));
    }

    #[test]
    fn unbilled_hours_clamps_at_zero_when_overbilled() {
        assert_eq!(summary(dec!(3), dec!(5)).unbilled_hours(), Decimal::ZERO);
    }
}
