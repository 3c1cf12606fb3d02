use std::collections::HashMap;

use rust_decimal::Decimal;

use super::{
    BudgetLineId, BudgetLineSummary, CustomerId, ExpenseReportDetails, ExpenseReportId,
    GenerateInvoiceRequest, InvoiceItem, ProjectId,
};
use crate::domain::BillingError;

/// Rates used when proposing and invoicing labor.
#[derive(Debug, Clone)]
pub struct BillingRates {
    pub default_hourly_rate: Decimal,
    pub default_jurisdiction: String,
    pub tax_rates_by_jurisdiction: HashMap<String, Decimal>,
    pub payment_terms_days: i64,
}

impl BillingRates {
    /// Look up the tax rate for a jurisdiction, falling back to the default
    /// jurisdiction when none is given. Codes are matched case-insensitively
    /// against upper-case keys.
    pub fn tax_rate(&self, jurisdiction: Option<&str>) -> Result<Decimal, BillingError> {
        let key = jurisdiction
            .unwrap_or(&self.default_jurisdiction)
            .trim()
            .to_uppercase();
        self.tax_rates_by_jurisdiction
            .get(&key)
            .copied()
            .ok_or(BillingError::UnknownJurisdiction(key))
    }
}

/// One line of a billing proposal.
///
/// Hours and amount are independent facets: editing hours recomputes the
/// amount at the hourly rate, editing the amount leaves hours untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalLine {
    pub budget_line_id: BudgetLineId,
    pub description: String,
    pub actual_hours: Decimal,
    pub billed_hours: Decimal,
    pub unbilled_hours: Decimal,
    pub hours_to_bill: Decimal,
    pub amount_to_bill: Decimal,
    hourly_rate: Decimal,
}

fn labor_amount(hours: Decimal, hourly_rate: Decimal) -> Result<Decimal, BillingError> {
    hours
        .checked_mul(hourly_rate)
        .ok_or_else(|| BillingError::AmountOutOfRange(format!("{hours} h at {hourly_rate}")))
}

impl ProposalLine {
    pub fn from_summary(
        summary: &BudgetLineSummary,
        hourly_rate: Decimal,
    ) -> Result<Self, BillingError> {
        let unbilled_hours = summary.unbilled_hours();
        Ok(Self {
            budget_line_id: summary.line.id,
            description: summary.line.task_name.clone(),
            actual_hours: summary.actual_hours,
            billed_hours: summary.billed_hours,
            unbilled_hours,
            hours_to_bill: unbilled_hours,
            amount_to_bill: labor_amount(unbilled_hours, hourly_rate)?,
            hourly_rate,
        })
    }

    /// Negative hours are rejected; zero drops the line from billing.
    pub fn set_hours(&mut self, hours: Decimal) -> Result<(), BillingError> {
        if hours < Decimal::ZERO {
            return Err(BillingError::InvalidHours(hours.to_string()));
        }
        self.amount_to_bill = labor_amount(hours, self.hourly_rate)?;
        self.hours_to_bill = hours;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: Decimal) {
        self.amount_to_bill = amount;
    }

    pub fn hourly_rate(&self) -> Decimal {
        self.hourly_rate
    }

    fn to_item(&self) -> InvoiceItem {
        InvoiceItem {
            budget_line_id: self.budget_line_id,
            description: self.description.clone(),
            billed_hours: self.hours_to_bill,
            billed_labor_amount: self.amount_to_bill,
        }
    }
}

/// An operator override for one proposal line.
///
/// When both are given the hours are applied first, so the explicit amount
/// wins over the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalEdit {
    pub budget_line_id: BudgetLineId,
    pub hours: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// In-memory proposal of what to bill for an expense report.
#[derive(Debug, Clone)]
pub struct BillingProposal {
    pub project_id: ProjectId,
    pub expense_report_id: ExpenseReportId,
    pub lines: Vec<ProposalLine>,
}

impl BillingProposal {
    pub fn from_report(
        details: &ExpenseReportDetails,
        hourly_rate: Decimal,
    ) -> Result<Self, BillingError> {
        Ok(Self {
            project_id: details.report.project_id,
            expense_report_id: details.report.id,
            lines: details
                .lines
                .iter()
                .map(|summary| ProposalLine::from_summary(summary, hourly_rate))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn line_mut(&mut self, id: BudgetLineId) -> Option<&mut ProposalLine> {
        self.lines.iter_mut().find(|line| line.budget_line_id == id)
    }

    /// Apply operator overrides. A line outside the proposal is
    /// `BudgetLineNotFound`.
    pub fn apply(&mut self, edits: &[ProposalEdit]) -> Result<(), BillingError> {
        for edit in edits {
            let line = self
                .line_mut(edit.budget_line_id)
                .ok_or(BillingError::BudgetLineNotFound(edit.budget_line_id))?;
            if let Some(hours) = edit.hours {
                line.set_hours(hours)?;
            }
            if let Some(amount) = edit.amount {
                line.set_amount(amount);
            }
        }
        Ok(())
    }

    /// Sum of amounts over lines that would be billed.
    pub fn subtotal(&self) -> Result<Decimal, BillingError> {
        self.lines
            .iter()
            .map(|line| line.amount_to_bill)
            .filter(|amount| *amount > Decimal::ZERO)
            .try_fold(Decimal::ZERO, |sum, amount| {
                sum.checked_add(amount)
                    .ok_or_else(|| BillingError::AmountOutOfRange(format!("{sum} + {amount}")))
            })
    }

    /// Build the generator input from the lines with a positive amount.
    pub fn into_request(
        self,
        customer_id: CustomerId,
        jurisdiction: Option<String>,
    ) -> Result<GenerateInvoiceRequest, BillingError> {
        let subtotal = self.subtotal()?;
        let items = self
            .lines
            .iter()
            .map(ProposalLine::to_item)
            .filter(InvoiceItem::is_billable)
            .collect();

        Ok(GenerateInvoiceRequest {
            project_id: self.project_id,
            expense_report_id: self.expense_report_id,
            customer_id,
            items,
            subtotal,
            jurisdiction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        BudgetLine, ExpenseReport, ExpenseReportStatus,
    };
    use rust_decimal_macros::dec;

    fn summary(id: i32, actual: Decimal, billed: Decimal) -> BudgetLineSummary {
        BudgetLineSummary {
            line: BudgetLine {
                id: BudgetLineId::new(id),
                expense_report_id: ExpenseReportId::new(1),
                task_name: format!("Task {id}"),
                estimated_labor_cost: dec!(5000),
            },
            actual_hours: actual,
            billed_hours: billed,
            entry_count: 1,
        }
    }

    fn details(lines: Vec<BudgetLineSummary>) -> ExpenseReportDetails {
        ExpenseReportDetails {
            report: ExpenseReport {
                id: ExpenseReportId::new(1),
                project_id: ProjectId::new(9),
                name: "Phase 1".to_string(),
                status: ExpenseReportStatus::Approved,
            },
            lines,
        }
    }

    fn rates() -> BillingRates {
        BillingRates {
            default_hourly_rate: dec!(65),
            default_jurisdiction: "QC".to_string(),
            tax_rates_by_jurisdiction: HashMap::from([
                ("QC".to_string(), dec!(0.14975)),
                ("ON".to_string(), dec!(0.13)),
            ]),
            payment_terms_days: 30,
        }
    }

    #[test]
    fn default_proposal_bills_unbilled_hours_at_rate() {
        let line = ProposalLine::from_summary(&summary(1, dec!(10), dec!(4)), dec!(65)).unwrap();
        assert_eq!(line.hours_to_bill, dec!(6));
        assert_eq!(line.amount_to_bill, dec!(390));
    }

    #[test]
    fn editing_hours_recomputes_amount() {
        let mut line = ProposalLine::from_summary(&summary(1, dec!(10), dec!(4)), dec!(65)).unwrap();
        line.set_hours(dec!(2)).unwrap();
        assert_eq!(line.amount_to_bill, dec!(130));
    }

    #[test]
    fn editing_amount_leaves_hours_alone() {
        let mut line = ProposalLine::from_summary(&summary(1, dec!(10), dec!(4)), dec!(65)).unwrap();
        line.set_amount(dec!(500));
        assert_eq!(line.hours_to_bill, dec!(6));
        assert_eq!(line.amount_to_bill, dec!(500));
    }

    #[test]
    fn into_request_drops_zero_amount_lines() {
        let mut proposal = BillingProposal::from_report(
            &details(vec![
                summary(1, dec!(8), dec!(0)),
                summary(2, dec!(4), dec!(4)),
            ]),
            dec!(65),
        )
        .unwrap();
        proposal
            .line_mut(BudgetLineId::new(1))
            .unwrap()
            .set_amount(dec!(100));

        let request = proposal.into_request(CustomerId::new(3), None).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].budget_line_id, BudgetLineId::new(1));
        assert_eq!(request.subtotal, dec!(100));
        assert_eq!(request.project_id, ProjectId::new(9));
    }

    #[test]
    fn edits_apply_hours_before_amount() {
        let mut proposal = BillingProposal::from_report(
            &details(vec![
                summary(1, dec!(10), dec!(4)),
                summary(2, dec!(8), dec!(0)),
            ]),
            dec!(65),
        )
        .unwrap();

        proposal
            .apply(&[
                ProposalEdit {
                    budget_line_id: BudgetLineId::new(1),
                    hours: Some(dec!(3)),
                    amount: None,
                },
                ProposalEdit {
                    budget_line_id: BudgetLineId::new(2),
                    hours: Some(dec!(1)),
                    amount: Some(dec!(250)),
                },
            ])
            .unwrap();

        assert_eq!(proposal.lines[0].hours_to_bill, dec!(3));
        assert_eq!(proposal.lines[0].amount_to_bill, dec!(195));
        assert_eq!(proposal.lines[1].hours_to_bill, dec!(1));
        assert_eq!(proposal.lines[1].amount_to_bill, dec!(250));
        assert_eq!(proposal.subtotal().unwrap(), dec!(445));
    }

    #[test]
    fn edit_for_unknown_line_is_rejected() {
        let mut proposal =
            BillingProposal::from_report(&details(vec![summary(1, dec!(10), dec!(4))]), dec!(65))
                .unwrap();

        let err = proposal
            .apply(&[ProposalEdit {
                budget_line_id: BudgetLineId::new(77),
                hours: Some(dec!(1)),
                amount: None,
            }])
            .unwrap_err();

        assert!(matches!(err, BillingError::BudgetLineNotFound(id) if id == BudgetLineId::new(77)));
    }

    #[test]
    fn oversized_edits_fail_instead_of_overflowing() {
        let mut line = ProposalLine::from_summary(&summary(1, dec!(10), dec!(4)), dec!(65)).unwrap();

        let err = line.set_hours(Decimal::MAX).unwrap_err();
        assert!(matches!(err, BillingError::AmountOutOfRange(_)));
        assert_eq!(line.hours_to_bill, dec!(6));

        assert!(matches!(
            line.set_hours(dec!(-1)),
            Err(BillingError::InvalidHours(_))
        ));

        let mut proposal = BillingProposal::from_report(
            &details(vec![
                summary(1, dec!(1), dec!(0)),
                summary(2, dec!(1), dec!(0)),
            ]),
            dec!(65),
        )
        .unwrap();
        proposal.lines[0].set_amount(Decimal::MAX);
        proposal.lines[1].set_amount(Decimal::MAX);
        assert!(matches!(
            proposal.subtotal(),
            Err(BillingError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn tax_rate_falls_back_to_default_jurisdiction() {
        let rates = rates();
        assert_eq!(rates.tax_rate(None).unwrap(), dec!(0.14975));
        assert_eq!(rates.tax_rate(Some("ON")).unwrap(), dec!(0.13));
    }

    #[test]
    fn unknown_jurisdiction_is_rejected() {
        let err = rates().tax_rate(Some("XX")).unwrap_err();
        assert!(matches!(err, BillingError::UnknownJurisdiction(ref j) if j == "XX"));
    }
}
