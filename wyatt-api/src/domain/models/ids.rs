use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares an `i32` identifier newtype matching a database SERIAL column.
macro_rules! serial_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i32);

        impl $name {
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            pub fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

serial_id!(
    /// An employee identifier. Also the session user id.
    EmployeeId
);
serial_id!(
    /// A construction project identifier.
    ProjectId
);
serial_id!(CustomerId);
serial_id!(
    /// Identifies the expense report grouping a project's budget lines.
    ExpenseReportId
);
serial_id!(
    /// Identifies a single budget line (`expense_report_lines.id`).
    BudgetLineId
);
serial_id!(TimeEntryId);
serial_id!(InvoiceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&BudgetLineId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: InvoiceId = serde_json::from_str("7").unwrap();
        assert_eq!(id.as_i32(), 7);
    }
}
