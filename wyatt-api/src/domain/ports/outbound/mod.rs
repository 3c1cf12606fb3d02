mod employees;
mod expense_reports;
mod invoices;
mod time_entries;

pub use employees::*;
pub use expense_reports::*;
pub use invoices::*;
pub use time_entries::*;
