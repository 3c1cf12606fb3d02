//! PostgreSQL implementations of the outbound billing ports.

mod employees;
mod expense_reports;
mod invoices;
mod time_entries;

pub use employees::PostgresEmployeeRepository;
pub use expense_reports::PostgresExpenseReportRepository;
pub use invoices::PostgresInvoiceRepository;
pub use time_entries::PostgresTimeEntryRepository;
