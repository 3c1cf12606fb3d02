//! Composition root: the only place that names concrete outbound adapters.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    adapters::outbound::postgres::{
        PostgresEmployeeRepository, PostgresExpenseReportRepository, PostgresInvoiceRepository,
        PostgresTimeEntryRepository,
    },
    domain::{
        models::BillingRates,
        ports::{inbound::BillingService, outbound::EmployeeRepository},
        services::BillingServiceImpl,
    },
};

pub fn billing_service(pool: PgPool, rates: BillingRates) -> Arc<dyn BillingService> {
    Arc::new(BillingServiceImpl::new(
        Arc::new(PostgresTimeEntryRepository::new(pool.clone())),
        Arc::new(PostgresExpenseReportRepository::new(pool.clone())),
        Arc::new(PostgresInvoiceRepository::new(pool)),
        rates,
    ))
}

pub fn employee_repository(pool: PgPool) -> Arc<dyn EmployeeRepository> {
    Arc::new(PostgresEmployeeRepository::new(pool))
}
