use std::sync::Arc;

use reqwest::Url;
use sqlx::PgPool;

use crate::domain::ports::inbound::BillingService;

#[derive(Clone)]
pub struct AppState {
    pub app_url: Url,
    pub db_pool: Arc<PgPool>,
    pub billing_service: Arc<dyn BillingService>,
}

impl AppState {
    pub fn new(app_url: Url, db_pool: PgPool, billing_service: Arc<dyn BillingService>) -> Self {
        Self {
            app_url,
            db_pool: Arc::new(db_pool),
            billing_service,
        }
    }
}
