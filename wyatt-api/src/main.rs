use std::{sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use time::{macros::format_description, OffsetDateTime};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt::time::LocalTime, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::ports::inbound::BillingService;

mod adapters;
mod app_state;
mod auth;
mod config;
mod domain;
mod factory;
mod router;
mod routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wyatt_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_timer(timer))
        .init();

    let config = config::read_config()?;

    let connection_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(config.database.with_db())
        .await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    let billing_service = factory::billing_service(connection_pool.clone(), config.billing.rates());
    spawn_overdue_sweep(
        billing_service.clone(),
        Duration::from_secs(config.billing.overdue_sweep_interval_secs.max(1)),
    );

    let addr = format!("{}:{}", config.application.host, config.application.port);
    let app = router::create(connection_pool, billing_service, config).await?;

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically flip sent invoices past their due date to overdue.
fn spawn_overdue_sweep(billing_service: Arc<dyn BillingService>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let today = OffsetDateTime::now_utc().date();
            if let Err(e) = billing_service.mark_overdue_invoices(today).await {
                tracing::error!("Overdue sweep failed: {}", e);
            }
        }
    });
}
