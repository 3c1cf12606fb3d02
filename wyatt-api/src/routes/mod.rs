pub(crate) mod error;
pub(crate) mod expense_reports;
pub(crate) mod invoices;
pub(crate) mod projects;
pub(crate) mod time_entries;

use time::{macros::format_description, Date};

pub(crate) use error::ApiError;

/// Parse a `YYYY-MM-DD` date from a request.
fn parse_date(value: &str) -> Result<Date, ApiError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::bad_request(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

/// App state over in-memory repositories for handler tests.
#[cfg(test)]
pub(crate) fn test_state(
    store: &crate::domain::services::memory::MemoryStore,
) -> crate::app_state::AppState {
    use std::{collections::HashMap, sync::Arc};

    use rust_decimal_macros::dec;
    use sqlx::postgres::PgPoolOptions;

    use crate::domain::{models::BillingRates, services::BillingServiceImpl};

    let rates = BillingRates {
        default_hourly_rate: dec!(65),
        default_jurisdiction: "QC".to_string(),
        tax_rates_by_jurisdiction: HashMap::from([("QC".to_string(), dec!(0.14975))]),
        payment_terms_days: 30,
    };
    let service = BillingServiceImpl::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        rates,
    );
    // Never connects; handlers under test only touch the billing service.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://wyatt@localhost/wyatt_test")
        .unwrap();

    crate::app_state::AppState::new(
        reqwest::Url::parse("http://localhost:5173").unwrap(),
        pool,
        Arc::new(service),
    )
}

#[cfg(test)]
pub(crate) fn test_employee(level: i16) -> crate::domain::models::Employee {
    use crate::domain::models::{AccessLevel, Employee, EmployeeId};

    Employee {
        id: EmployeeId::new(level.into()),
        email: format!("level{level}@example.com"),
        full_name: "Test Employee".to_string(),
        access_level: AccessLevel::new(level),
        session_auth_hash: String::new(),
    }
}

/// JSON request, optionally carrying the logged-in employee.
#[cfg(test)]
pub(crate) fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    employee: Option<crate::domain::models::Employee>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(employee) = employee {
        builder = builder.extension(employee);
    }
    builder
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Run one request; an empty body comes back as `Value::Null`.
#[cfg(test)]
pub(crate) async fn send(
    app: axum::Router,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return (status, serde_json::Value::Null);
    }
    (status, serde_json::from_slice(&body).unwrap())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-03-01").unwrap(), date!(2024 - 03 - 01));
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_date("01/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
