use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoBillableItems,
    InvalidHours,
    AmountOutOfRange,
    ProjectMismatch,
    UnknownJurisdiction,
    ExpenseReportNotFound,
    BudgetLineNotFound,
    TimeEntryNotFound,
    InvoiceNotFound,
    InsufficientAccessLevel,
    InvalidStatusTransition,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<ErrorCode>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        match err {
            BillingError::NoBillableItems => {
                Self::bad_request(message).with_code(ErrorCode::NoBillableItems)
            }
            BillingError::InvalidHours(_) => {
                Self::bad_request(message).with_code(ErrorCode::InvalidHours)
            }
            BillingError::AmountOutOfRange(_) => {
                Self::bad_request(message).with_code(ErrorCode::AmountOutOfRange)
            }
            BillingError::ProjectMismatch { .. } => {
                Self::bad_request(message).with_code(ErrorCode::ProjectMismatch)
            }
            BillingError::UnknownJurisdiction(_) => {
                Self::bad_request(message).with_code(ErrorCode::UnknownJurisdiction)
            }
            BillingError::ExpenseReportNotFound(_) => {
                Self::not_found(message).with_code(ErrorCode::ExpenseReportNotFound)
            }
            BillingError::BudgetLineNotFound(_) => {
                Self::not_found(message).with_code(ErrorCode::BudgetLineNotFound)
            }
            BillingError::TimeEntryNotFound(_) => {
                Self::not_found(message).with_code(ErrorCode::TimeEntryNotFound)
            }
            BillingError::InvoiceNotFound(_) => {
                Self::not_found(message).with_code(ErrorCode::InvoiceNotFound)
            }
            BillingError::Forbidden(_) => {
                Self::forbidden(message).with_code(ErrorCode::InsufficientAccessLevel)
            }
            BillingError::InvalidStatusTransition { .. } => {
                Self::conflict(message).with_code(ErrorCode::InvalidStatusTransition)
            }
            BillingError::Storage(detail) => {
                tracing::error!("Billing storage failure: {}", detail);
                Self::internal("storage failure")
            }
        }
    }
}
