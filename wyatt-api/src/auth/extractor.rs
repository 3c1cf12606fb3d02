use std::ops::Deref;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{domain::models::Employee, routes::ApiError};

use super::AuthSession;

/// Extracts the session-linked [`Employee`] from the request. Returns 401
/// Unauthorized if nobody is logged in.
///
/// Authorization by access level is not decided here; the billing service
/// checks it for the actions that need it.
#[derive(Debug, Clone)]
pub struct AuthEmployee(Employee);

impl Deref for AuthEmployee {
    type Target = Employee;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthEmployee
where
    S: Send + Sync,
    AuthSession: FromRequestParts<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Handler tests inject the caller directly instead of running a session.
        #[cfg(test)]
        if let Some(employee) = parts.extensions.get::<Employee>() {
            return Ok(AuthEmployee(employee.clone()));
        }

        let auth_session = AuthSession::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

        auth_session
            .user
            .map(AuthEmployee)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}
