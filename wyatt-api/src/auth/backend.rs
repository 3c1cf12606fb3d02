use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId as SessionUserId};
use oauth2::{
    basic::{BasicClient, BasicRequestTokenError},
    reqwest::{async_http_client, AsyncHttpClientError},
    AuthorizationCode, CsrfToken, TokenResponse,
};
use reqwest::{
    header::{AUTHORIZATION, USER_AGENT},
    Url,
};
use serde::Deserialize;

use crate::domain::{
    models::{Employee, EmployeeId},
    ports::outbound::EmployeeRepository,
    BillingError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub code: String,
    pub old_state: CsrfToken,
    pub new_state: CsrfToken,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Storage(#[from] BillingError),

    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error(transparent)]
    OAuth2(BasicRequestTokenError<AsyncHttpClientError>),
}

#[derive(Clone)]
pub struct AuthBackend {
    employees: Arc<dyn EmployeeRepository>,
    client: BasicClient,
    userinfo_url: Url,
}

impl AuthBackend {
    pub fn new(
        employees: Arc<dyn EmployeeRepository>,
        client: BasicClient,
        userinfo_url: Url,
    ) -> Self {
        Self {
            employees,
            client,
            userinfo_url,
        }
    }

    pub fn authorize_url(&self) -> (Url, CsrfToken) {
        self.client.authorize_url(CsrfToken::new_random).url()
    }
}

impl fmt::Debug for AuthBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBackend")
            .field("userinfo_url", &self.userinfo_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthnBackend for AuthBackend {
    type User = Employee;
    type Credentials = Credentials;
    type Error = BackendError;

    /// Returns `Ok(None)` when the CSRF state does not match or the email
    /// does not belong to a known employee.
    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        // Ensure the CSRF state has not been tampered with.
        if creds.old_state.secret() != creds.new_state.secret() {
            return Ok(None);
        };

        let token_res = self
            .client
            .exchange_code(AuthorizationCode::new(creds.code))
            .request_async(async_http_client)
            .await
            .map_err(Self::Error::OAuth2)?;

        let user_info = reqwest::Client::new()
            .get(self.userinfo_url.clone())
            .header(USER_AGENT.as_str(), "wyatt-login")
            .header(
                AUTHORIZATION.as_str(),
                format!("Bearer {}", token_res.access_token().secret()),
            )
            .send()
            .await
            .map_err(Self::Error::Reqwest)?
            .json::<UserInfo>()
            .await
            .map_err(Self::Error::Reqwest)?;

        let employee = self
            .employees
            .record_login(&user_info.email, token_res.access_token().secret())
            .await?;

        if employee.is_none() {
            tracing::warn!(email = %user_info.email, "login refused for unknown employee");
        }

        Ok(employee)
    }

    async fn get_user(
        &self,
        user_id: &SessionUserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Ok(id) = i32::try_from(*user_id) else {
            return Ok(None);
        };

        Ok(self.employees.get_employee(EmployeeId::new(id)).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<AuthBackend>;
