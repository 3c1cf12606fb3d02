use std::fmt;

use axum_login::AuthUser;
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Numeric privilege level. Lower is more privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevel(i16);

impl AccessLevel {
    /// Highest level still allowed to manage invoices and approvals.
    pub const MANAGER: AccessLevel = AccessLevel(2);

    pub fn new(level: i16) -> Self {
        Self(level)
    }

    pub fn as_i16(&self) -> i16 {
        self.0
    }

    pub fn can_manage_billing(&self) -> bool {
        *self <= Self::MANAGER
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub email: String,
    pub full_name: String,
    pub access_level: AccessLevel,
    #[serde(skip)]
    pub session_auth_hash: String,
}

impl fmt::Debug for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Employee")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("access_level", &self.access_level)
            .field("session_auth_hash", &"[redacted]")
            .finish()
    }
}

impl AuthUser for Employee {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id.as_i32().into()
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.session_auth_hash.as_bytes()
    }
}
