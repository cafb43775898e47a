use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// User role as stored in the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    Tech,
}

/// Authenticated caller context, decoded from the access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser {
    pub id: Uuid,
    pub role: Role,
}

// Two deliberately separate predicates: QC actions accept managers,
// billing and approval do not.
impl AuthedUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn require_admin_or_manager(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin | Role::Manager => Ok(()),
            Role::Tech => Err(ApiError::Forbidden),
        }
    }
}
