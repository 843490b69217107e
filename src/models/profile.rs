//! Member profiles and the authenticated actor

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use utoipa::ToSchema;

use super::text_enum;
use crate::error::AppError;

/// Portal role of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Member,
}

text_enum!(Role {
    Admin => "admin",
    Librarian => "librarian",
    Member => "member",
});

impl Role {
    /// Librarians and administrators run the circulation desk
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }
}

/// Short profile representation joined onto circulation records
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileShort {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub member_id: Option<String>,
    pub role: Role,
}

/// Columns selected from `profiles p` for [`ProfileShort::from_joined`]
pub(crate) const PROFILE_SHORT_COLUMNS: &str = "p.full_name AS user_full_name, p.email AS user_email, \
     p.member_id AS user_member_id, p.role AS user_role";

impl ProfileShort {
    pub(crate) fn from_joined(row: &PgRow, id: i32) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id,
            full_name: row.try_get("user_full_name")?,
            email: row.try_get("user_email")?,
            member_id: row.try_get("user_member_id")?,
            role: row.try_get("user_role")?,
        })
    }
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl ActorClaims {
    /// Create a signed token for these claims
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and validate a bearer token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Librarian or administrator role required".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Administrator privileges required".to_string()))
        }
    }

    /// Members may only touch their own records; staff may touch anyone's
    pub fn require_self_or_staff(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Cannot access another member's records".to_string()))
        }
    }

    pub fn require_self(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Only the requester may do this".to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) fn test_actor(user_id: i32, role: Role) -> ActorClaims {
    ActorClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role,
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: chrono::Utc::now().timestamp(),
    }
}
