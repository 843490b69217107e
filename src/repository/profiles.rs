//! Profiles repository (read-only, profiles are managed by the identity provider)

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::profile::{ProfileShort, Role},
};

#[derive(Clone)]
pub struct ProfilesRepository {
    pool: Pool<Postgres>,
}

impl ProfilesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get profile summary by ID
    pub async fn get_short(&self, id: i32) -> AppResult<ProfileShort> {
        let row = sqlx::query("SELECT id, full_name, email, member_id, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", id)))?;

        Ok(short_from_row(&row)?)
    }

    /// Find the profile whose member card number or email is `search`.
    /// Email comparison ignores case.
    pub async fn find_by_member_id_or_email(&self, search: &str) -> AppResult<Option<ProfileShort>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, email, member_id, role FROM profiles
            WHERE member_id = $1 OR LOWER(email) = LOWER($1)
            ORDER BY (member_id = $1) DESC NULLS LAST, id
            LIMIT 1
            "#,
        )
        .bind(search)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(short_from_row).transpose()?)
    }
}

fn short_from_row(row: &PgRow) -> Result<ProfileShort, sqlx::Error> {
    Ok(ProfileShort {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        member_id: row.try_get("member_id")?,
        role: row.try_get::<Role, _>("role")?,
    })
}
