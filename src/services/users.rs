use chrono::Utc;
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::ActingUser};

/// Mirrors the identity provider's view of `user` into the 'users' table so
/// authored rows can reference it and display its current name.
pub async fn sync(pool: &SqlitePool, user: &ActingUser) -> Result<(), AppError> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, username, is_staff, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        ON CONFLICT (id) DO UPDATE SET
            username = excluded.username,
            is_staff = excluded.is_staff,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(user.is_staff)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to sync user {}: {:?}", user.id, e);
        AppError::Internal(e.to_string())
    })?;

    Ok(())
}
