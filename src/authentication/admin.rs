use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::authentication::compute_password_hash;
use crate::config::AuthSettings;
use crate::errors::AppError;

/// The single administrator account. The hash never leaves the server.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
}

#[tracing::instrument(name = "Get stored admin", skip(pool))]
pub async fn get_stored_admin(pool: &PgPool, username: &str) -> Result<Option<Admin>, AppError> {
    let admin = sqlx::query_as::<_, Admin>(r#"SELECT * FROM admins WHERE username = $1"#)
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::Database(anyhow::Error::from(e).context("Failed to fetch admin"))
        })?;

    Ok(admin)
}

/// Idempotent startup bootstrap: creates the configured admin account when it
/// does not exist yet. Never reachable over the network.
#[tracing::instrument(name = "Bootstrap default admin", skip(pool, auth), fields(username = %auth.admin_username))]
pub async fn ensure_default_admin(pool: &PgPool, auth: &AuthSettings) -> Result<(), AppError> {
    if get_stored_admin(pool, &auth.admin_username).await?.is_some() {
        tracing::debug!("Admin '{}' already exists, skipping bootstrap", auth.admin_username);
        return Ok(());
    }

    let password_hash = compute_password_hash(auth.admin_password.expose_secret().clone()).await?;

    // Unique constraint on username makes a concurrent double-insert a no-op.
    sqlx::query(
        r#"INSERT INTO admins (username, hashed_password) VALUES ($1, $2)
           ON CONFLICT (username) DO NOTHING"#,
    )
    .bind(&auth.admin_username)
    .bind(&password_hash)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::Database(anyhow::Error::from(e).context("Failed to insert default admin"))
    })?;

    tracing::info!("Created default admin '{}'", auth.admin_username);
    Ok(())
}

#[tracing::instrument(name = "Update admin password", skip(pool, password_hash), fields(admin_id = %admin_id))]
pub async fn update_admin_password(
    pool: &PgPool,
    admin_id: i64,
    password_hash: &str,
) -> Result<(), AppError> {
    let result = sqlx::query(r#"UPDATE admins SET hashed_password = $1 WHERE id = $2"#)
        .bind(password_hash)
        .bind(admin_id)
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::Database(anyhow::Error::from(e).context("Failed to update admin password"))
        })?;

    if result.rows_affected() == 0 {
        tracing::warn!("No admin row updated for id {}", admin_id);
        return Err(AppError::NotFound("Admin not found".to_string()));
    }

    tracing::info!("Password updated for admin {}", admin_id);
    Ok(())
}
