use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use axum::extract::State;
use axum::{Extension, Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::authentication::{get_stored_admin, update_admin_password, Admin};
use crate::errors::AppError;
use crate::InnerState;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(source) => {
                AppError::Authentication(source.context("Invalid credentials"))
            }
            AuthError::UnexpectedError(source) => AppError::Unexpected(source),
        }
    }
}

#[tracing::instrument(name = "Validate admin credentials", skip(credentials, pool), fields(username = %credentials.username))]
pub async fn validate_credentials(
    credentials: &Credentials,
    pool: &PgPool,
) -> Result<Admin, AppError> {
    let mut stored_admin = None;
    // Fallback hash keeps unknown-username and wrong-password timings close.
    let mut expected_password_hash = String::from(
        "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno",
    );

    match get_stored_admin(pool, &credentials.username).await? {
        Some(admin) => {
            tracing::debug!("Admin found with id {}", admin.id);
            expected_password_hash = admin.hashed_password.clone();
            stored_admin = Some(admin);
        }
        None => {
            tracing::warn!("No admin stored for username '{}'", credentials.username);
        }
    }

    verify_password_hash(&expected_password_hash, &credentials.password)?;

    match stored_admin {
        Some(admin) => {
            tracing::info!("Credential validation successful for '{}'", admin.username);
            Ok(admin)
        }
        None => Err(AuthError::InvalidCredentials(anyhow::anyhow!("Unknown username.")).into()),
    }
}

#[tracing::instrument(name = "Verify password hash", skip(expected_password_hash, password_candidate))]
pub fn verify_password_hash(
    expected_password_hash: &str,
    password_candidate: &str,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(password_candidate.as_bytes(), &expected_password_hash)
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(name = "Compute password hash", skip(password))]
pub async fn compute_password_hash(password: String) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    let params = Params::new(15000, 2, 1, None).map_err(|e| {
        AppError::Unexpected(anyhow::anyhow!(e).context("Failed to create Argon2 params"))
    })?;
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Unexpected(anyhow::anyhow!(e).context("Failed to hash password")))?
        .to_string();

    Ok(password_hash)
}

#[tracing::instrument(name = "Change admin password", skip(inner, admin, form), fields(username = %admin.username))]
pub async fn change_password(
    State(inner): State<InnerState>,
    Extension(admin): Extension<Admin>,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Json<Value>, AppError> {
    let InnerState { db, .. } = inner;

    if verify_password_hash(&admin.hashed_password, &form.current_password).is_err() {
        tracing::warn!("Password change rejected: current password did not verify");
        return Err(AppError::Authentication(anyhow::anyhow!(
            "Current password is incorrect"
        )));
    }

    if form.new_password != form.confirm_password {
        tracing::warn!("Password change rejected: confirmation mismatch");
        return Err(AppError::Validation(
            "New passwords do not match".to_string(),
        ));
    }

    let password_hash = compute_password_hash(form.new_password).await?;
    update_admin_password(&db, admin.id, &password_hash).await?;

    Ok(Json(json!({ "detail": "Password updated successfully!" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let hash = compute_password_hash("StrongPassword123".to_string())
            .await
            .expect("hashing should succeed");

        assert!(verify_password_hash(&hash, "StrongPassword123").is_ok());
    }

    #[tokio::test]
    async fn wrong_candidate_fails_verification() {
        let hash = compute_password_hash("StrongPassword123".to_string())
            .await
            .expect("hashing should succeed");

        let result = verify_password_hash(&hash, "WrongPassword");
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let first = compute_password_hash("StrongPassword123".to_string())
            .await
            .expect("hashing should succeed");
        let second = compute_password_hash("StrongPassword123".to_string())
            .await
            .expect("hashing should succeed");

        // Fresh salts per hash.
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_stored_hash_is_rejected() {
        let result = verify_password_hash("not-a-phc-string", "anything");
        assert!(result.is_err());
    }
}
