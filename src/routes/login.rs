use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::authentication::{validate_credentials, Admin, Credentials};
use crate::config::AuthSettings;
use crate::errors::AppError;
use crate::utils::{clear_auth_cookie, redirect_found, setup_auth_cookie};
use crate::InnerState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_form() -> Json<Value> {
    Json(json!({ "page": "admin/login" }))
}

#[tracing::instrument(name = "Admin login", skip(cookies, inner, form), fields(username = %form.username))]
pub async fn login_user(
    cookies: Cookies,
    State(inner): State<InnerState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    tracing::info!("Starting login for '{}'", form.username);
    let InnerState { db, auth, .. } = inner;

    let credentials = Credentials {
        username: form.username,
        password: form.password,
    };

    let admin = validate_credentials(&credentials, &db).await?;
    tracing::info!("Credentials validated for '{}'", admin.username);

    let token = generate_token(&admin.username, &auth)?;
    setup_auth_cookie(&token, auth.token_expiry_minutes, &cookies);

    tracing::info!("Login completed for '{}'", admin.username);
    Ok(redirect_found("/admin/dashboard"))
}

#[tracing::instrument(name = "Admin logout", skip(cookies))]
pub async fn logout_user(cookies: Cookies) -> impl IntoResponse {
    clear_auth_cookie(&cookies);
    tracing::info!("Logout completed");
    redirect_found("/admin/login")
}

#[tracing::instrument(name = "Admin dashboard", skip_all, fields(username = %admin.username))]
pub async fn admin_dashboard(Extension(admin): Extension<Admin>) -> Json<Value> {
    Json(json!({
        "page": "admin/dashboard",
        "admin": { "id": admin.id, "username": admin.username }
    }))
}

pub async fn change_password_form(Extension(admin): Extension<Admin>) -> Json<Value> {
    Json(json!({
        "page": "admin/change_password",
        "admin": { "username": admin.username }
    }))
}

#[tracing::instrument(name = "Generate JWT token", skip(auth), fields(username = %username))]
pub fn generate_token(username: &str, auth: &AuthSettings) -> Result<String, AppError> {
    let claims = Claims {
        sub: username.to_owned(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(auth.token_expiry_minutes))
            .timestamp() as usize,
    };

    let header = Header::new(Algorithm::HS256);
    let token = encode(
        &header,
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Unexpected(anyhow::Error::new(e).context("Failed to encode JWT token")))?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_auth(expiry_minutes: i64) -> AuthSettings {
        AuthSettings {
            jwt_secret: Secret::new("test-secret-that-is-long-enough-for-hmac".to_string()),
            token_expiry_minutes: expiry_minutes,
            admin_username: "admin".to_string(),
            admin_password: Secret::new("StrongPassword123".to_string()),
        }
    }

    #[test]
    fn token_expiry_tracks_configured_lifetime() {
        let auth = test_auth(60);
        let token = generate_token("admin", &auth).expect("token generation should succeed");

        let claims =
            crate::authentication::decode_claims(&token, &auth).expect("decoding should succeed");

        let now = chrono::Utc::now().timestamp() as usize;
        let hour = 60 * 60;
        // Within a few seconds of now + 60min.
        assert!(claims.exp >= now + hour - 5);
        assert!(claims.exp <= now + hour + 5);
    }

    #[test]
    fn token_subject_is_the_username()  {
        let auth = test_auth(60);
        let token = generate_token("evangelist", &auth).expect("token generation should succeed");

        let claims =
            crate::authentication::decode_claims(&token, &auth).expect("decoding should succeed");
        assert_eq!(claims.sub, "evangelist");
    }
}
