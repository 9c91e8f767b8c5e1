use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;

use crate::authentication::get_stored_admin;
use crate::config::AuthSettings;
use crate::errors::AppError;
use crate::routes::Claims;
use crate::utils::AUTH_COOKIE;
use crate::InnerState;

/// Guards every admin route: resolves the auth cookie to an `Admin` record
/// and stores it in the request extensions for the handler.
pub async fn admin_auth(
    State(inner): State<InnerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let InnerState { db, auth, .. } = inner;

    let cookie_value = extract_auth_cookie(&request).ok_or_else(|| {
        tracing::warn!("Admin route hit without auth cookie");
        AppError::Authentication(anyhow::anyhow!("Not authenticated"))
    })?;

    let token = cookie_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication(anyhow::anyhow!("Invalid token")))?;

    let claims = decode_claims(token, &auth)?;

    let admin = get_stored_admin(&db, &claims.sub).await?.ok_or_else(|| {
        tracing::warn!("Token subject '{}' has no admin record", claims.sub);
        AppError::Authentication(anyhow::anyhow!("Admin not found"))
    })?;

    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

/// Validate signature and expiry, returning the embedded claims.
///
/// An expired token fails here the same way a tampered one does.
pub fn decode_claims(token: &str, auth: &AuthSettings) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Authentication(anyhow::anyhow!(e).context("Invalid token")))?;

    Ok(token_data.claims)
}

fn extract_auth_cookie(request: &Request) -> Option<String> {
    let cookie_header = request.headers().get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for part in cookie_str.split(';') {
        if let Ok(parsed) = Cookie::parse(part.trim()) {
            if parsed.name() == AUTH_COOKIE {
                return Some(parsed.value().to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::generate_token;
    use axum::body::Body;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::Secret;

    fn test_auth() -> AuthSettings {
        AuthSettings {
            jwt_secret: Secret::new("test-secret-that-is-long-enough-for-hmac".to_string()),
            token_expiry_minutes: 60,
            admin_username: "admin".to_string(),
            admin_password: Secret::new("StrongPassword123".to_string()),
        }
    }

    fn request_with_cookie(value: &str) -> Request {
        Request::builder()
            .header(header::COOKIE, format!("{}={}", AUTH_COOKIE, value))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn token_round_trip_preserves_subject() {
        let auth = test_auth();
        let token = generate_token("admin", &auth).expect("token generation should succeed");

        let claims = decode_claims(&token, &auth).expect("token validation should succeed");
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > chrono::Utc::now().timestamp() as usize);
    }

    #[test]
    fn expired_token_fails_validation() {
        let auth = test_auth();

        // Expired well past jsonwebtoken's default 60s leeway.
        let claims = Claims {
            sub: "admin".to_string(),
            exp: (chrono::Utc::now().timestamp() - 300) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(auth.jwt_secret.expose_secret().as_bytes()),
        )
        .expect("encoding should succeed");

        let result = decode_claims(&token, &auth);
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn token_signed_with_different_secret_fails() {
        let auth = test_auth();
        let other = AuthSettings {
            jwt_secret: Secret::new("a-completely-different-signing-secret".to_string()),
            ..test_auth()
        };

        let token = generate_token("admin", &other).expect("token generation should succeed");
        assert!(decode_claims(&token, &auth).is_err());
    }

    #[test]
    fn tampered_token_fails_validation() {
        let auth = test_auth();
        let mut token = generate_token("admin", &auth).expect("token generation should succeed");
        token.push('x');

        assert!(decode_claims(&token, &auth).is_err());
    }

    #[test]
    fn auth_cookie_is_extracted_from_header() {
        let request = request_with_cookie("Bearer abc.def.ghi");
        assert_eq!(
            extract_auth_cookie(&request),
            Some("Bearer abc.def.ghi".to_string())
        );
    }

    #[test]
    fn unrelated_cookies_are_ignored() {
        let request = Request::builder()
            .header(header::COOKIE, "theme=dark; other=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_auth_cookie(&request), None);
    }

    #[test]
    fn missing_bearer_prefix_is_rejected() {
        let value = "abc.def.ghi";
        assert!(value.strip_prefix("Bearer ").is_none());
    }
}
