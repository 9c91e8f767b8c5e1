use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};
use tower_cookies::Cookies;

use crate::errors::AppError;

/// Name of the auth cookie; its value is `Bearer <jwt>`.
pub const AUTH_COOKIE: &str = "access_token";

pub fn setup_auth_cookie(token: &str, expiry_minutes: i64, cookies: &Cookies) {
    let mut cookie = Cookie::new(AUTH_COOKIE, format!("Bearer {}", token));

    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_expires(OffsetDateTime::now_utc() + Duration::minutes(expiry_minutes));

    cookies.add(cookie);
}

pub fn clear_auth_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();

    cookies.remove(cookie);
}

/// 302 redirect; axum's `Redirect` only offers 303/307/308.
pub fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub async fn timeout_query<T, F>(duration: std::time::Duration, fut: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(_) => Err(AppError::Database(anyhow::anyhow!(
            "Query timeout after {:?}",
            duration
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_found_sets_302_and_location() {
        let response = redirect_found("/watch/7");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/watch/7"
        );
    }

    #[tokio::test]
    async fn timeout_query_reports_elapsed_as_database_error() {
        let slow = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok::<_, sqlx::Error>(1)
        };
        let result = timeout_query(std::time::Duration::from_millis(5), slow).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
