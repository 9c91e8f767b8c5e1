mod authentication;
mod config;
mod db;
mod email;
mod errors;
mod routes;
mod utils;
mod youtube;

use std::error::Error;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use sqlx::PgPool;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::authentication::{admin_auth, change_password, ensure_default_admin};
use crate::config::{AuthSettings, Settings};
use crate::db::init_db;
use crate::email::EmailClient;
use crate::routes::{
    about, admin_dashboard, all_contact_messages, all_videos, change_password_form, contact_page,
    contact_messages_page, create_video, delete_contact_message, delete_video, donate,
    health_check, home, login_form, login_user, logout_user, published_videos,
    reply_contact_message, submit_contact, update_video, watch_latest, watch_video,
};

#[derive(Clone)]
pub struct InnerState {
    pub db: PgPool,
    pub email_client: Option<EmailClient>,
    pub auth: AuthSettings,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_ministry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let db = init_db(&settings.database_url).await?;
    ensure_default_admin(&db, &settings.auth).await?;

    let email_client = match &settings.smtp {
        Some(smtp) => Some(EmailClient::new(smtp)?),
        None => {
            tracing::warn!("SMTP_HOST not set; outbound email is disabled");
            None
        }
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app_state = InnerState {
        db,
        email_client,
        auth: settings.auth.clone(),
    };

    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/logout", get(logout_user))
        .route("/admin/video", post(create_video))
        .route("/admin/videos/all", get(all_videos))
        .route("/admin/video/:id", put(update_video).delete(delete_video))
        .route(
            "/admin/change-password",
            get(change_password_form).post(change_password),
        )
        .route("/admin/contact-messages", get(contact_messages_page))
        .route("/admin/contact-messages-data", get(all_contact_messages))
        .route("/admin/contact-messages/:id", delete(delete_contact_message))
        .route("/admin/contact-messages/reply", post(reply_contact_message))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth));

    let app = Router::new()
        .route("/", get(home))
        .route("/watch", get(watch_latest))
        .route("/watch/:id", get(watch_video))
        .route("/about", get(about))
        .route("/donate", get(donate))
        .route("/contact", get(contact_page).post(submit_contact))
        .route("/videos", get(published_videos))
        .route("/admin/login", get(login_form).post(login_user))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .route("/health", get(health_check))
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(CookieManagerLayer::new())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .expect("Could not initialize TcpListener");

    tracing::debug!(
        "listening on {}",
        listener
            .local_addr()
            .expect("Could not convert listener address to local address")
    );

    axum::serve(listener, app)
        .await
        .expect("Could not successfully serve");

    Ok(())
}
