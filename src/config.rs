use anyhow::Context;
use secrecy::Secret;

/// Default access token lifetime in minutes.
const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 60;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Runtime configuration, loaded once at startup.
///
/// | Variable               | Required | Default                 |
/// |------------------------|----------|-------------------------|
/// | `DATABASE_URL`         | yes      | --                      |
/// | `JWT_SECRET`           | yes      | --                      |
/// | `TOKEN_EXPIRY_MINUTES` | no       | `60`                    |
/// | `ADMIN_USERNAME`       | no       | `admin`                 |
/// | `ADMIN_PASSWORD`       | yes      | --                      |
/// | `LISTEN_ADDR`          | no       | `0.0.0.0:3001`          |
/// | `SMTP_HOST`            | no       | unset => email disabled |
/// | `SMTP_PORT`            | no       | `587`                   |
/// | `SMTP_USERNAME`        | no       | --                      |
/// | `SMTP_PASSWORD`        | no       | --                      |
/// | `SMTP_FROM`            | no       | `SMTP_USERNAME`, else `noreply@localhost` |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub listen_addr: String,
    pub auth: AuthSettings,
    pub smtp: Option<SmtpSettings>,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub jwt_secret: Secret<String>,
    pub token_expiry_minutes: i64,
    /// Username of the bootstrap admin account.
    pub admin_username: String,
    /// Password the bootstrap admin is created with.
    pub admin_password: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub from_address: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());

        Ok(Self {
            database_url,
            listen_addr,
            auth: AuthSettings::from_env()?,
            smtp: SmtpSettings::from_env(),
        })
    }
}

impl AuthSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!jwt_secret.is_empty(), "JWT_SECRET must not be empty");

        let token_expiry_minutes = match std::env::var("TOKEN_EXPIRY_MINUTES") {
            Ok(raw) => raw
                .parse()
                .context("TOKEN_EXPIRY_MINUTES must be a valid integer")?,
            Err(_) => DEFAULT_TOKEN_EXPIRY_MINUTES,
        };

        let admin_password =
            std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;

        Ok(Self {
            jwt_secret: Secret::new(jwt_secret),
            token_expiry_minutes,
            admin_username: std::env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            admin_password: Secret::new(admin_password),
        })
    }
}

impl SmtpSettings {
    /// Returns `None` when `SMTP_HOST` is absent, signalling that outbound
    /// email is not configured.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let username = std::env::var("SMTP_USERNAME").ok();

        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .ok()
                .or_else(|| username.clone())
                .unwrap_or_else(|| "noreply@localhost".to_string()),
            username,
            password: std::env::var("SMTP_PASSWORD").ok().map(Secret::new),
        })
    }
}
