use anyhow::{Context, Result};
use std::{env, str::FromStr};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub mailing: MailingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: env::var("DATABASE_HOST").context("DATABASE_HOST is not set")?,
            port: env::var("DATABASE_PORT")
                .context("DATABASE_PORT is not set")?
                .parse()
                .context("DATABASE_PORT must be a port number")?,
            username: env::var("DATABASE_USERNAME").context("DATABASE_USERNAME is not set")?,
            password: env::var("DATABASE_PASSWORD").context("DATABASE_PASSWORD is not set")?,
            database: env::var("DATABASE_NAME").context("DATABASE_NAME is not set")?,
        };
        let auth = AuthConfig {
            ttl: parse_or("AUTH_TOKEN_TTL", 8 * 60 * 60)?,
        };
        let server = ServerConfig {
            port: parse_or("PORT", 8080)?,
        };
        let mailing = MailingConfig {
            api_key: env::var("MAILING_API_KEY").ok().filter(|k| !k.is_empty()),
            from_email: env::var("MAILING_FROM_EMAIL")
                .unwrap_or_else(|_| "enquiries+bot@coderdojo.org".into()),
            from_name: env::var("MAILING_FROM_NAME")
                .unwrap_or_else(|_| "Coolest Projects".into()),
            welcome_template_id: env::var("MAILING_WELCOME_TEMPLATE_ID")
                .unwrap_or_else(|_| "6d20e65f-ae16-4b25-a17f-66d0398f474f".into()),
            manage_link: env::var("HOSTNAME").unwrap_or_default(),
        };
        Ok(Self {
            database,
            auth,
            server,
            mailing,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct AuthConfig {
    /// Lifetime of an access token, in seconds.
    pub ttl: u64,
}

pub struct ServerConfig {
    pub port: u16,
}

#[derive(Clone)]
pub struct MailingConfig {
    /// Mailing is disabled when no key is configured.
    pub api_key: Option<String>,
    pub from_email: String,
    pub from_name: String,
    pub welcome_template_id: String,
    pub manage_link: String,
}
