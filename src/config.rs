// config.rs
use std::env;

use crate::errors::{AppError, Result};

/// Credentials and endpoints for the object-storage backend that keeps
/// payment screenshots and trip media. Missing variables disable the
/// service rather than the whole server; the caller decides.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub api_url: String,
    pub delivery_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub url_ttl_seconds: i64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(StorageConfig {
            api_url: require("STORAGE_API_URL")?,
            delivery_url: require("STORAGE_DELIVERY_URL")?,
            api_key: require("STORAGE_API_KEY")?,
            api_secret: require("STORAGE_API_SECRET")?,
            url_ttl_seconds: env::var("STORAGE_URL_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| AppError::configuration("STORAGE_URL_TTL_SECONDS must be a number"))?,
        })
    }
}

/// SMTP settings for the admin notification mails.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub admin_address: String,
}

impl MailConfig {
    pub fn from_env() -> Result<Self> {
        Ok(MailConfig {
            smtp_host: require("SMTP_HOST")?,
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| AppError::configuration("SMTP_PORT must be a number"))?,
            smtp_username: require("SMTP_USERNAME")?,
            smtp_password: require("SMTP_PASSWORD")?,
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Karwan Trips <no-reply@karwan.trips>".to_string()),
            admin_address: require("ADMIN_EMAIL")?,
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::configuration(format!("{} not set", name)))
}
