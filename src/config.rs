use std::env;

use anyhow::Context;

use crate::money;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// Cents, used while the `default_delivery_fee` platform key is unset.
    pub default_delivery_fee: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        let default_delivery_fee = match env::var("DEFAULT_DELIVERY_FEE") {
            Ok(raw) => money::parse(&raw)
                .filter(|fee| *fee >= 0)
                .with_context(|| format!("DEFAULT_DELIVERY_FEE is not a valid amount: {raw}"))?,
            Err(_) => 0,
        };
        Ok(Self {
            port,
            database_url,
            host,
            db_max_connections,
            jwt_secret,
            default_delivery_fee,
        })
    }
}
