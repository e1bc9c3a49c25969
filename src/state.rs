use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn};

/// Values the services need that do not live in the database.
#[derive(Debug, Clone)]
pub struct Settings {
    pub default_delivery_fee: i64,
    pub jwt_secret: String,
}

impl From<&AppConfig> for Settings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_delivery_fee: config.default_delivery_fee,
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(orm: OrmConn, settings: Settings) -> Self {
        Self {
            orm,
            settings: Arc::new(settings),
        }
    }
}
