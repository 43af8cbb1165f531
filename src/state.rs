use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey};
use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, payments::PaymentGateway};

pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
    pub payments: Arc<dyn PaymentGateway>,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        payments: Arc<dyn PaymentGateway>,
    ) -> Arc<Self> {
        let jwt = JwtKeys::from_secret(config.jwt_secret.as_bytes());
        Arc::new(Self {
            config,
            db,
            jwt,
            payments,
        })
    }
}
