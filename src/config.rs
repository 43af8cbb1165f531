use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub mp_access_token: String,
    pub mp_base_url: String,
    pub frontend_url: String,
    pub backend_url: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env if present
        let _ = dotenvy::dotenv();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid u16")?;
        let log_level =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".to_string());

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let mp_access_token =
            std::env::var("MP_ACCESS_TOKEN").context("MP_ACCESS_TOKEN is required")?;
        let mp_base_url = std::env::var("MP_BASE_URL")
            .unwrap_or_else(|_| "https://api.mercadopago.com".to_string());
        let frontend_url = std::env::var("FRONTEND_URL").context("FRONTEND_URL is required")?;
        let backend_url = std::env::var("BACKEND_URL").context("BACKEND_URL is required")?;

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(_) if cfg!(debug_assertions) => "super-secret-change-me".to_string(),
            Err(err) => {
                Err(anyhow::anyhow!(err)).context("JWT_SECRET is required in release builds")?
            }
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            mp_access_token,
            mp_base_url,
            frontend_url,
            backend_url,
            log_level,
        })
    }
}
