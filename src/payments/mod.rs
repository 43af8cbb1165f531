pub mod mercadopago;

pub use mercadopago::MercadoPago;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const CURRENCY: &str = "UYU";
pub const STATUS_APPROVED: &str = "approved";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub currency_id: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Payment intent request. `metadata` is opaque to the provider and comes
/// back verbatim on the payment when the webhook resolves it.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub back_urls: BackUrls,
    pub auto_return: String,
    pub notification_url: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPreference {
    pub id: String,
    pub init_point: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub status: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<CreatedPreference, PaymentError>;

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, PaymentError>;
}
