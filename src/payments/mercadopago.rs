use async_trait::async_trait;
use reqwest::header;

use super::{CreatedPreference, Payment, PaymentError, PaymentGateway, PreferenceRequest};

/// Mercado Pago REST client: preference creation at checkout time, payment
/// lookup from the webhook.
#[derive(Clone)]
pub struct MercadoPago {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MercadoPago {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(PaymentError::Api { status, body })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPago {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<CreatedPreference, PaymentError> {
        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .header(header::AUTHORIZATION, self.bearer())
            .json(request)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, PaymentError> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.base_url))
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}
