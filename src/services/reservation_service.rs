use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::{
    db::{
        self,
        entities::reservation,
        reservation_repo::{self, ReservationDraft},
    },
    error::AppError,
    payments::{
        BackUrls, CURRENCY, CreatedPreference, PaymentGateway, PreferenceItem, PreferenceRequest,
        STATUS_APPROVED,
    },
};

const WEBHOOK_EVENT_PAYMENT: &str = "payment";

/// Incoming booking payload. Every field is optional at the wire level so
/// that presence can be checked explicitly: zero is a valid deposit and a
/// valid party size, absence is not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReservation {
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_phone: Option<String>,
    pub reserved_on: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub deposit_amount: Option<f64>,
    pub party_size: Option<i32>,
}

impl NewReservation {
    fn validate(self) -> Result<ReservationDraft, AppError> {
        let missing = || AppError::bad_request("Missing required fields");
        Ok(ReservationDraft {
            client_first_name: self.client_first_name.ok_or_else(missing)?,
            client_last_name: self.client_last_name.ok_or_else(missing)?,
            client_phone: self.client_phone.ok_or_else(missing)?,
            reserved_on: self.reserved_on.ok_or_else(missing)?,
            event_type: self.event_type.ok_or_else(missing)?,
            deposit_amount: self.deposit_amount.ok_or_else(missing)?,
            party_size: self.party_size.ok_or_else(missing)?,
        })
    }
}

/// Webhook result. Business non-events acknowledge without writing; only
/// infrastructure failures become errors, so provider retries stay
/// idempotent.
#[derive(Debug)]
pub enum WebhookOutcome {
    Confirmed(reservation::Model),
    Ignored(&'static str),
}

pub struct ReservationService<'a> {
    db: &'a DatabaseConnection,
    payments: &'a dyn PaymentGateway,
    frontend_url: &'a str,
    backend_url: &'a str,
}

impl<'a> ReservationService<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        payments: &'a dyn PaymentGateway,
        frontend_url: &'a str,
        backend_url: &'a str,
    ) -> Self {
        Self {
            db,
            payments,
            frontend_url,
            backend_url,
        }
    }

    /// Dates that already carry a confirmed reservation. Callers derive
    /// availability by exclusion.
    pub async fn reserved_dates(&self) -> Result<Vec<NaiveDate>, AppError> {
        Ok(reservation_repo::list_dates(self.db).await?)
    }

    pub async fn list(&self) -> Result<Vec<reservation::Model>, AppError> {
        Ok(reservation_repo::list_all(self.db).await?)
    }

    /// Creates a payment intent for an unbooked date. No row is written
    /// here; the date stays unbooked until the webhook confirms payment.
    pub async fn initiate(&self, payload: NewReservation) -> Result<CreatedPreference, AppError> {
        let draft = payload.validate()?;

        // Advisory only: the insert at confirm time is where conflicts are
        // decided for real.
        if reservation_repo::find_by_date(self.db, draft.reserved_on)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Date already reserved"));
        }

        let metadata = serde_json::to_value(&draft)
            .map_err(|_| AppError::internal("Failed to encode reservation metadata"))?;

        let request = PreferenceRequest {
            items: vec![PreferenceItem {
                title: format!("Reservation deposit: {}", draft.event_type),
                quantity: 1,
                currency_id: CURRENCY.to_string(),
                unit_price: draft.deposit_amount,
            }],
            back_urls: BackUrls {
                success: format!("{}/reserva-exitosa", self.frontend_url),
                failure: format!("{}/reserva-fallida", self.frontend_url),
                pending: format!("{}/reserva-pendiente", self.frontend_url),
            },
            auto_return: STATUS_APPROVED.to_string(),
            notification_url: format!("{}/webhook/mp", self.backend_url),
            metadata,
        };

        Ok(self.payments.create_preference(&request).await?)
    }

    /// Provider notification entry point. Idempotent under retries: every
    /// already-handled or irrelevant notification is acknowledged as
    /// `Ignored`, never surfaced as an error.
    pub async fn confirm(
        &self,
        event_type: Option<&str>,
        payment_id: Option<&str>,
    ) -> Result<WebhookOutcome, AppError> {
        if event_type != Some(WEBHOOK_EVENT_PAYMENT) {
            return Ok(WebhookOutcome::Ignored("Event ignored"));
        }

        let Some(payment_id) = payment_id else {
            tracing::warn!("payment webhook without a payment id");
            return Ok(WebhookOutcome::Ignored("Missing payment id"));
        };

        let payment = self.payments.get_payment(payment_id).await?;
        if payment.status != STATUS_APPROVED {
            return Ok(WebhookOutcome::Ignored("Payment not approved"));
        }

        let draft: ReservationDraft =
            serde_json::from_value(payment.metadata).map_err(|err| {
                tracing::error!("undecodable metadata on approved payment {payment_id}: {err}");
                AppError::internal("Invalid payment metadata")
            })?;

        if reservation_repo::find_by_date(self.db, draft.reserved_on)
            .await?
            .is_some()
        {
            return Ok(WebhookOutcome::Ignored("Date already reserved"));
        }

        match reservation_repo::insert_confirmed(self.db, &draft).await {
            Ok(saved) => Ok(WebhookOutcome::Confirmed(saved)),
            // Concurrent confirmation for the same date won the insert;
            // acknowledge so the provider stops retrying.
            Err(err) if db::is_unique_violation(&err) => {
                Ok(WebhookOutcome::Ignored("Date already reserved"))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::db::reservation_repo::tests::{draft, model};
    use crate::payments::{Payment, PaymentError};

    /// Gateway stub: serves a canned payment, records every preference
    /// request it is asked to create.
    struct StubGateway {
        payment: Option<Payment>,
        requests: Mutex<Vec<PreferenceRequest>>,
    }

    impl StubGateway {
        fn with_payment(status: &str, metadata: serde_json::Value) -> Self {
            Self {
                payment: Some(Payment {
                    status: status.to_string(),
                    metadata,
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn unused() -> Self {
            Self {
                payment: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_preference(
            &self,
            request: &PreferenceRequest,
        ) -> Result<CreatedPreference, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(CreatedPreference {
                id: "pref-1".to_string(),
                init_point: "https://mp.example/checkout/pref-1".to_string(),
            })
        }

        async fn get_payment(&self, _payment_id: &str) -> Result<Payment, PaymentError> {
            match &self.payment {
                Some(payment) => Ok(payment.clone()),
                None => panic!("gateway should not be contacted"),
            }
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("date should parse")
    }

    fn payload(d: NaiveDate) -> NewReservation {
        let draft = draft(d);
        NewReservation {
            client_first_name: Some(draft.client_first_name),
            client_last_name: Some(draft.client_last_name),
            client_phone: Some(draft.client_phone),
            reserved_on: Some(draft.reserved_on),
            event_type: Some(draft.event_type),
            deposit_amount: Some(draft.deposit_amount),
            party_size: Some(draft.party_size),
        }
    }

    fn free_date_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .into_connection()
    }

    #[tokio::test]
    async fn initiate_rejects_a_missing_field_but_accepts_zero() {
        let db = free_date_db();
        let gateway = StubGateway::unused();
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let mut missing_phone = payload(date("2025-08-15"));
        missing_phone.client_phone = None;
        let err = service
            .initiate(missing_phone)
            .await
            .expect_err("missing field should be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut zero_values = payload(date("2025-08-15"));
        zero_values.deposit_amount = Some(0.0);
        zero_values.party_size = Some(0);
        let created = service
            .initiate(zero_values)
            .await
            .expect("zero deposit and party size are valid");
        assert_eq!(created.id, "pref-1");
    }

    #[tokio::test]
    async fn initiate_conflicts_on_a_booked_date() {
        let d = date("2025-08-15");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(d)]])
            .into_connection();
        let gateway = StubGateway::unused();
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let err = service
            .initiate(payload(d))
            .await
            .expect_err("booked date should conflict");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn initiate_builds_the_preference_from_the_payload() {
        let d = date("2025-08-15");
        let db = free_date_db();
        let gateway = StubGateway::unused();
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let created = service
            .initiate(payload(d))
            .await
            .expect("initiate should succeed");
        assert_eq!(created.init_point, "https://mp.example/checkout/pref-1");

        let requests = gateway.requests.lock().unwrap();
        let request = requests.first().expect("one preference request");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].unit_price, 500.0);
        assert_eq!(request.items[0].currency_id, CURRENCY);
        assert_eq!(request.back_urls.success, "https://front/reserva-exitosa");
        assert_eq!(request.notification_url, "https://back/api/webhook/mp");
        assert_eq!(
            request.metadata.get("reserved_on").and_then(|v| v.as_str()),
            Some("2025-08-15")
        );
    }

    #[tokio::test]
    async fn non_payment_events_never_reach_the_gateway() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let gateway = StubGateway::unused();
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let outcome = service
            .confirm(Some("merchant_order"), Some("123"))
            .await
            .expect("non-payment events are acknowledged");
        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
    }

    #[tokio::test]
    async fn unapproved_payments_write_nothing() {
        let d = date("2025-08-15");
        let metadata = serde_json::to_value(draft(d)).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let gateway = StubGateway::with_payment("rejected", metadata);
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let outcome = service
            .confirm(Some("payment"), Some("123"))
            .await
            .expect("unapproved payments are acknowledged");
        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
    }

    #[tokio::test]
    async fn approved_payment_confirms_once_and_ignores_the_retry() {
        let d = date("2025-08-15");
        let metadata = serde_json::to_value(draft(d)).unwrap();
        // First confirm: date free, insert succeeds. Retry: date now booked.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![model(d)]])
            .append_query_results([vec![model(d)]])
            .into_connection();
        let gateway = StubGateway::with_payment(STATUS_APPROVED, metadata);
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let outcome = service
            .confirm(Some("payment"), Some("123"))
            .await
            .expect("first confirm should succeed");
        match outcome {
            WebhookOutcome::Confirmed(saved) => {
                assert!(saved.deposit_paid);
                assert_eq!(saved.reserved_on, d);
            }
            WebhookOutcome::Ignored(reason) => panic!("expected confirmation, got {reason}"),
        }

        let retry = service
            .confirm(Some("payment"), Some("123"))
            .await
            .expect("retry must not error");
        assert!(matches!(retry, WebhookOutcome::Ignored(_)));
    }

    #[tokio::test]
    async fn confirm_acknowledges_a_lost_insert_race() {
        let d = date("2025-08-15");
        let metadata = serde_json::to_value(draft(d)).unwrap();
        // The pre-check still sees the date free, but a concurrent confirm
        // wins the insert and the store rejects this one.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_errors([db::tests::unique_violation()])
            .into_connection();
        let gateway = StubGateway::with_payment(STATUS_APPROVED, metadata);
        let service = ReservationService::new(&db, &gateway, "https://front", "https://back/api");

        let outcome = service
            .confirm(Some("payment"), Some("123"))
            .await
            .expect("losing the race must not error");
        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
    }
}
