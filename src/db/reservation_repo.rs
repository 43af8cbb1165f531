use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::prelude::Reservation;
use super::entities::reservation;

pub const PAYMENT_METHOD: &str = "mercadopago";

/// Validated reservation payload, as carried through the payment
/// provider's preference metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReservationDraft {
    pub client_first_name: String,
    pub client_last_name: String,
    pub client_phone: String,
    pub reserved_on: NaiveDate,
    pub event_type: String,
    pub deposit_amount: f64,
    pub party_size: i32,
}

pub async fn find_by_date(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<Option<reservation::Model>, sea_orm::DbErr> {
    Reservation::find()
        .filter(reservation::Column::ReservedOn.eq(date))
        .one(db)
        .await
}

pub async fn list_all(
    db: &DatabaseConnection,
) -> Result<Vec<reservation::Model>, sea_orm::DbErr> {
    Reservation::find()
        .order_by_desc(reservation::Column::ReservedOn)
        .all(db)
        .await
}

pub async fn list_dates(db: &DatabaseConnection) -> Result<Vec<NaiveDate>, sea_orm::DbErr> {
    #[derive(Debug, FromQueryResult)]
    struct ReservedDate {
        reserved_on: NaiveDate,
    }

    let rows = Reservation::find()
        .select_only()
        .column(reservation::Column::ReservedOn)
        .order_by_asc(reservation::Column::ReservedOn)
        .into_model::<ReservedDate>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.reserved_on).collect())
}

/// Inserts a confirmed reservation. Only the webhook path writes rows, so
/// `deposit_paid` is forced true here. A unique violation on `reserved_on`
/// must be handled by the caller (see `db::is_unique_violation`).
pub async fn insert_confirmed(
    db: &DatabaseConnection,
    draft: &ReservationDraft,
) -> Result<reservation::Model, sea_orm::DbErr> {
    let model = reservation::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_first_name: Set(draft.client_first_name.clone()),
        client_last_name: Set(draft.client_last_name.clone()),
        client_phone: Set(draft.client_phone.clone()),
        reserved_on: Set(draft.reserved_on),
        event_type: Set(draft.event_type.clone()),
        deposit_amount: Set(draft.deposit_amount),
        payment_method: Set(PAYMENT_METHOD.to_string()),
        deposit_paid: Set(true),
        party_size: Set(draft.party_size),
        created_at: Set(Utc::now().fixed_offset()),
    };
    model.insert(db).await
}
