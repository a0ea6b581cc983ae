use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A listing document. Created as an unpaid draft; `is_paid` is only ever set
/// through the payment flow and is never reset, `is_active` is owner-toggled
/// once paid. Publicly searchable only when both flags are true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apartment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub price_per_night: f64,
    pub number_of_beds: i32,
    pub number_of_rooms: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,

    pub is_active: bool,
    pub is_paid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_transaction_id: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,

    pub user_id: ObjectId,
}
