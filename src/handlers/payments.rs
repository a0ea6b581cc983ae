use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Collection;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dtos::payment_dtos::{PaymentCallbackRequest, PaymentRequest, PaymentResponse};
use crate::errors::{AppError, Result};
use crate::middleware::auth::Claims;
use crate::models::apartment::Apartment;
use crate::state::AppState;

/// Flat fee for publishing a listing, in ILS. Process-wide constant, not
/// provider-controlled.
const LISTING_FEE: f64 = 10.00;

/// The one update that moves a listing to published. Both flags in a single
/// `$set`, nothing else touched.
fn published_set() -> Document {
    doc! { "$set": { "is_paid": true, "is_active": true } }
}

/// Atomic promotion keyed by transaction id. Re-applying it to an already
/// published listing writes the same values, so duplicate callbacks and
/// repeated verifies converge with no error. Returns whether a listing
/// carried this transaction id.
async fn promote_to_published(
    collection: &Collection<Apartment>,
    transaction_id: &str,
) -> Result<bool> {
    let result = collection
        .update_one(
            doc! { "payment_transaction_id": transaction_id },
            published_set(),
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>> {
    let user_id = claims.user_object_id()?;
    let apartment_id = ObjectId::parse_str(&payload.apartment_id)?;

    let collection: Collection<Apartment> = state.db.collection("apartments");

    let apartment = collection
        .find_one(doc! { "_id": apartment_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    if apartment.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    if apartment.is_paid {
        return Err(AppError::validation("Apartment listing already paid"));
    }

    let response = state
        .payment_service
        .create_payment(
            &apartment_id.to_hex(),
            &user_id.to_hex(),
            LISTING_FEE,
            &format!("Vacation rental listing - {}", apartment.title),
        )
        .await;

    // Attach the transaction id so the callback/verify path can find the
    // listing. The listing now awaits payment.
    if response.success {
        if let Some(transaction_id) = &response.transaction_id {
            collection
                .update_one(
                    doc! { "_id": apartment_id },
                    doc! { "$set": { "payment_transaction_id": transaction_id } },
                )
                .await?;
        }
    }

    // Gateway failures come back as a structured result, not an error status.
    Ok(Json(response))
}

pub async fn payment_callback(
    State(state): State<AppState>,
    Json(payload): Json<PaymentCallbackRequest>,
) -> Result<StatusCode> {
    info!(
        "Payment callback received: {}, status: {}",
        payload.transaction_id, payload.status
    );

    let collection: Collection<Apartment> = state.db.collection("apartments");

    if payload.is_completed() {
        if !promote_to_published(&collection, &payload.transaction_id).await? {
            warn!(
                "Apartment not found for transaction: {}",
                payload.transaction_id
            );
            return Err(AppError::NotFound("Apartment"));
        }

        info!("Payment completed for transaction: {}", payload.transaction_id);
    } else {
        let apartment = collection
            .find_one(doc! { "payment_transaction_id": &payload.transaction_id })
            .await?;
        if apartment.is_none() {
            warn!(
                "Apartment not found for transaction: {}",
                payload.transaction_id
            );
            return Err(AppError::NotFound("Apartment"));
        }
    }

    Ok(StatusCode::OK)
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<String>,
) -> Result<(StatusCode, Json<Value>)> {
    let user_id = claims.user_object_id()?;

    let collection: Collection<Apartment> = state.db.collection("apartments");

    let apartment = collection
        .find_one(doc! { "payment_transaction_id": &transaction_id, "user_id": user_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    // Re-verifying a confirmed payment is a no-op success.
    if apartment.is_paid {
        return Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Payment verified" })),
        ));
    }

    if state.payment_service.verify_payment(&transaction_id).await {
        promote_to_published(&collection, &transaction_id).await?;

        return Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Payment verified" })),
        ));
    }

    Ok((
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": "Payment not verified" })),
    ))
}

pub async fn simulate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(apartment_id): Path<String>,
) -> Result<Json<Value>> {
    // Development bypass; hidden entirely unless explicitly enabled.
    if !state.config.allow_payment_simulation {
        return Err(AppError::NotFound("Endpoint"));
    }

    let user_id = claims.user_object_id()?;
    let object_id = ObjectId::parse_str(&apartment_id)?;

    let collection: Collection<Apartment> = state.db.collection("apartments");

    let apartment = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    if apartment.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    let transaction_id = format!("SIM-{}", Uuid::new_v4());
    collection
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": {
                "is_paid": true,
                "is_active": true,
                "payment_transaction_id": &transaction_id,
            } },
        )
        .await?;

    info!("Simulated payment for apartment {}", apartment_id);

    Ok(Json(json!({ "success": true, "message": "Payment simulated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_sets_exactly_the_published_flags() {
        let update = published_set();
        assert_eq!(update.len(), 1);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get_bool("is_paid").unwrap());
        assert!(set.get_bool("is_active").unwrap());
    }
}

