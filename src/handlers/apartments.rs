use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use validator::Validate;

use crate::dtos::apartment_dtos::{
    ApartmentResponse, ApartmentSearchQuery, CreateApartmentRequest, PagedResult,
    UpdateApartmentRequest,
};
use crate::errors::{AppError, Result};
use crate::middleware::auth::Claims;
use crate::models::apartment::Apartment;
use crate::models::user::User;
use crate::state::AppState;

/// Resolves owner display names for a page of listings with one `$in` query
/// against the users collection.
async fn owner_names(db: &Database, apartments: &[Apartment]) -> Result<HashMap<ObjectId, String>> {
    let owner_ids: Vec<ObjectId> = apartments
        .iter()
        .map(|a| a.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users: Collection<User> = db.collection("users");
    let cursor = users.find(doc! { "_id": { "$in": owner_ids } }).await?;
    let owners: Vec<User> = cursor.try_collect().await?;

    Ok(owners
        .into_iter()
        .filter_map(|u| u._id.map(|id| (id, u.name)))
        .collect())
}

async fn owner_name(db: &Database, user_id: ObjectId) -> Result<String> {
    let users: Collection<User> = db.collection("users");
    let user = users.find_one(doc! { "_id": user_id }).await?;
    Ok(user.map(|u| u.name).unwrap_or_default())
}

fn to_responses(
    apartments: Vec<Apartment>,
    names: HashMap<ObjectId, String>,
) -> Vec<ApartmentResponse> {
    apartments
        .into_iter()
        .map(|a| {
            let name = names.get(&a.user_id).cloned().unwrap_or_default();
            ApartmentResponse::from_apartment(a, name)
        })
        .collect()
}

pub async fn search_apartments(
    State(state): State<AppState>,
    Query(search): Query<ApartmentSearchQuery>,
) -> Result<Json<PagedResult<ApartmentResponse>>> {
    search.ensure_valid_paging()?;

    let collection: Collection<Apartment> = state.db.collection("apartments");
    let filter = search.to_filter();

    let total_count = collection.count_documents(filter.clone()).await?;

    let cursor = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(search.skip())
        .limit(search.page_size as i64)
        .await?;
    let apartments: Vec<Apartment> = cursor.try_collect().await?;

    let names = owner_names(&state.db, &apartments).await?;
    let items = to_responses(apartments, names);

    Ok(Json(PagedResult::new(
        items,
        total_count,
        search.page,
        search.page_size,
    )))
}

pub async fn get_apartment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApartmentResponse>> {
    let collection: Collection<Apartment> = state.db.collection("apartments");
    let object_id = ObjectId::parse_str(&id)?;

    let apartment = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    let name = owner_name(&state.db, apartment.user_id).await?;
    Ok(Json(ApartmentResponse::from_apartment(apartment, name)))
}

pub async fn get_cities(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let collection: Collection<Apartment> = state.db.collection("apartments");

    let values = collection
        .distinct("city", doc! { "is_active": true, "is_paid": true })
        .await?;

    let mut cities: Vec<String> = values
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    cities.sort();

    Ok(Json(cities))
}

pub async fn get_my_apartments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ApartmentResponse>>> {
    let user_id = claims.user_object_id()?;
    let collection: Collection<Apartment> = state.db.collection("apartments");

    let cursor = collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?;
    let apartments: Vec<Apartment> = cursor.try_collect().await?;

    let names = owner_names(&state.db, &apartments).await?;
    Ok(Json(to_responses(apartments, names)))
}

pub async fn create_apartment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateApartmentRequest>,
) -> Result<(StatusCode, Json<ApartmentResponse>)> {
    payload.validate()?;
    let user_id = claims.user_object_id()?;

    let now = Utc::now();
    // New listings always start as unpaid drafts.
    let apartment = Apartment {
        _id: Some(ObjectId::new()),
        title: payload.title,
        description: payload.description,
        address: payload.address,
        city: payload.city,
        price_per_night: payload.price_per_night,
        number_of_beds: payload.number_of_beds,
        number_of_rooms: payload.number_of_rooms,
        image_url: payload.image_url,
        contact_phone: payload.contact_phone,
        is_active: false,
        is_paid: false,
        payment_transaction_id: None,
        created_at: now,
        updated_at: now,
        user_id,
    };

    let collection: Collection<Apartment> = state.db.collection("apartments");
    collection.insert_one(&apartment).await?;

    let name = owner_name(&state.db, user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApartmentResponse::from_apartment(apartment, name)),
    ))
}

pub async fn update_apartment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateApartmentRequest>,
) -> Result<Json<ApartmentResponse>> {
    payload.validate()?;
    let user_id = claims.user_object_id()?;
    let object_id = ObjectId::parse_str(&id)?;

    let collection: Collection<Apartment> = state.db.collection("apartments");

    let apartment = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    if apartment.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    let updated = collection
        .find_one_and_update(
            doc! { "_id": object_id },
            doc! { "$set": payload.to_set_doc(Utc::now()) },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    let name = owner_name(&state.db, updated.user_id).await?;
    Ok(Json(ApartmentResponse::from_apartment(updated, name)))
}

pub async fn delete_apartment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user_id = claims.user_object_id()?;
    let object_id = ObjectId::parse_str(&id)?;

    let collection: Collection<Apartment> = state.db.collection("apartments");

    let apartment = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::NotFound("Apartment"))?;

    if apartment.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    collection.delete_one(doc! { "_id": object_id }).await?;

    Ok(StatusCode::NO_CONTENT)
}
