use axum::{extract::State, response::Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use validator::Validate;

use crate::dtos::auth_dtos::{AuthResponse, GoogleLoginRequest, LoginRequest, RegisterRequest};
use crate::errors::{is_duplicate_key, AppError, Result};
use crate::middleware::auth::{issue_token, jwt_secret};
use crate::models::user::{User, UserResponse};
use crate::state::AppState;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn token_for(user: &User) -> Result<String> {
    let id = user
        ._id
        .ok_or_else(|| AppError::Internal("User without id".to_string()))?;
    issue_token(&id.to_hex(), &user.name, &user.email, &jwt_secret())
}

fn auth_response(user: User) -> Result<Json<AuthResponse>> {
    let token = token_for(&user)?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection("users");
    let email = normalize_email(&payload.email);

    let existing = collection.find_one(doc! { "email": &email }).await?;
    if existing.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = User {
        _id: Some(ObjectId::new()),
        name: payload.name.clone(),
        email,
        password_hash: Some(password_hash),
        google_id: None,
        created_at: chrono::Utc::now(),
    };

    // The unique index on email is the real guard; the pre-check above only
    // gives a friendly fast path. A concurrent duplicate surfaces here.
    if let Err(e) = collection.insert_one(&user).await {
        if is_duplicate_key(&e) {
            return Err(AppError::conflict("Email already registered"));
        }
        return Err(e.into());
    }
    tracing::info!("Registered user {}", user.email);

    auth_response(user)
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let collection: Collection<User> = state.db.collection("users");

    let user = collection
        .find_one(doc! { "email": normalize_email(&payload.email) })
        .await?
        .ok_or(AppError::Unauthenticated)?;

    // Google-only accounts have no password credential.
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::Unauthenticated)?;

    let valid = verify(&payload.password, password_hash).map_err(|_| AppError::Unauthenticated)?;
    if !valid {
        return Err(AppError::Unauthenticated);
    }

    auth_response(user)
}

pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let google_user = state
        .google_auth
        .verify_id_token(&payload.id_token)
        .await
        .ok_or(AppError::Unauthenticated)?;

    let collection: Collection<User> = state.db.collection("users");

    if let Some(user) = collection
        .find_one(doc! { "google_id": &google_user.google_id })
        .await?
    {
        return auth_response(user);
    }

    let email = normalize_email(&google_user.email);

    // Link the Google identity to an existing email-matched account, or
    // create a fresh password-less one.
    let user = match collection.find_one(doc! { "email": &email }).await? {
        Some(mut user) => {
            collection
                .update_one(
                    doc! { "_id": user._id },
                    doc! { "$set": { "google_id": &google_user.google_id } },
                )
                .await?;
            user.google_id = Some(google_user.google_id);
            user
        }
        None => {
            let user = User {
                _id: Some(ObjectId::new()),
                name: google_user.name,
                email,
                password_hash: None,
                google_id: Some(google_user.google_id),
                created_at: chrono::Utc::now(),
            };
            if let Err(e) = collection.insert_one(&user).await {
                if is_duplicate_key(&e) {
                    return Err(AppError::conflict("Account already exists"));
                }
                return Err(e.into());
            }
            tracing::info!("Created account for Google user {}", user.email);
            user
        }
    };

    auth_response(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized_for_lookup() {
        assert_eq!(normalize_email("  Dana@Example.COM "), "dana@example.com");
    }
}
