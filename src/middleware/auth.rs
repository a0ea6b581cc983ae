use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

pub const TOKEN_ISSUER: &str = "vacation-rentals";
pub const TOKEN_AUDIENCE: &str = "vacation-rentals";
const TOKEN_TTL_SECS: i64 = 86400; // 24 hours

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_object_id(&self) -> Result<ObjectId> {
        ObjectId::parse_str(&self.sub).map_err(|_| AppError::Unauthenticated)
    }
}

pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "default-dev-key-please-change-in-production-12345678".to_string())
}

pub fn issue_token(user_id: &str, name: &str, email: &str, secret: &str) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        aud: TOKEN_AUDIENCE.to_string(),
        exp: (Utc::now().timestamp() + TOKEN_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthenticated)
}

pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let token = headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = decode_token(token, &jwt_secret()).map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_token_decodes_to_same_identity() {
        let user_id = ObjectId::new().to_hex();
        let token = issue_token(&user_id, "Dana", "dana@example.com", SECRET).unwrap();

        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "dana@example.com");
        assert!(claims.user_object_id().is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token("abc", "Dana", "dana@example.com", "other-secret").unwrap();
        assert!(matches!(
            decode_token(&token, SECRET),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn token_with_wrong_audience_is_rejected() {
        let claims = Claims {
            sub: "abc".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: "someone-else".to_string(),
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();

        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "abc".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp: (Utc::now().timestamp() - 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();

        assert!(decode_token(&token, SECRET).is_err());
    }
}
