use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::{info, warn};

use showroom_types::Record;
use showroom_types::api::{Claims, LoginRequest, LoginResponse};
use showroom_types::models::{User, UserProfile};
use showroom_types::validate::present;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

/// Tokens are valid for one day.
const TOKEN_TTL_HOURS: i64 = 24;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (
        present(req.email.as_deref()).map(str::to_string),
        present(req.password.as_deref()).map(str::to_string),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user = with_db(&state, move |db| {
        let user = db
            .find_one_by::<User>("mail", &email)?
            .ok_or_else(|| ApiError::not_found("User"))?;

        if !verify_password(&password, &user.doc.password) {
            warn!("Failed login for {}", user.doc.mail);
            return Err(ApiError::Unauthorized("Invalid password".to_string()));
        }
        Ok(user)
    })
    .await?;

    let token = create_token(&state.jwt_secret, &user.id)?;
    info!("User {} logged in", user.doc.mail);

    Ok(Json(LoginResponse {
        token,
        message: "Login successful".to_string(),
    }))
}

/// GET /api/auth/me — the authenticated user, without the password hash.
pub async fn me(Extension(user): Extension<Record<UserProfile>>) -> Json<Record<UserProfile>> {
    Json(user)
}

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_token(secret: &str, user_id: &str) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
}

/// Signature and expiry check. `None` for anything that does not verify.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}
