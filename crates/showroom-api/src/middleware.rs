use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use showroom_types::models::{User, UserProfile};

use crate::auth::decode_token;
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

/// Validate the bearer token and load its user.
///
/// The user must still exist; on success a `Record<UserProfile>` is placed in
/// the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let claims = decode_token(&state.jwt_secret, bearer.token())
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    let user = with_db(&state, move |db| Ok(db.get::<User>(&claims.sub)?))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    req.extensions_mut().insert(user.map(UserProfile::from));
    Ok(next.run(req).await)
}
