use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use showroom_db::Unique;
use showroom_types::Record;
use showroom_types::api::UserRequest;
use showroom_types::models::{User, UserProfile};
use showroom_types::validate::{present, require};

use crate::auth::hash_password;
use crate::common::{IdQuery, envelope, message};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

fn profile(user: Record<User>) -> Record<UserProfile> {
    user.map(UserProfile::from)
}

fn duplicate_mail() -> ApiError {
    ApiError::Conflict("User already exists".to_string())
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Record<UserProfile>>>> {
    let users = with_db(&state, |db| Ok(db.find_all::<User>()?)).await?;
    Ok(Json(users.into_iter().map(profile).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[
        ("name", req.name.as_deref()),
        ("mail", req.mail.as_deref()),
        ("password", req.password.as_deref()),
    ])?;

    let user = with_db(&state, move |db| {
        let mail = req.mail.as_deref().unwrap_or_default().trim().to_string();
        let password = req.password.as_deref().unwrap_or_default().trim();
        let user = User {
            name: req.name.unwrap_or_default().trim().to_string(),
            mail,
            password: hash_password(password)?,
        };
        match db.insert_unique("mail", &user.mail, &user)? {
            Unique::Written(user) => Ok(user),
            Unique::Taken => Err(duplicate_mail()),
        }
    })
    .await?;

    info!("User {} created", user.doc.mail);
    Ok((StatusCode::CREATED, envelope("User created", "user", &profile(user))?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<UserProfile>>> {
    let user = with_db(&state, move |db| {
        db.get::<User>(&id)?.ok_or_else(|| ApiError::not_found("User"))
    })
    .await?;
    Ok(Json(profile(user)))
}

/// PUT /api/users/{id}. The password is re-hashed only when a new one is sent.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UserRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[("name", req.name.as_deref()), ("mail", req.mail.as_deref())])?;

    let user = with_db(&state, move |db| {
        let mail = req.mail.as_deref().unwrap_or_default().trim().to_string();
        let new_hash = present(req.password.as_deref()).map(hash_password).transpose()?;
        let name = req.name.unwrap_or_default().trim().to_string();

        let written = db.modify_unique::<User, _>(&id, "mail", |user| {
            user.name = name;
            user.mail = mail;
            if let Some(hash) = new_hash {
                user.password = hash;
            }
            Ok(())
        })?;
        match written {
            Some(Unique::Written(user)) => Ok(user),
            Some(Unique::Taken) => Err(duplicate_mail()),
            None => Err(ApiError::not_found("User")),
        }
    })
    .await?;

    Ok(envelope("User updated successfully", "user", &profile(user))?)
}

pub async fn delete_user(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = query.require("User")?;
    let user = with_db(&state, move |db| {
        db.delete::<User>(&id)?.ok_or_else(|| ApiError::not_found("User"))
    })
    .await?;

    info!("User {} deleted", user.doc.mail);
    Ok(message("User deleted"))
}
