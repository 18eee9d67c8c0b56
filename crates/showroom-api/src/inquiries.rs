//! Contact-form submissions, stored for the back-office to work through.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use showroom_types::Record;
use showroom_types::api::{InquiryRequest, InquiryUpdate};
use showroom_types::models::Inquiry;
use showroom_types::validate::require;

use crate::common::{envelope, message, text};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

/// POST /api/contact (public)
pub async fn submit_inquiry(
    State(state): State<AppState>,
    Json(req): Json<InquiryRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[("title", req.title.as_deref()), ("message", req.message.as_deref())])?;

    let inquiry = Inquiry {
        title: text(req.title),
        message: text(req.message),
        contact_details: text(req.contact_details),
        handled: false,
    };
    let inquiry = with_db(&state, move |db| Ok(db.insert(&inquiry)?)).await?;

    info!("Inquiry '{}' received", inquiry.doc.title);
    Ok((StatusCode::CREATED, envelope("Message sent", "inquiry", &inquiry)?))
}

/// GET /api/inquiries, newest first.
pub async fn list_inquiries(State(state): State<AppState>) -> ApiResult<Json<Vec<Record<Inquiry>>>> {
    let mut inquiries = with_db(&state, |db| Ok(db.find_all::<Inquiry>()?)).await?;
    inquiries.reverse();
    Ok(Json(inquiries))
}

pub async fn update_inquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InquiryUpdate>,
) -> ApiResult<impl IntoResponse> {
    let inquiry = with_db(&state, move |db| {
        db.modify::<Inquiry, _>(&id, |inquiry| {
            inquiry.handled = req.handled;
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("Inquiry"))
    })
    .await?;
    envelope("Inquiry updated", "inquiry", &inquiry)
}

pub async fn delete_inquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    with_db(&state, move |db| {
        db.delete::<Inquiry>(&id)?.ok_or_else(|| ApiError::not_found("Inquiry"))
    })
    .await?;
    Ok(message("Inquiry deleted"))
}
