use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use showroom_types::Record;
use showroom_types::api::FaqRequest;
use showroom_types::models::Faq;
use showroom_types::validate::require;

use crate::common::{IdQuery, envelope, message, text};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct FaqQuery {
    pub active: Option<bool>,
}

/// GET /api/faq. `?active=true` keeps only published entries.
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> ApiResult<Json<Vec<Record<Faq>>>> {
    let mut faqs = with_db(&state, |db| Ok(db.find_all::<Faq>()?)).await?;
    if query.active == Some(true) {
        faqs.retain(|f| f.doc.is_active);
    }
    Ok(Json(faqs))
}

pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<Faq>>> {
    let faq = with_db(&state, move |db| {
        db.get::<Faq>(&id)?.ok_or_else(|| ApiError::not_found("FAQ"))
    })
    .await?;
    Ok(Json(faq))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Json(req): Json<FaqRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[("question", req.question.as_deref()), ("answer", req.answer.as_deref())])?;

    let faq = Faq {
        question: text(req.question),
        answer: text(req.answer),
        is_active: req.is_active.unwrap_or(true),
    };
    let faq = with_db(&state, move |db| Ok(db.insert(&faq)?)).await?;
    Ok((StatusCode::CREATED, envelope("FAQ created", "faq", &faq)?))
}

/// PUT /api/faq/{id}. `isActive` keeps its stored value when omitted.
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FaqRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[("question", req.question.as_deref()), ("answer", req.answer.as_deref())])?;

    let question = text(req.question);
    let answer = text(req.answer);
    let is_active = req.is_active;

    let faq = with_db(&state, move |db| {
        db.modify::<Faq, _>(&id, |faq| {
            faq.question = question;
            faq.answer = answer;
            if let Some(active) = is_active {
                faq.is_active = active;
            }
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("FAQ"))
    })
    .await?;

    Ok(envelope("FAQ updated", "faq", &faq)?)
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_faq_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("FAQ")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<serde_json::Value>> {
    with_db(state, move |db| {
        db.delete::<Faq>(&id)?.ok_or_else(|| ApiError::not_found("FAQ"))
    })
    .await?;
    Ok(message("FAQ deleted"))
}
